use std::sync::Arc;

use axum::extract::{Extension, Multipart, Path};
use axum::http::StatusCode;
use axum::Json;
use tracing::{info, warn};

use crate::domain::{GameAction, WeekConfig};
use crate::registry::types::{
    AdjustPointsRequest, AdjustPointsResponse, BulkRegisterReport, ChangePasswordsRequest,
    CoordinatorOverview, CreateTeamRequest, CreateTeamResponse, CsvUpload, DashboardCounts,
    DisqualifyRequest, ExportBundle, GameActionResponse, GameStatus, LeaderboardEntry,
    LoginRequest, LoginResponse, MasterDashboard, MessageResponse, PendingPower,
    PendingSubmission, RequalifyRequest, SubmissionRecord, TeamDetail, TeamSummary,
    WeekChangeRequest, WeekChangeResponse,
};

use super::auth::Session;
use super::dto::{GameActionPath, HealthResponse, TeamPath};
use super::error::ApiError;
use super::routes::ServerContext;

const LOG_TARGET: &str = "server::handlers";
const UPLOAD_FIELD: &str = "file";

type Ctx = Extension<Arc<ServerContext>>;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ---------- auth ----------

/// POST /api/auth/login
pub async fn login(
    Extension(ctx): Ctx,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = ctx.registry.login(&req.email, &req.password).await?;
    Ok(Json(response))
}

/// POST /api/auth/logout
pub async fn logout(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(ctx.registry.logout(&session.token).await?))
}

// ---------- admin ----------

/// POST /api/admin/create-team
pub async fn create_team(
    Extension(ctx): Ctx,
    session: Session,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<CreateTeamResponse>), ApiError> {
    let response = ctx.registry.create_team(&session.caller, req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/admin/bulk-register (multipart, field `file`)
pub async fn bulk_register(
    Extension(ctx): Ctx,
    session: Session,
    mut multipart: Multipart,
) -> Result<Json<BulkRegisterReport>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("invalid multipart body: {err}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(format!("failed to read upload: {err}")))?;
        upload = Some(CsvUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
        break;
    }

    if let Some(upload) = upload.as_ref() {
        info!(
            target: LOG_TARGET,
            file_name = ?upload.file_name,
            size = upload.bytes.len(),
            "roster upload received"
        );
    }
    let report = ctx.registry.bulk_register(&session.caller, upload).await?;
    Ok(Json(report))
}

/// GET /api/admin/teams
pub async fn list_teams(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<Vec<TeamSummary>>, ApiError> {
    Ok(Json(ctx.registry.list_teams(&session.caller).await?))
}

/// GET /api/admin/team/:team_id
pub async fn team_detail(
    Extension(ctx): Ctx,
    session: Session,
    Path(path): Path<TeamPath>,
) -> Result<Json<TeamDetail>, ApiError> {
    Ok(Json(
        ctx.registry
            .team_detail(&session.caller, path.team_id)
            .await?,
    ))
}

pub async fn disqualify_team(
    Extension(ctx): Ctx,
    session: Session,
    Json(req): Json<DisqualifyRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(ctx.registry.disqualify_team(&session.caller, req).await?))
}

pub async fn requalify_team(
    Extension(ctx): Ctx,
    session: Session,
    Json(req): Json<RequalifyRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(
        ctx.registry
            .requalify_team(&session.caller, req.team_id)
            .await?,
    ))
}

/// POST /api/admin/change-team-password
pub async fn change_team_password(
    Extension(ctx): Ctx,
    session: Session,
    Json(req): Json<ChangePasswordsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(
        ctx.registry
            .change_team_passwords(&session.caller, req.updates)
            .await?,
    ))
}

pub async fn adjust_points(
    Extension(ctx): Ctx,
    session: Session,
    Json(req): Json<AdjustPointsRequest>,
) -> Result<Json<AdjustPointsResponse>, ApiError> {
    Ok(Json(ctx.registry.adjust_points(&session.caller, req).await?))
}

pub async fn dashboard(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<DashboardCounts>, ApiError> {
    Ok(Json(ctx.registry.dashboard(&session.caller).await?))
}

pub async fn master_dashboard(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<MasterDashboard>, ApiError> {
    Ok(Json(ctx.registry.master_dashboard(&session.caller).await?))
}

pub async fn coordinators(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<Vec<CoordinatorOverview>>, ApiError> {
    Ok(Json(ctx.registry.coordinators(&session.caller).await?))
}

pub async fn coordinator_dashboard(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<Vec<TeamDetail>>, ApiError> {
    Ok(Json(ctx.registry.coordinator_teams(&session.caller).await?))
}

pub async fn coordinator_pending_submissions(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<Vec<PendingSubmission>>, ApiError> {
    Ok(Json(ctx.registry.coordinator_pending(&session.caller).await?))
}

pub async fn pending_powers(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<Vec<PendingPower>>, ApiError> {
    Ok(Json(ctx.registry.pending_powers(&session.caller).await?))
}

/// GET /api/admin/export-data
pub async fn export_data(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<ExportBundle>, ApiError> {
    let bundle = ctx.registry.export_data(&session.caller).await?;
    info!(
        target: LOG_TARGET,
        user_id = session.caller.user_id,
        total_teams = bundle.total_teams,
        "data exported"
    );
    Ok(Json(bundle))
}

/// PUT /api/admin/week/set
pub async fn change_week(
    Extension(ctx): Ctx,
    session: Session,
    Json(req): Json<WeekChangeRequest>,
) -> Result<Json<WeekChangeResponse>, ApiError> {
    Ok(Json(
        ctx.registry
            .change_week(&session.caller, req.week_number)
            .await?,
    ))
}

// ---------- team ----------

/// GET /api/team/leaderboard (public)
pub async fn leaderboard(Extension(ctx): Ctx) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    Ok(Json(ctx.registry.leaderboard().await?))
}

pub async fn my_team(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<TeamDetail>, ApiError> {
    Ok(Json(ctx.registry.my_team(&session.caller).await?))
}

// ---------- game ----------

/// GET /api/game/status (public)
pub async fn game_status(Extension(ctx): Ctx) -> Result<Json<GameStatus>, ApiError> {
    Ok(Json(ctx.registry.game_status().await?))
}

/// POST /api/game/:action with action one of start, pause, resume, stop
pub async fn game_action(
    Extension(ctx): Ctx,
    session: Session,
    Path(path): Path<GameActionPath>,
) -> Result<Json<GameActionResponse>, ApiError> {
    let action: GameAction = path.action.parse().map_err(|err| {
        warn!(target: LOG_TARGET, action = %path.action, "unknown game action");
        ApiError::not_found(format!("{err}"))
    })?;
    Ok(Json(
        ctx.registry
            .apply_game_action(&session.caller, action)
            .await?,
    ))
}

pub async fn week_configs(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<Vec<WeekConfig>>, ApiError> {
    Ok(Json(ctx.registry.week_configs(&session.caller).await?))
}

pub async fn set_week_config(
    Extension(ctx): Ctx,
    session: Session,
    Json(cfg): Json<WeekConfig>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(ctx.registry.set_week_config(&session.caller, cfg).await?))
}

// ---------- submissions ----------

/// GET /api/submissions/coordinator-history
pub async fn coordinator_history(
    Extension(ctx): Ctx,
    session: Session,
) -> Result<Json<Vec<SubmissionRecord>>, ApiError> {
    Ok(Json(ctx.registry.coordinator_history(&session.caller).await?))
}
