use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{Caller, GameAction, Person, Role, UserId, WeekConfig};

use super::error::RegistryError;
use super::import::{decode_upload, ensure_csv_filename, parse_roster, RosterRow};
use super::storage::{
    InMemoryRegistryStorage, RegistryStorage, RegistryTxn, SeaOrmRegistryStorage,
};
use super::types::{
    AdjustPointsRequest, AdjustPointsResponse, BulkRegisterReport, CoordinatorOverview,
    CreateTeamRequest, CreateTeamResponse, CsvUpload, DashboardCounts, DisqualifyRequest,
    ExportBundle, GameActionResponse, GameStatus, LeaderboardEntry, LoginResponse,
    MasterDashboard, MessageResponse, PasswordUpdate, PendingPower, PendingSubmission,
    SubmissionRecord, TeamDetail, TeamSummary, WeekChangeResponse,
};
use super::validation::{normalize_email, validate_create_team};
use super::{game, sessions, teams};

const LOG_TARGET: &str = "registry::service";

#[async_trait]
pub trait RegistryService: Send + Sync {
    // sessions
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, RegistryError>;

    async fn authenticate(&self, token: &str) -> Result<Caller, RegistryError>;

    async fn logout(&self, token: &str) -> Result<MessageResponse, RegistryError>;

    /// Creates an account if the email is free. Returns the id and whether it
    /// was created by this call.
    async fn provision_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<(UserId, bool), RegistryError>;

    // team registry
    async fn create_team(
        &self,
        caller: &Caller,
        req: CreateTeamRequest,
    ) -> Result<CreateTeamResponse, RegistryError>;

    async fn bulk_register(
        &self,
        caller: &Caller,
        upload: Option<CsvUpload>,
    ) -> Result<BulkRegisterReport, RegistryError>;

    async fn list_teams(&self, caller: &Caller) -> Result<Vec<TeamSummary>, RegistryError>;

    async fn team_detail(&self, caller: &Caller, team_id: i64)
        -> Result<TeamDetail, RegistryError>;

    async fn my_team(&self, caller: &Caller) -> Result<TeamDetail, RegistryError>;

    async fn disqualify_team(
        &self,
        caller: &Caller,
        req: DisqualifyRequest,
    ) -> Result<MessageResponse, RegistryError>;

    async fn requalify_team(
        &self,
        caller: &Caller,
        team_id: i64,
    ) -> Result<MessageResponse, RegistryError>;

    async fn change_team_passwords(
        &self,
        caller: &Caller,
        updates: Vec<PasswordUpdate>,
    ) -> Result<MessageResponse, RegistryError>;

    async fn adjust_points(
        &self,
        caller: &Caller,
        req: AdjustPointsRequest,
    ) -> Result<AdjustPointsResponse, RegistryError>;

    async fn dashboard(&self, caller: &Caller) -> Result<DashboardCounts, RegistryError>;

    async fn master_dashboard(&self, caller: &Caller) -> Result<MasterDashboard, RegistryError>;

    async fn coordinators(&self, caller: &Caller)
        -> Result<Vec<CoordinatorOverview>, RegistryError>;

    async fn coordinator_teams(&self, caller: &Caller) -> Result<Vec<TeamDetail>, RegistryError>;

    async fn coordinator_history(
        &self,
        caller: &Caller,
    ) -> Result<Vec<SubmissionRecord>, RegistryError>;

    async fn coordinator_pending(
        &self,
        caller: &Caller,
    ) -> Result<Vec<PendingSubmission>, RegistryError>;

    async fn pending_powers(&self, caller: &Caller) -> Result<Vec<PendingPower>, RegistryError>;

    async fn export_data(&self, caller: &Caller) -> Result<ExportBundle, RegistryError>;

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, RegistryError>;

    // game control
    async fn game_status(&self) -> Result<GameStatus, RegistryError>;

    async fn apply_game_action(
        &self,
        caller: &Caller,
        action: GameAction,
    ) -> Result<GameActionResponse, RegistryError>;

    async fn week_configs(&self, caller: &Caller) -> Result<Vec<WeekConfig>, RegistryError>;

    async fn set_week_config(
        &self,
        caller: &Caller,
        cfg: WeekConfig,
    ) -> Result<MessageResponse, RegistryError>;

    async fn change_week(
        &self,
        caller: &Caller,
        week_number: i32,
    ) -> Result<WeekChangeResponse, RegistryError>;
}

#[derive(Clone)]
pub struct RegistryServiceFactory {
    storage: Arc<dyn RegistryStorage>,
    config: AppConfig,
}

impl RegistryServiceFactory {
    pub fn new(storage: Arc<dyn RegistryStorage>, config: AppConfig) -> Self {
        Self { storage, config }
    }

    pub fn from_sea_orm(connection: DatabaseConnection, config: AppConfig) -> Self {
        let storage = Arc::new(SeaOrmRegistryStorage::new(connection)) as Arc<dyn RegistryStorage>;
        Self::new(storage, config)
    }

    pub fn in_memory(config: AppConfig) -> Self {
        let storage = Arc::new(InMemoryRegistryStorage::new()) as Arc<dyn RegistryStorage>;
        Self::new(storage, config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn require_super_admin(&self, caller: &Caller) -> Result<(), RegistryError> {
        if caller.role == Role::Master && self.config.is_super_admin(&caller.email) {
            Ok(())
        } else {
            Err(RegistryError::super_admin_required())
        }
    }

    /// Imports one roster row in its own transaction.
    async fn import_row(&self, row: &RosterRow) -> Result<(), String> {
        let mut txn = self
            .storage
            .begin()
            .await
            .map_err(|err| format!("Row {} Failed: {err}", row.row_number))?;

        let email = normalize_email(&row.leader.email);
        let existing = match txn.load_user_by_email(&email).await {
            Ok(existing) => existing,
            Err(err) => {
                txn.rollback().await;
                return Err(format!("Row {} Failed: {err}", row.row_number));
            }
        };
        if existing.is_some() {
            txn.rollback().await;
            return Err(format!(
                "Row {}: Email {} already exists. Skipped.",
                row.row_number, row.leader.email
            ));
        }

        let result = teams::register_team(
            txn.as_mut(),
            &row.team_name,
            &row.leader,
            row.initial_password(),
            &row.members,
        )
        .await;
        finish(txn, result)
            .await
            .map(|_| ())
            .map_err(|err| format!("Row {} Failed: {err}", row.row_number))
    }
}

fn require_role(caller: &Caller, allowed: &[Role]) -> Result<(), RegistryError> {
    if caller.has_role(allowed) {
        Ok(())
    } else {
        Err(RegistryError::Forbidden(format!(
            "role {} may not perform this action",
            caller.role
        )))
    }
}

async fn finish<T>(
    txn: Box<dyn RegistryTxn + Send>,
    result: Result<T, RegistryError>,
) -> Result<T, RegistryError> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            txn.rollback().await;
            Err(err)
        }
    }
}

const STAFF: &[Role] = &[Role::Master, Role::Coordinator];

#[async_trait]
impl RegistryService for RegistryServiceFactory {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, RegistryError> {
        let mut txn = self.storage.begin().await?;
        let result = sessions::login(txn.as_mut(), email, password).await;
        finish(txn, result).await
    }

    async fn authenticate(&self, token: &str) -> Result<Caller, RegistryError> {
        let mut txn = self.storage.begin().await?;
        let result = sessions::authenticate(txn.as_mut(), token).await;
        finish(txn, result).await
    }

    async fn logout(&self, token: &str) -> Result<MessageResponse, RegistryError> {
        let mut txn = self.storage.begin().await?;
        let result = txn.revoke_session(token).await;
        let revoked = finish(txn, result).await?;
        if !revoked {
            return Err(RegistryError::Unauthorized);
        }
        Ok(MessageResponse::new("Logged out"))
    }

    async fn provision_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<(UserId, bool), RegistryError> {
        let mut txn = self.storage.begin().await?;
        let result = sessions::provision_account(txn.as_mut(), name, email, password, role).await;
        let (id, created) = finish(txn, result).await?;
        if created {
            info!(target: LOG_TARGET, user_id = id, %role, "account provisioned");
        }
        Ok((id, created))
    }

    async fn create_team(
        &self,
        caller: &Caller,
        req: CreateTeamRequest,
    ) -> Result<CreateTeamResponse, RegistryError> {
        require_role(caller, STAFF)?;
        validate_create_team(&req)?;

        let leader = Person {
            name: req.leader_name.trim().to_string(),
            email: normalize_email(&req.leader_email),
            phone: req.leader_phone.clone().filter(|p| !p.trim().is_empty()),
            academic_year: None,
            department: None,
        };
        let members: Vec<Person> = req
            .members
            .iter()
            .map(|m| Person {
                name: m.name.trim().to_string(),
                email: m.email.trim().to_string(),
                phone: None,
                academic_year: m.academic_year.clone(),
                department: m.department.clone(),
            })
            .collect();

        let mut txn = self.storage.begin().await?;
        let result = teams::register_team(
            txn.as_mut(),
            &req.team_name,
            &leader,
            &req.leader_password,
            &members,
        )
        .await;
        let team_id = finish(txn, result).await?;

        Ok(CreateTeamResponse {
            message: "Team created successfully".into(),
            leader_email: leader.email,
            team_id,
        })
    }

    async fn bulk_register(
        &self,
        caller: &Caller,
        upload: Option<CsvUpload>,
    ) -> Result<BulkRegisterReport, RegistryError> {
        self.require_super_admin(caller)?;
        let upload = upload.ok_or_else(|| RegistryError::validation("No CSV file uploaded"))?;
        ensure_csv_filename(upload.file_name.as_deref())?;
        let text = decode_upload(&upload.bytes)?;

        let mut report = BulkRegisterReport::default();
        for row in parse_roster(&text) {
            let outcome = match row {
                Ok(row) => self.import_row(&row).await,
                Err(message) => Err(message),
            };
            match outcome {
                Ok(()) => report.teams_created += 1,
                Err(message) => report.errors.push(message),
            }
        }

        if !report.errors.is_empty() {
            warn!(
                target: LOG_TARGET,
                failed_rows = report.errors.len(),
                "bulk import finished with row errors"
            );
        }
        info!(
            target: LOG_TARGET,
            teams_created = report.teams_created,
            "bulk import finished"
        );
        report.message = format!(
            "Successfully registered {} teams from CSV.",
            report.teams_created
        );
        Ok(report)
    }

    async fn list_teams(&self, caller: &Caller) -> Result<Vec<TeamSummary>, RegistryError> {
        require_role(caller, STAFF)?;
        let mut txn = self.storage.begin().await?;
        let result = teams::list_teams(txn.as_mut()).await;
        finish(txn, result).await
    }

    async fn team_detail(
        &self,
        caller: &Caller,
        team_id: i64,
    ) -> Result<TeamDetail, RegistryError> {
        require_role(caller, STAFF)?;
        let mut txn = self.storage.begin().await?;
        let result = teams::load_team_detail(txn.as_mut(), team_id).await;
        finish(txn, result).await
    }

    async fn my_team(&self, caller: &Caller) -> Result<TeamDetail, RegistryError> {
        require_role(caller, &[Role::Team])?;
        let mut txn = self.storage.begin().await?;
        let result = teams::my_team(txn.as_mut(), caller).await;
        finish(txn, result).await
    }

    async fn disqualify_team(
        &self,
        caller: &Caller,
        req: DisqualifyRequest,
    ) -> Result<MessageResponse, RegistryError> {
        require_role(caller, &[Role::Master])?;
        let mut txn = self.storage.begin().await?;
        let result = teams::disqualify(txn.as_mut(), &req).await;
        finish(txn, result).await
    }

    async fn requalify_team(
        &self,
        caller: &Caller,
        team_id: i64,
    ) -> Result<MessageResponse, RegistryError> {
        require_role(caller, &[Role::Master])?;
        let mut txn = self.storage.begin().await?;
        let result = teams::set_disqualified(txn.as_mut(), team_id, false).await;
        finish(txn, result).await
    }

    async fn change_team_passwords(
        &self,
        caller: &Caller,
        updates: Vec<PasswordUpdate>,
    ) -> Result<MessageResponse, RegistryError> {
        self.require_super_admin(caller)?;
        let mut txn = self.storage.begin().await?;
        let result = teams::change_passwords(txn.as_mut(), &updates).await;
        finish(txn, result).await
    }

    async fn adjust_points(
        &self,
        caller: &Caller,
        req: AdjustPointsRequest,
    ) -> Result<AdjustPointsResponse, RegistryError> {
        require_role(caller, &[Role::Master])?;
        let mut txn = self.storage.begin().await?;
        let result = teams::adjust_points(txn.as_mut(), caller, &req).await;
        finish(txn, result).await
    }

    async fn dashboard(&self, caller: &Caller) -> Result<DashboardCounts, RegistryError> {
        require_role(caller, STAFF)?;
        let mut txn = self.storage.begin().await?;
        let result = teams::dashboard(txn.as_mut()).await;
        finish(txn, result).await
    }

    async fn master_dashboard(&self, caller: &Caller) -> Result<MasterDashboard, RegistryError> {
        require_role(caller, &[Role::Master])?;
        let mut txn = self.storage.begin().await?;
        let result = teams::master_dashboard(txn.as_mut()).await;
        finish(txn, result).await
    }

    async fn coordinators(
        &self,
        caller: &Caller,
    ) -> Result<Vec<CoordinatorOverview>, RegistryError> {
        require_role(caller, &[Role::Master])?;
        let mut txn = self.storage.begin().await?;
        let result = teams::coordinators(txn.as_mut()).await;
        finish(txn, result).await
    }

    async fn coordinator_teams(&self, caller: &Caller) -> Result<Vec<TeamDetail>, RegistryError> {
        require_role(caller, &[Role::Coordinator])?;
        let mut txn = self.storage.begin().await?;
        let result = teams::coordinator_teams(txn.as_mut(), caller).await;
        finish(txn, result).await
    }

    async fn coordinator_history(
        &self,
        caller: &Caller,
    ) -> Result<Vec<SubmissionRecord>, RegistryError> {
        require_role(caller, &[Role::Coordinator])?;
        let mut txn = self.storage.begin().await?;
        let result = teams::coordinator_history(txn.as_mut(), caller).await;
        finish(txn, result).await
    }

    async fn coordinator_pending(
        &self,
        caller: &Caller,
    ) -> Result<Vec<PendingSubmission>, RegistryError> {
        require_role(caller, &[Role::Coordinator])?;
        let mut txn = self.storage.begin().await?;
        let result = teams::coordinator_pending(txn.as_mut(), caller).await;
        finish(txn, result).await
    }

    async fn pending_powers(&self, caller: &Caller) -> Result<Vec<PendingPower>, RegistryError> {
        require_role(caller, &[Role::Master])?;
        let mut txn = self.storage.begin().await?;
        let result = teams::pending_powers(txn.as_mut()).await;
        finish(txn, result).await
    }

    async fn export_data(&self, caller: &Caller) -> Result<ExportBundle, RegistryError> {
        self.require_super_admin(caller)?;
        let mut txn = self.storage.begin().await?;
        let result = teams::export_teams(txn.as_mut()).await;
        let teams = finish(txn, result).await?;
        Ok(ExportBundle {
            export_date: Utc::now(),
            total_teams: teams.len(),
            teams,
        })
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, RegistryError> {
        let mut txn = self.storage.begin().await?;
        let result = teams::leaderboard(txn.as_mut()).await;
        finish(txn, result).await
    }

    async fn game_status(&self) -> Result<GameStatus, RegistryError> {
        let mut txn = self.storage.begin().await?;
        let result = game::status(txn.as_mut()).await;
        finish(txn, result).await
    }

    async fn apply_game_action(
        &self,
        caller: &Caller,
        action: GameAction,
    ) -> Result<GameActionResponse, RegistryError> {
        require_role(caller, &[Role::Master])?;
        let mut txn = self.storage.begin().await?;
        let result = game::apply_action(txn.as_mut(), action).await;
        finish(txn, result).await
    }

    async fn week_configs(&self, _caller: &Caller) -> Result<Vec<WeekConfig>, RegistryError> {
        let mut txn = self.storage.begin().await?;
        let result = game::week_configs(txn.as_mut()).await;
        finish(txn, result).await
    }

    async fn set_week_config(
        &self,
        caller: &Caller,
        cfg: WeekConfig,
    ) -> Result<MessageResponse, RegistryError> {
        require_role(caller, &[Role::Master])?;
        let mut txn = self.storage.begin().await?;
        let result = game::set_week_config(txn.as_mut(), &cfg).await;
        finish(txn, result).await
    }

    async fn change_week(
        &self,
        caller: &Caller,
        week_number: i32,
    ) -> Result<WeekChangeResponse, RegistryError> {
        self.require_super_admin(caller)?;
        let mut txn = self.storage.begin().await?;
        let result = game::change_week(txn.as_mut(), week_number).await;
        finish(txn, result).await
    }
}
