use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::domain::{GameAction, TeamId, WeekConfig};
use crate::registry::types::{
    AdjustPointsRequest, AdjustPointsResponse, BulkRegisterReport, ChangePasswordsRequest,
    CoordinatorOverview, CreateTeamResponse, DashboardCounts, DisqualifyRequest, ExportBundle,
    GameActionResponse, GameStatus, LeaderboardEntry, LoginRequest, LoginResponse,
    MasterDashboard, MessageResponse, PendingPower, PendingSubmission, RequalifyRequest,
    SubmissionRecord, TeamDetail, TeamSummary, WeekChangeRequest, WeekChangeResponse,
};
use crate::server::dto::ErrorBody;

use super::confirm::{Confirm, REQUALIFY_PROMPT, STOP_GAME_PROMPT, WEEK_CHANGE_PROMPT};
use super::display::backup_file_name;
use super::error::{ClientError, FormError};
use super::forms::{prepare_password_overrides, CreateTeamForm, PasswordOverrideRow};
use super::token_store::{StoredIdentity, TokenStore};

const LOG_TARGET: &str = "client::api";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";
pub const API_URL_ENV: &str = "CULLING_API_URL";
pub const LOGIN_ROUTE: &str = "/login";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut raw = base_url.trim().to_string();
        // Url::join drops the last segment unless the base ends with a slash.
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Self {
            base_url: Url::parse(&raw)?,
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        let raw = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&raw)
    }
}

/// Navigation hook invoked when the server reports the session as expired.
pub trait LoginRedirect: Send + Sync {
    fn current_route(&self) -> String;
    fn redirect_to_login(&self);
}

/// For callers without a login screen to send anyone to.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRedirect;

impl LoginRedirect for NoRedirect {
    fn current_route(&self) -> String {
        LOGIN_ROUTE.to_string()
    }

    fn redirect_to_login(&self) {}
}

/// Typed access to every `/api` endpoint.
///
/// The bearer token is read from the [`TokenStore`] for each request. Any 401
/// clears the store and, unless the navigator already sits on the login
/// route, redirects there once.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
    redirect: Arc<dyn LoginRedirect>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        tokens: Arc<dyn TokenStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url,
            tokens,
            redirect,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn identity(&self) -> Option<StoredIdentity> {
        self.tokens.load()
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        let mut builder = self.http.request(method, url);
        if let Some(identity) = self.tokens.load() {
            builder = builder.bearer_auth(identity.token);
        }
        Ok(builder)
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response.json::<ErrorBody>().await.ok().map(|body| body.error);
        debug!(target: LOG_TARGET, status = status.as_u16(), ?message, "request rejected");
        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(ClientError::Unauthorized { message });
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    fn expire_session(&self) {
        self.tokens.clear();
        if self.redirect.current_route() != LOGIN_ROUTE {
            info!(target: LOG_TARGET, "session expired, redirecting to login");
            self.redirect.redirect_to_login();
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(self.request(Method::GET, path)?).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.execute(self.request(method, path)?.json(body)).await
    }

    // ---------- auth ----------

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.send_json(Method::POST, "auth/login", &body).await?;
        self.tokens.save(&StoredIdentity::from(response.clone()))?;
        info!(target: LOG_TARGET, email = %response.email, role = %response.role, "logged in");
        Ok(response)
    }

    /// Revokes the session server side when there is one. Local credentials
    /// are dropped either way.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if self.tokens.load().is_none() {
            return Ok(());
        }
        let result = self
            .execute::<MessageResponse>(self.request(Method::POST, "auth/logout")?)
            .await;
        self.tokens.clear();
        match result {
            Ok(_) | Err(ClientError::Unauthorized { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }

    // ---------- team registry ----------

    pub async fn create_team(&self, form: &CreateTeamForm) -> Result<CreateTeamResponse, ClientError> {
        let request = form.to_request()?;
        self.send_json(Method::POST, "admin/create-team", &request)
            .await
    }

    pub async fn bulk_register(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<BulkRegisterReport, ClientError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);
        self.execute(self.request(Method::POST, "admin/bulk-register")?.multipart(form))
            .await
    }

    pub async fn teams(&self) -> Result<Vec<TeamSummary>, ClientError> {
        self.get("admin/teams").await
    }

    pub async fn team(&self, team_id: TeamId) -> Result<TeamDetail, ClientError> {
        self.get(&format!("admin/team/{team_id}")).await
    }

    pub async fn my_team(&self) -> Result<TeamDetail, ClientError> {
        self.get("team/me").await
    }

    pub async fn disqualify(&self, team_id: TeamId, reason: &str) -> Result<MessageResponse, ClientError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(FormError::MissingReason.into());
        }
        let body = DisqualifyRequest {
            team_id,
            reason: reason.to_string(),
        };
        self.send_json(Method::POST, "admin/disqualify-team", &body)
            .await
    }

    pub async fn requalify(
        &self,
        team_id: TeamId,
        confirm: &dyn Confirm,
    ) -> Result<MessageResponse, ClientError> {
        if !confirm.confirm(REQUALIFY_PROMPT) {
            return Err(ClientError::Cancelled);
        }
        self.send_json(Method::POST, "admin/requalify-team", &RequalifyRequest { team_id })
            .await
    }

    pub async fn change_passwords(
        &self,
        rows: &[PasswordOverrideRow],
    ) -> Result<MessageResponse, ClientError> {
        let updates = prepare_password_overrides(rows)?;
        self.send_json(
            Method::POST,
            "admin/change-team-password",
            &ChangePasswordsRequest { updates },
        )
        .await
    }

    pub async fn adjust_points(
        &self,
        request: &AdjustPointsRequest,
    ) -> Result<AdjustPointsResponse, ClientError> {
        self.send_json(Method::POST, "admin/adjust-points", request)
            .await
    }

    // ---------- dashboards ----------

    pub async fn dashboard(&self) -> Result<DashboardCounts, ClientError> {
        self.get("admin/dashboard").await
    }

    pub async fn master_dashboard(&self) -> Result<MasterDashboard, ClientError> {
        self.get("admin/master-dashboard").await
    }

    pub async fn coordinators(&self) -> Result<Vec<CoordinatorOverview>, ClientError> {
        self.get("admin/coordinators").await
    }

    pub async fn coordinator_dashboard(&self) -> Result<Vec<TeamDetail>, ClientError> {
        self.get("admin/coordinator-dashboard").await
    }

    pub async fn coordinator_pending(&self) -> Result<Vec<PendingSubmission>, ClientError> {
        self.get("admin/coordinator-pending-submissions").await
    }

    pub async fn coordinator_history(&self) -> Result<Vec<SubmissionRecord>, ClientError> {
        self.get("submissions/coordinator-history").await
    }

    pub async fn pending_powers(&self) -> Result<Vec<PendingPower>, ClientError> {
        self.get("admin/pending-powers").await
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ClientError> {
        self.get("team/leaderboard").await
    }

    pub async fn export_data(&self) -> Result<ExportBundle, ClientError> {
        self.get("admin/export-data").await
    }

    /// Saves a full export as `CullingGames_Backup_Week_<n>.json` in `dir`.
    pub async fn download_backup(&self, dir: &Path, current_week: i32) -> Result<PathBuf, ClientError> {
        let bundle = self.export_data().await?;
        let path = dir.join(backup_file_name(current_week));
        let json = serde_json::to_vec_pretty(&bundle)?;
        tokio::fs::write(&path, json).await?;
        info!(
            target: LOG_TARGET,
            path = %path.display(),
            total_teams = bundle.total_teams,
            "backup written"
        );
        Ok(path)
    }

    // ---------- game control ----------

    pub async fn game_status(&self) -> Result<GameStatus, ClientError> {
        self.get("game/status").await
    }

    pub async fn game_action(
        &self,
        action: GameAction,
        confirm: &dyn Confirm,
    ) -> Result<GameActionResponse, ClientError> {
        if action == GameAction::Stop && !confirm.confirm(STOP_GAME_PROMPT) {
            return Err(ClientError::Cancelled);
        }
        let response: GameActionResponse = self
            .execute(self.request(Method::POST, &format!("game/{}", action.as_str()))?)
            .await?;
        if let Some(winner) = response.winner.as_deref() {
            info!(target: LOG_TARGET, winner, "game stopped");
        }
        Ok(response)
    }

    pub async fn week_configs(&self) -> Result<Vec<WeekConfig>, ClientError> {
        self.get("week-config/all").await
    }

    pub async fn set_week_config(&self, config: &WeekConfig) -> Result<MessageResponse, ClientError> {
        self.send_json(Method::POST, "week-config/set", config)
            .await
    }

    pub async fn change_week(
        &self,
        week_number: i32,
        confirm: &dyn Confirm,
    ) -> Result<WeekChangeResponse, ClientError> {
        if !confirm.confirm(WEEK_CHANGE_PROMPT) {
            return Err(ClientError::Cancelled);
        }
        let response: WeekChangeResponse = self
            .send_json(Method::PUT, "admin/week/set", &WeekChangeRequest { week_number })
            .await?;
        info!(
            target: LOG_TARGET,
            week_number,
            teams_reset = response.teams_reset,
            powers_deactivated = response.powers_deactivated,
            "week changed"
        );
        Ok(response)
    }
}
