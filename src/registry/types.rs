//! Request and response bodies exchanged over `/api`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::{
    GamePhase, GameState, Person, PowerId, PowerKind, Role, SubmissionId, TeamId, UserId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------- auth ----------

#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub email: String,
    pub name: String,
}

// ---------- team registry ----------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInput {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: String,
    pub leader_name: String,
    pub leader_email: String,
    pub leader_password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_phone: Option<String>,
    #[serde(default)]
    pub members: Vec<MemberInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeamResponse {
    pub message: String,
    pub leader_email: String,
    pub team_id: TeamId,
}

/// Raw roster file as received from a multipart upload.
#[derive(Debug, Clone, Default)]
pub struct CsvUpload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkRegisterReport {
    pub message: String,
    pub teams_created: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderRef {
    pub leader_id: UserId,
    pub leader_name: String,
    pub leader_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorRef {
    pub coordinator_id: UserId,
    pub coordinator_name: String,
    pub coordinator_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team_id: TeamId,
    pub team_name: String,
    pub leader: LeaderRef,
    pub coordinator: Option<CoordinatorRef>,
    pub total_points: i64,
    pub weekly_points: i64,
    pub week_number: i32,
    pub is_disqualified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDetail {
    pub team_id: TeamId,
    pub team_name: String,
    pub leader: Person,
    pub coordinator: Option<Contact>,
    pub members: Vec<Person>,
    pub total_points: i64,
    pub weekly_points: i64,
    pub week_number: i32,
    pub is_disqualified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisqualifyRequest {
    pub team_id: TeamId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequalifyRequest {
    pub team_id: TeamId,
}

/// One override row. `team_id` stays textual: it comes straight from a form
/// field and is parsed server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordUpdate {
    pub team_id: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordsRequest {
    #[serde(default)]
    pub updates: Vec<PasswordUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustPointsRequest {
    pub team_id: TeamId,
    pub points: i64,
    pub reason: String,
    #[serde(default)]
    pub proof_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustPointsResponse {
    pub message: String,
    pub points_changed: i64,
    pub team_total_points: i64,
    pub team_weekly_points: i64,
    pub proof_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub total_teams: u64,
    pub total_coordinators: u64,
    pub total_masters: u64,
    pub total_players: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterDashboard {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    pub total_submissions: u64,
    pub pending_submissions: u64,
    pub active_powers: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedTeam {
    pub team_id: TeamId,
    pub team_name: String,
    pub total_points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorOverview {
    pub coordinator_id: UserId,
    pub name: String,
    pub email: String,
    pub assigned_teams: Vec<AssignedTeam>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPower {
    pub power_id: PowerId,
    pub team_name: String,
    pub power_type: PowerKind,
    pub week_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportBundle {
    pub export_date: DateTime<Utc>,
    pub total_teams: usize,
    pub teams: Vec<TeamDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub team_id: TeamId,
    pub team_name: String,
    pub leader_email: String,
    pub weekly_points: i64,
    pub weekly_cap: i64,
    pub total_points: i64,
}

// ---------- submissions ----------

/// Reviewed submission as shown in a coordinator's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub team_name: String,
    pub task_name: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub points_awarded: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSubmission {
    pub submission_id: SubmissionId,
    pub team_name: String,
    pub task_name: String,
    pub proof_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------- game control ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatus {
    #[serde(flatten)]
    pub state: GameState,
    pub status: GamePhase,
}

impl From<GameState> for GameStatus {
    fn from(state: GameState) -> Self {
        Self {
            status: state.phase(),
            state,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameActionResponse {
    pub message: String,
    pub game: GameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekChangeRequest {
    pub week_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekChangeResponse {
    pub message: String,
    pub week_number: i32,
    pub teams_reset: u64,
    pub powers_deactivated: u64,
}
