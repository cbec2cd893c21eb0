use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    GameState, Person, PowerId, PowerKind, Role, SubmissionId, SubmissionStatus, Team, TeamId,
    TeamPower, UserId, WeekConfig,
};

use crate::registry::error::RegistryError;

#[async_trait]
pub trait RegistryStorage: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn RegistryTxn + Send>, RegistryError>;
}

/// Unit of work over the registry tables. Nothing is visible to other
/// transactions until `commit`.
#[async_trait]
pub trait RegistryTxn: Send {
    // users
    async fn load_user(&mut self, id: UserId) -> Result<Option<StoredUser>, RegistryError>;

    async fn load_user_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<StoredUser>, RegistryError>;

    async fn insert_user(&mut self, user: NewUser) -> Result<UserId, RegistryError>;

    async fn update_password_hash(
        &mut self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), RegistryError>;

    async fn list_users_by_role(&mut self, role: Role) -> Result<Vec<StoredUser>, RegistryError>;

    // teams
    async fn load_team(&mut self, id: TeamId) -> Result<Option<Team>, RegistryError>;

    async fn load_team_by_leader(&mut self, leader_id: UserId)
        -> Result<Option<Team>, RegistryError>;

    /// All teams ordered by id.
    async fn list_teams(&mut self) -> Result<Vec<Team>, RegistryError>;

    async fn last_team_id(&mut self) -> Result<Option<TeamId>, RegistryError>;

    async fn insert_team(&mut self, team: &Team) -> Result<(), RegistryError>;

    async fn update_team(&mut self, team: &Team) -> Result<(), RegistryError>;

    /// Moves every team to `week_number` with zeroed weekly points.
    async fn roll_teams_to_week(&mut self, week_number: i32) -> Result<u64, RegistryError>;

    async fn insert_member(&mut self, team_id: TeamId, member: &Person)
        -> Result<(), RegistryError>;

    async fn load_members(&mut self, team_id: TeamId) -> Result<Vec<Person>, RegistryError>;

    // game
    async fn load_game_state(&mut self) -> Result<GameState, RegistryError>;

    async fn save_game_state(&mut self, state: &GameState) -> Result<(), RegistryError>;

    // week configs
    async fn list_week_configs(&mut self) -> Result<Vec<WeekConfig>, RegistryError>;

    async fn load_week_config(
        &mut self,
        week_number: i32,
    ) -> Result<Option<WeekConfig>, RegistryError>;

    async fn upsert_week_config(&mut self, cfg: &WeekConfig) -> Result<(), RegistryError>;

    // powers
    async fn insert_power(&mut self, power: NewTeamPower) -> Result<PowerId, RegistryError>;

    async fn list_powers(&mut self) -> Result<Vec<TeamPower>, RegistryError>;

    async fn deactivate_powers(&mut self) -> Result<u64, RegistryError>;

    // submissions
    async fn insert_submission(
        &mut self,
        submission: NewSubmission,
    ) -> Result<SubmissionId, RegistryError>;

    async fn list_submissions_for_teams(
        &mut self,
        team_ids: &[TeamId],
    ) -> Result<Vec<StoredSubmission>, RegistryError>;

    async fn count_submissions(
        &mut self,
        status: Option<SubmissionStatus>,
    ) -> Result<u64, RegistryError>;

    // point adjustments
    async fn insert_adjustment(&mut self, row: NewPointAdjustment) -> Result<i64, RegistryError>;

    /// Audit trail for one team, oldest first.
    async fn list_adjustments(
        &mut self,
        team_id: TeamId,
    ) -> Result<Vec<StoredAdjustment>, RegistryError>;

    // sessions
    async fn insert_session(&mut self, token: &str, user_id: UserId)
        -> Result<(), RegistryError>;

    async fn load_session(&mut self, token: &str) -> Result<Option<UserId>, RegistryError>;

    async fn revoke_session(&mut self, token: &str) -> Result<bool, RegistryError>;

    async fn revoke_user_sessions(&mut self, user_id: UserId) -> Result<u64, RegistryError>;

    async fn commit(self: Box<Self>) -> Result<(), RegistryError>;
    async fn rollback(self: Box<Self>);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub phone: Option<String>,
    pub academic_year: Option<String>,
    pub department: Option<String>,
}

impl StoredUser {
    pub fn person(&self) -> Person {
        Person {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            academic_year: self.academic_year.clone(),
            department: self.department.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub phone: Option<String>,
    pub academic_year: Option<String>,
    pub department: Option<String>,
}

impl NewUser {
    pub fn from_person(person: &Person, role: Role, password_hash: String) -> Self {
        Self {
            name: person.name.clone(),
            email: person.email.clone(),
            role,
            password_hash,
            phone: person.phone.clone(),
            academic_year: person.academic_year.clone(),
            department: person.department.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewTeamPower {
    pub team_id: TeamId,
    pub power_type: PowerKind,
    pub week_number: i32,
    pub is_active: bool,
    pub used_count: i32,
    pub power_value: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredSubmission {
    pub id: SubmissionId,
    pub team_id: TeamId,
    pub task_name: String,
    pub proof_url: Option<String>,
    pub description: Option<String>,
    pub status: SubmissionStatus,
    pub points_awarded: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewSubmission {
    pub team_id: TeamId,
    pub task_name: String,
    pub proof_url: Option<String>,
    pub description: Option<String>,
    pub status: SubmissionStatus,
    pub points_awarded: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredAdjustment {
    pub id: i64,
    pub team_id: TeamId,
    pub points_changed: i64,
    pub reason: String,
    pub adjusted_by: UserId,
    pub week_number: i32,
    pub proof_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewPointAdjustment {
    pub team_id: TeamId,
    pub points_changed: i64,
    pub reason: String,
    pub adjusted_by: UserId,
    pub week_number: i32,
    pub proof_url: Option<String>,
}

pub mod in_memory;
pub mod sea_orm;

pub use in_memory::InMemoryRegistryStorage;
pub use sea_orm::SeaOrmRegistryStorage;
