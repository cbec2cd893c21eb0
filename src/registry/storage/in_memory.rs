use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    GameState, Person, PowerId, Role, SubmissionId, SubmissionStatus, Team, TeamId, TeamPower,
    UserId, WeekConfig,
};

use crate::registry::error::RegistryError;

use super::{
    NewPointAdjustment, NewSubmission, NewTeamPower, NewUser, RegistryStorage, RegistryTxn,
    StoredAdjustment, StoredSubmission, StoredUser,
};

/// Each collection sits behind its own `Arc`, so staging a transaction
/// copies only the collections it writes to.
#[derive(Clone)]
struct Inner {
    users: Arc<BTreeMap<UserId, StoredUser>>,
    teams: Arc<BTreeMap<TeamId, Team>>,
    members: Arc<Vec<(TeamId, Person)>>,
    game: Option<GameState>,
    weeks: Arc<BTreeMap<i32, WeekConfig>>,
    powers: Arc<BTreeMap<PowerId, TeamPower>>,
    submissions: Arc<BTreeMap<SubmissionId, StoredSubmission>>,
    adjustments: Arc<Vec<StoredAdjustment>>,
    sessions: Arc<HashMap<String, UserId>>,
    next_user_id: UserId,
    next_power_id: PowerId,
    next_submission_id: SubmissionId,
    next_adjustment_id: i64,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            users: Arc::default(),
            teams: Arc::default(),
            members: Arc::default(),
            game: None,
            weeks: Arc::default(),
            powers: Arc::default(),
            submissions: Arc::default(),
            adjustments: Arc::default(),
            sessions: Arc::default(),
            next_user_id: 1,
            next_power_id: 1,
            next_submission_id: 1,
            next_adjustment_id: 1,
        }
    }
}

/// Process-local storage. Transactions are serialized: `begin` takes the
/// lock and stages a shallow copy that `commit` swaps in.
#[derive(Clone, Default)]
pub struct InMemoryRegistryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryRegistryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct InMemoryRegistryTxn {
    guard: OwnedMutexGuard<Inner>,
    staged: Inner,
}

#[async_trait]
impl RegistryStorage for InMemoryRegistryStorage {
    async fn begin(&self) -> Result<Box<dyn RegistryTxn + Send>, RegistryError> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryRegistryTxn { guard, staged }))
    }
}

#[async_trait]
impl RegistryTxn for InMemoryRegistryTxn {
    async fn load_user(&mut self, id: UserId) -> Result<Option<StoredUser>, RegistryError> {
        Ok(self.staged.users.get(&id).cloned())
    }

    async fn load_user_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<StoredUser>, RegistryError> {
        Ok(self
            .staged
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<UserId, RegistryError> {
        let id = self.staged.next_user_id;
        self.staged.next_user_id += 1;
        Arc::make_mut(&mut self.staged.users).insert(
            id,
            StoredUser {
                id,
                name: user.name,
                email: user.email,
                role: user.role,
                password_hash: user.password_hash,
                phone: user.phone,
                academic_year: user.academic_year,
                department: user.department,
            },
        );
        Ok(id)
    }

    async fn update_password_hash(
        &mut self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), RegistryError> {
        let user = Arc::make_mut(&mut self.staged.users)
            .get_mut(&id)
            .ok_or(RegistryError::NotFound("user"))?;
        user.password_hash = password_hash;
        Ok(())
    }

    async fn list_users_by_role(&mut self, role: Role) -> Result<Vec<StoredUser>, RegistryError> {
        Ok(self
            .staged
            .users
            .values()
            .filter(|user| user.role == role)
            .cloned()
            .collect())
    }

    async fn load_team(&mut self, id: TeamId) -> Result<Option<Team>, RegistryError> {
        Ok(self.staged.teams.get(&id).cloned())
    }

    async fn load_team_by_leader(
        &mut self,
        leader_id: UserId,
    ) -> Result<Option<Team>, RegistryError> {
        Ok(self
            .staged
            .teams
            .values()
            .find(|team| team.leader_id == leader_id)
            .cloned())
    }

    async fn list_teams(&mut self) -> Result<Vec<Team>, RegistryError> {
        Ok(self.staged.teams.values().cloned().collect())
    }

    async fn last_team_id(&mut self) -> Result<Option<TeamId>, RegistryError> {
        Ok(self.staged.teams.keys().next_back().copied())
    }

    async fn insert_team(&mut self, team: &Team) -> Result<(), RegistryError> {
        if self.staged.teams.contains_key(&team.id) {
            return Err(RegistryError::conflict(format!(
                "team {} already exists",
                team.id
            )));
        }
        Arc::make_mut(&mut self.staged.teams).insert(team.id, team.clone());
        Ok(())
    }

    async fn update_team(&mut self, team: &Team) -> Result<(), RegistryError> {
        let slot = Arc::make_mut(&mut self.staged.teams)
            .get_mut(&team.id)
            .ok_or(RegistryError::NotFound("team"))?;
        *slot = team.clone();
        Ok(())
    }

    async fn roll_teams_to_week(&mut self, week_number: i32) -> Result<u64, RegistryError> {
        for team in Arc::make_mut(&mut self.staged.teams).values_mut() {
            team.roll_to_week(week_number);
        }
        Ok(self.staged.teams.len() as u64)
    }

    async fn insert_member(
        &mut self,
        team_id: TeamId,
        member: &Person,
    ) -> Result<(), RegistryError> {
        Arc::make_mut(&mut self.staged.members).push((team_id, member.clone()));
        Ok(())
    }

    async fn load_members(&mut self, team_id: TeamId) -> Result<Vec<Person>, RegistryError> {
        Ok(self
            .staged
            .members
            .iter()
            .filter(|(owner, _)| *owner == team_id)
            .map(|(_, member)| member.clone())
            .collect())
    }

    async fn load_game_state(&mut self) -> Result<GameState, RegistryError> {
        Ok(self.staged.game.unwrap_or_default())
    }

    async fn save_game_state(&mut self, state: &GameState) -> Result<(), RegistryError> {
        self.staged.game = Some(*state);
        Ok(())
    }

    async fn list_week_configs(&mut self) -> Result<Vec<WeekConfig>, RegistryError> {
        Ok(self.staged.weeks.values().copied().collect())
    }

    async fn load_week_config(
        &mut self,
        week_number: i32,
    ) -> Result<Option<WeekConfig>, RegistryError> {
        Ok(self.staged.weeks.get(&week_number).copied())
    }

    async fn upsert_week_config(&mut self, cfg: &WeekConfig) -> Result<(), RegistryError> {
        Arc::make_mut(&mut self.staged.weeks).insert(cfg.week_number, *cfg);
        Ok(())
    }

    async fn insert_power(&mut self, power: NewTeamPower) -> Result<PowerId, RegistryError> {
        let id = self.staged.next_power_id;
        self.staged.next_power_id += 1;
        Arc::make_mut(&mut self.staged.powers).insert(
            id,
            TeamPower {
                id,
                team_id: power.team_id,
                power_type: power.power_type,
                week_number: power.week_number,
                is_active: power.is_active,
                used_count: power.used_count,
                power_value: power.power_value,
            },
        );
        Ok(id)
    }

    async fn list_powers(&mut self) -> Result<Vec<TeamPower>, RegistryError> {
        Ok(self.staged.powers.values().cloned().collect())
    }

    async fn deactivate_powers(&mut self) -> Result<u64, RegistryError> {
        let mut changed = 0;
        let powers = Arc::make_mut(&mut self.staged.powers);
        for power in powers.values_mut().filter(|p| p.is_active) {
            power.is_active = false;
            changed += 1;
        }
        Ok(changed)
    }

    async fn insert_submission(
        &mut self,
        submission: NewSubmission,
    ) -> Result<SubmissionId, RegistryError> {
        let id = self.staged.next_submission_id;
        self.staged.next_submission_id += 1;
        Arc::make_mut(&mut self.staged.submissions).insert(
            id,
            StoredSubmission {
                id,
                team_id: submission.team_id,
                task_name: submission.task_name,
                proof_url: submission.proof_url,
                description: submission.description,
                status: submission.status,
                points_awarded: submission.points_awarded,
                created_at: submission.created_at,
            },
        );
        Ok(id)
    }

    async fn list_submissions_for_teams(
        &mut self,
        team_ids: &[TeamId],
    ) -> Result<Vec<StoredSubmission>, RegistryError> {
        Ok(self
            .staged
            .submissions
            .values()
            .filter(|s| team_ids.contains(&s.team_id))
            .cloned()
            .collect())
    }

    async fn count_submissions(
        &mut self,
        status: Option<SubmissionStatus>,
    ) -> Result<u64, RegistryError> {
        let count = self
            .staged
            .submissions
            .values()
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .count();
        Ok(count as u64)
    }

    async fn insert_adjustment(&mut self, row: NewPointAdjustment) -> Result<i64, RegistryError> {
        let id = self.staged.next_adjustment_id;
        self.staged.next_adjustment_id += 1;
        Arc::make_mut(&mut self.staged.adjustments).push(StoredAdjustment {
            id,
            team_id: row.team_id,
            points_changed: row.points_changed,
            reason: row.reason,
            adjusted_by: row.adjusted_by,
            week_number: row.week_number,
            proof_url: row.proof_url,
        });
        Ok(id)
    }

    async fn list_adjustments(
        &mut self,
        team_id: TeamId,
    ) -> Result<Vec<StoredAdjustment>, RegistryError> {
        Ok(self
            .staged
            .adjustments
            .iter()
            .filter(|a| a.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn insert_session(
        &mut self,
        token: &str,
        user_id: UserId,
    ) -> Result<(), RegistryError> {
        Arc::make_mut(&mut self.staged.sessions).insert(token.to_string(), user_id);
        Ok(())
    }

    async fn load_session(&mut self, token: &str) -> Result<Option<UserId>, RegistryError> {
        Ok(self.staged.sessions.get(token).copied())
    }

    async fn revoke_session(&mut self, token: &str) -> Result<bool, RegistryError> {
        if !self.staged.sessions.contains_key(token) {
            return Ok(false);
        }
        Ok(Arc::make_mut(&mut self.staged.sessions).remove(token).is_some())
    }

    async fn revoke_user_sessions(&mut self, user_id: UserId) -> Result<u64, RegistryError> {
        let owned = self
            .staged
            .sessions
            .values()
            .filter(|owner| **owner == user_id)
            .count();
        if owned > 0 {
            Arc::make_mut(&mut self.staged.sessions).retain(|_, owner| *owner != user_id);
        }
        Ok(owned as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), RegistryError> {
        let InMemoryRegistryTxn { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) {}
}
