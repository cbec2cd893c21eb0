use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::db::entity::{
    active_sessions, game_state, point_adjustments, submissions, team_members, team_powers, teams,
    users, week_configs,
};
use crate::domain::{
    GameState, Person, PowerId, Role, SubmissionId, SubmissionStatus, Team, TeamId, TeamPower,
    UnknownVariant, UserId, WeekConfig,
};

use crate::registry::error::RegistryError;

use super::{
    NewPointAdjustment, NewSubmission, NewTeamPower, NewUser, RegistryStorage, RegistryTxn,
    StoredAdjustment, StoredSubmission, StoredUser,
};

pub struct SeaOrmRegistryStorage {
    connection: DatabaseConnection,
}

impl SeaOrmRegistryStorage {
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }
}

pub struct SeaOrmRegistryTxn {
    txn: DatabaseTransaction,
}

#[async_trait]
impl RegistryStorage for SeaOrmRegistryStorage {
    async fn begin(&self) -> Result<Box<dyn RegistryTxn + Send>, RegistryError> {
        let txn = self.connection.begin().await?;
        Ok(Box::new(SeaOrmRegistryTxn { txn }))
    }
}

#[async_trait]
impl RegistryTxn for SeaOrmRegistryTxn {
    async fn load_user(&mut self, id: UserId) -> Result<Option<StoredUser>, RegistryError> {
        let record = users::Entity::find_by_id(id).one(&self.txn).await?;
        record.map(user_from_model).transpose()
    }

    async fn load_user_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<StoredUser>, RegistryError> {
        let record = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.txn)
            .await?;
        record.map(user_from_model).transpose()
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<UserId, RegistryError> {
        let model = users::ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(user.role.as_str().to_string()),
            phone: Set(user.phone),
            academic_year: Set(user.academic_year),
            department: Set(user.department),
            is_active: Set(true),
            ..Default::default()
        };
        let inserted = model.insert(&self.txn).await?;
        Ok(inserted.id)
    }

    async fn update_password_hash(
        &mut self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), RegistryError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.txn)
            .await?
            .ok_or(RegistryError::NotFound("user"))?;
        let mut active: users::ActiveModel = model.into();
        active.password_hash = Set(password_hash);
        active.update(&self.txn).await?;
        Ok(())
    }

    async fn list_users_by_role(&mut self, role: Role) -> Result<Vec<StoredUser>, RegistryError> {
        let records = users::Entity::find()
            .filter(users::Column::Role.eq(role.as_str()))
            .order_by_asc(users::Column::Id)
            .all(&self.txn)
            .await?;
        records.into_iter().map(user_from_model).collect()
    }

    async fn load_team(&mut self, id: TeamId) -> Result<Option<Team>, RegistryError> {
        let record = teams::Entity::find_by_id(id).one(&self.txn).await?;
        Ok(record.map(team_from_model))
    }

    async fn load_team_by_leader(
        &mut self,
        leader_id: UserId,
    ) -> Result<Option<Team>, RegistryError> {
        let record = teams::Entity::find()
            .filter(teams::Column::LeaderId.eq(leader_id))
            .one(&self.txn)
            .await?;
        Ok(record.map(team_from_model))
    }

    async fn list_teams(&mut self) -> Result<Vec<Team>, RegistryError> {
        let records = teams::Entity::find()
            .order_by_asc(teams::Column::Id)
            .all(&self.txn)
            .await?;
        Ok(records.into_iter().map(team_from_model).collect())
    }

    async fn last_team_id(&mut self) -> Result<Option<TeamId>, RegistryError> {
        let record = teams::Entity::find()
            .order_by_desc(teams::Column::Id)
            .one(&self.txn)
            .await?;
        Ok(record.map(|model| model.id))
    }

    async fn insert_team(&mut self, team: &Team) -> Result<(), RegistryError> {
        team_to_active(team).insert(&self.txn).await?;
        Ok(())
    }

    async fn update_team(&mut self, team: &Team) -> Result<(), RegistryError> {
        team_to_active(team).update(&self.txn).await?;
        Ok(())
    }

    async fn roll_teams_to_week(&mut self, week_number: i32) -> Result<u64, RegistryError> {
        let result = teams::Entity::update_many()
            .col_expr(teams::Column::WeeklyPoints, Expr::value(0i64))
            .col_expr(teams::Column::WeeklyCapReached, Expr::value(false))
            .col_expr(teams::Column::WeekNumber, Expr::value(week_number))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn insert_member(
        &mut self,
        team_id: TeamId,
        member: &Person,
    ) -> Result<(), RegistryError> {
        let model = team_members::ActiveModel {
            team_id: Set(team_id),
            member_name: Set(member.name.clone()),
            member_email: Set(member.email.clone()),
            academic_year: Set(member.academic_year.clone()),
            department: Set(member.department.clone()),
            ..Default::default()
        };
        model.insert(&self.txn).await?;
        Ok(())
    }

    async fn load_members(&mut self, team_id: TeamId) -> Result<Vec<Person>, RegistryError> {
        let records = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team_id))
            .order_by_asc(team_members::Column::Id)
            .all(&self.txn)
            .await?;
        Ok(records
            .into_iter()
            .map(|m| Person {
                name: m.member_name,
                email: m.member_email,
                phone: None,
                academic_year: m.academic_year,
                department: m.department,
            })
            .collect())
    }

    async fn load_game_state(&mut self) -> Result<GameState, RegistryError> {
        let record = game_state::Entity::find_by_id(game_state::SINGLETON_ID)
            .one(&self.txn)
            .await?;
        Ok(record
            .map(|m| GameState {
                is_active: m.is_active,
                is_paused: m.is_paused,
                current_week: m.current_week,
                registration_open: m.registration_open,
            })
            .unwrap_or_default())
    }

    async fn save_game_state(&mut self, state: &GameState) -> Result<(), RegistryError> {
        let exists = game_state::Entity::find_by_id(game_state::SINGLETON_ID)
            .one(&self.txn)
            .await?
            .is_some();
        let active = game_state::ActiveModel {
            id: Set(game_state::SINGLETON_ID),
            is_active: Set(state.is_active),
            is_paused: Set(state.is_paused),
            current_week: Set(state.current_week),
            registration_open: Set(state.registration_open),
        };
        if exists {
            active.update(&self.txn).await?;
        } else {
            active.insert(&self.txn).await?;
        }
        Ok(())
    }

    async fn list_week_configs(&mut self) -> Result<Vec<WeekConfig>, RegistryError> {
        let records = week_configs::Entity::find()
            .order_by_asc(week_configs::Column::WeekNumber)
            .all(&self.txn)
            .await?;
        Ok(records.into_iter().map(week_from_model).collect())
    }

    async fn load_week_config(
        &mut self,
        week_number: i32,
    ) -> Result<Option<WeekConfig>, RegistryError> {
        let record = week_configs::Entity::find_by_id(week_number)
            .one(&self.txn)
            .await?;
        Ok(record.map(week_from_model))
    }

    async fn upsert_week_config(&mut self, cfg: &WeekConfig) -> Result<(), RegistryError> {
        let exists = week_configs::Entity::find_by_id(cfg.week_number)
            .one(&self.txn)
            .await?
            .is_some();
        let active = week_configs::ActiveModel {
            week_number: Set(cfg.week_number),
            weekly_cap: Set(cfg.weekly_cap),
            curse_power: Set(cfg.curse_power),
            shield_power: Set(cfg.shield_power),
        };
        if exists {
            active.update(&self.txn).await?;
        } else {
            active.insert(&self.txn).await?;
        }
        Ok(())
    }

    async fn insert_power(&mut self, power: NewTeamPower) -> Result<PowerId, RegistryError> {
        let model = team_powers::ActiveModel {
            team_id: Set(power.team_id),
            power_type: Set(power.power_type.as_str().to_string()),
            week_number: Set(power.week_number),
            is_active: Set(power.is_active),
            used_count: Set(power.used_count),
            power_value: Set(power.power_value),
            ..Default::default()
        };
        let inserted = model.insert(&self.txn).await?;
        Ok(inserted.id)
    }

    async fn list_powers(&mut self) -> Result<Vec<TeamPower>, RegistryError> {
        let records = team_powers::Entity::find()
            .order_by_asc(team_powers::Column::Id)
            .all(&self.txn)
            .await?;
        records
            .into_iter()
            .map(|m| {
                Ok(TeamPower {
                    id: m.id,
                    team_id: m.team_id,
                    power_type: m.power_type.parse().map_err(corrupt_row)?,
                    week_number: m.week_number,
                    is_active: m.is_active,
                    used_count: m.used_count,
                    power_value: m.power_value,
                })
            })
            .collect()
    }

    async fn deactivate_powers(&mut self) -> Result<u64, RegistryError> {
        let result = team_powers::Entity::update_many()
            .col_expr(team_powers::Column::IsActive, Expr::value(false))
            .filter(team_powers::Column::IsActive.eq(true))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn insert_submission(
        &mut self,
        submission: NewSubmission,
    ) -> Result<SubmissionId, RegistryError> {
        let model = submissions::ActiveModel {
            team_id: Set(submission.team_id),
            task_name: Set(submission.task_name),
            proof_url: Set(submission.proof_url),
            description: Set(submission.description),
            status: Set(submission.status.as_str().to_string()),
            points_awarded: Set(submission.points_awarded),
            created_at: Set(submission.created_at),
            ..Default::default()
        };
        let inserted = model.insert(&self.txn).await?;
        Ok(inserted.id)
    }

    async fn list_submissions_for_teams(
        &mut self,
        team_ids: &[TeamId],
    ) -> Result<Vec<StoredSubmission>, RegistryError> {
        if team_ids.is_empty() {
            return Ok(Vec::new());
        }
        let records = submissions::Entity::find()
            .filter(submissions::Column::TeamId.is_in(team_ids.iter().copied()))
            .order_by_asc(submissions::Column::Id)
            .all(&self.txn)
            .await?;
        records
            .into_iter()
            .map(|m| {
                Ok(StoredSubmission {
                    id: m.id,
                    team_id: m.team_id,
                    task_name: m.task_name,
                    proof_url: m.proof_url,
                    description: m.description,
                    status: m.status.parse().map_err(corrupt_row)?,
                    points_awarded: m.points_awarded,
                    created_at: m.created_at,
                })
            })
            .collect()
    }

    async fn count_submissions(
        &mut self,
        status: Option<SubmissionStatus>,
    ) -> Result<u64, RegistryError> {
        let mut query = submissions::Entity::find();
        if let Some(status) = status {
            query = query.filter(submissions::Column::Status.eq(status.as_str()));
        }
        Ok(query.count(&self.txn).await?)
    }

    async fn insert_adjustment(&mut self, row: NewPointAdjustment) -> Result<i64, RegistryError> {
        let model = point_adjustments::ActiveModel {
            team_id: Set(row.team_id),
            points_changed: Set(row.points_changed),
            reason: Set(row.reason),
            adjusted_by: Set(row.adjusted_by),
            week_number: Set(row.week_number),
            proof_url: Set(row.proof_url),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let inserted = model.insert(&self.txn).await?;
        Ok(inserted.id)
    }

    async fn list_adjustments(
        &mut self,
        team_id: TeamId,
    ) -> Result<Vec<StoredAdjustment>, RegistryError> {
        let records = point_adjustments::Entity::find()
            .filter(point_adjustments::Column::TeamId.eq(team_id))
            .order_by_asc(point_adjustments::Column::Id)
            .all(&self.txn)
            .await?;
        Ok(records
            .into_iter()
            .map(|m| StoredAdjustment {
                id: m.id,
                team_id: m.team_id,
                points_changed: m.points_changed,
                reason: m.reason,
                adjusted_by: m.adjusted_by,
                week_number: m.week_number,
                proof_url: m.proof_url,
            })
            .collect())
    }

    async fn insert_session(
        &mut self,
        token: &str,
        user_id: UserId,
    ) -> Result<(), RegistryError> {
        let model = active_sessions::ActiveModel {
            token: Set(token.to_string()),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
        };
        model.insert(&self.txn).await?;
        Ok(())
    }

    async fn load_session(&mut self, token: &str) -> Result<Option<UserId>, RegistryError> {
        let record = active_sessions::Entity::find_by_id(token.to_string())
            .one(&self.txn)
            .await?;
        Ok(record.map(|m| m.user_id))
    }

    async fn revoke_session(&mut self, token: &str) -> Result<bool, RegistryError> {
        let result = active_sessions::Entity::delete_by_id(token.to_string())
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn revoke_user_sessions(&mut self, user_id: UserId) -> Result<u64, RegistryError> {
        let result = active_sessions::Entity::delete_many()
            .filter(active_sessions::Column::UserId.eq(user_id))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn commit(self: Box<Self>) -> Result<(), RegistryError> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) {
        let _ = self.txn.rollback().await;
    }
}

fn corrupt_row(err: UnknownVariant) -> RegistryError {
    RegistryError::Database(DbErr::Custom(err.to_string()))
}

fn user_from_model(model: users::Model) -> Result<StoredUser, RegistryError> {
    Ok(StoredUser {
        id: model.id,
        name: model.name,
        email: model.email,
        role: model.role.parse().map_err(corrupt_row)?,
        password_hash: model.password_hash,
        phone: model.phone,
        academic_year: model.academic_year,
        department: model.department,
    })
}

fn team_from_model(model: teams::Model) -> Team {
    Team {
        id: model.id,
        name: model.team_name,
        leader_id: model.leader_id,
        coordinator_id: model.coordinator_id,
        total_points: model.total_points,
        weekly_points: model.weekly_points,
        week_number: model.week_number,
        weekly_cap_reached: model.weekly_cap_reached,
        is_disqualified: model.is_disqualified,
    }
}

fn team_to_active(team: &Team) -> teams::ActiveModel {
    teams::ActiveModel {
        id: Set(team.id),
        team_name: Set(team.name.clone()),
        leader_id: Set(team.leader_id),
        coordinator_id: Set(team.coordinator_id),
        total_points: Set(team.total_points),
        weekly_points: Set(team.weekly_points),
        week_number: Set(team.week_number),
        weekly_cap_reached: Set(team.weekly_cap_reached),
        is_disqualified: Set(team.is_disqualified),
    }
}

fn week_from_model(model: week_configs::Model) -> WeekConfig {
    WeekConfig {
        week_number: model.week_number,
        weekly_cap: model.weekly_cap,
        curse_power: model.curse_power,
        shield_power: model.shield_power,
    }
}
