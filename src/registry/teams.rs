use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::MIN_PASSWORD_LEN;
use crate::domain::{
    next_team_id, Caller, Person, Role, SubmissionStatus, Team, TeamId, UserId,
    DEFAULT_WEEKLY_CAP,
};

use super::error::RegistryError;
use super::password::hash_password;
use super::storage::{NewPointAdjustment, NewUser, RegistryTxn, StoredSubmission};
use super::types::{
    AdjustPointsRequest, AdjustPointsResponse, AssignedTeam, Contact, CoordinatorOverview,
    CoordinatorRef, DashboardCounts, DisqualifyRequest, LeaderRef, LeaderboardEntry,
    MasterDashboard, MessageResponse, PasswordUpdate, PendingPower, PendingSubmission,
    SubmissionRecord, TeamDetail, TeamSummary,
};
use super::validation::{normalize_email, parse_team_id, validate_adjustment, validate_disqualify};

const LOG_TARGET: &str = "registry::teams";

/// Writes the leader account, the team row and its members. The caller has
/// already validated the input.
pub(super) async fn register_team(
    txn: &mut (dyn RegistryTxn + Send),
    team_name: &str,
    leader: &Person,
    password: &str,
    members: &[Person],
) -> Result<TeamId, RegistryError> {
    let mut leader = leader.clone();
    leader.email = normalize_email(&leader.email);
    if txn.load_user_by_email(&leader.email).await?.is_some() {
        return Err(RegistryError::validation("Leader email already exists"));
    }

    let leader_id = txn
        .insert_user(NewUser::from_person(
            &leader,
            Role::Team,
            hash_password(password),
        ))
        .await?;

    let team_id = next_team_id(txn.last_team_id().await?);
    let week = txn.load_game_state().await?.current_week;
    let mut team = Team::new(team_id, team_name.trim(), leader_id, week);
    team.coordinator_id = least_loaded_coordinator(txn).await?;
    txn.insert_team(&team).await?;

    for member in members {
        txn.insert_member(team_id, member).await?;
    }

    info!(
        target: LOG_TARGET,
        team_id,
        leader_id,
        coordinator_id = ?team.coordinator_id,
        members = members.len(),
        "team registered"
    );
    Ok(team_id)
}

/// Coordinator with the fewest teams, ties to the lowest id.
async fn least_loaded_coordinator(
    txn: &mut (dyn RegistryTxn + Send),
) -> Result<Option<UserId>, RegistryError> {
    let coordinators = txn.list_users_by_role(Role::Coordinator).await?;
    if coordinators.is_empty() {
        return Ok(None);
    }
    let mut load: HashMap<UserId, usize> = HashMap::new();
    for team in txn.list_teams().await? {
        if let Some(id) = team.coordinator_id {
            *load.entry(id).or_default() += 1;
        }
    }
    Ok(coordinators
        .iter()
        .min_by_key(|c| (load.get(&c.id).copied().unwrap_or(0), c.id))
        .map(|c| c.id))
}

pub(super) async fn list_teams(
    txn: &mut (dyn RegistryTxn + Send),
) -> Result<Vec<TeamSummary>, RegistryError> {
    let teams = txn.list_teams().await?;
    let mut result = Vec::with_capacity(teams.len());
    for team in teams {
        let leader = txn.load_user(team.leader_id).await?;
        let coordinator = match team.coordinator_id {
            Some(id) => txn.load_user(id).await?,
            None => None,
        };
        result.push(TeamSummary {
            team_id: team.id,
            team_name: team.name,
            leader: LeaderRef {
                leader_id: team.leader_id,
                leader_name: leader.as_ref().map(|u| u.name.clone()).unwrap_or_default(),
                leader_email: leader.map(|u| u.email).unwrap_or_default(),
            },
            coordinator: coordinator.map(|c| CoordinatorRef {
                coordinator_id: c.id,
                coordinator_name: c.name,
                coordinator_email: c.email,
            }),
            total_points: team.total_points,
            weekly_points: team.weekly_points,
            week_number: team.week_number,
            is_disqualified: team.is_disqualified,
        });
    }
    Ok(result)
}

pub(super) async fn load_team_detail(
    txn: &mut (dyn RegistryTxn + Send),
    team_id: TeamId,
) -> Result<TeamDetail, RegistryError> {
    let team = txn
        .load_team(team_id)
        .await?
        .ok_or(RegistryError::NotFound("team"))?;
    describe_team(txn, team).await
}

pub(super) async fn describe_team(
    txn: &mut (dyn RegistryTxn + Send),
    team: Team,
) -> Result<TeamDetail, RegistryError> {
    let leader = txn
        .load_user(team.leader_id)
        .await?
        .map(|u| u.person())
        .unwrap_or_else(|| Person::new("Unknown", "Unknown"));
    let coordinator = match team.coordinator_id {
        Some(id) => txn.load_user(id).await?.map(|c| Contact {
            name: c.name,
            email: c.email,
        }),
        None => None,
    };
    let members = txn.load_members(team.id).await?;

    Ok(TeamDetail {
        team_id: team.id,
        team_name: team.name,
        leader,
        coordinator,
        members,
        total_points: team.total_points,
        weekly_points: team.weekly_points,
        week_number: team.week_number,
        is_disqualified: team.is_disqualified,
    })
}

pub(super) async fn my_team(
    txn: &mut (dyn RegistryTxn + Send),
    caller: &Caller,
) -> Result<TeamDetail, RegistryError> {
    let team = txn
        .load_team_by_leader(caller.user_id)
        .await?
        .ok_or(RegistryError::NotFound("team"))?;
    describe_team(txn, team).await
}

pub(super) async fn set_disqualified(
    txn: &mut (dyn RegistryTxn + Send),
    team_id: TeamId,
    disqualified: bool,
) -> Result<MessageResponse, RegistryError> {
    let mut team = txn
        .load_team(team_id)
        .await?
        .ok_or(RegistryError::NotFound("team"))?;
    team.is_disqualified = disqualified;
    txn.update_team(&team).await?;

    let verb = if disqualified {
        "disqualified"
    } else {
        "requalified"
    };
    Ok(MessageResponse::new(format!(
        "Team {} {verb} successfully",
        team.name
    )))
}

pub(super) async fn disqualify(
    txn: &mut (dyn RegistryTxn + Send),
    req: &DisqualifyRequest,
) -> Result<MessageResponse, RegistryError> {
    validate_disqualify(req)?;
    let response = set_disqualified(txn, req.team_id, true).await?;
    warn!(
        target: LOG_TARGET,
        team_id = req.team_id,
        reason = %req.reason,
        "team disqualified"
    );
    Ok(response)
}

/// Applies each well-formed override row. Rows that fail are reported in the
/// message; the batch only fails when nothing could be updated.
pub(super) async fn change_passwords(
    txn: &mut (dyn RegistryTxn + Send),
    updates: &[PasswordUpdate],
) -> Result<MessageResponse, RegistryError> {
    if updates.is_empty() {
        return Err(RegistryError::validation("No updates provided."));
    }

    let mut updated: Vec<String> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for update in updates {
        let raw_id = update.team_id.trim();
        if raw_id.is_empty() || update.new_password.is_empty() {
            continue;
        }
        let Some(team_id) = parse_team_id(raw_id) else {
            errors.push(format!("Invalid ID: {raw_id}"));
            continue;
        };
        if update.new_password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(format!("#{team_id} password too short"));
            continue;
        }
        let Some(team) = txn.load_team(team_id).await? else {
            errors.push(format!("#{team_id} not found"));
            continue;
        };
        if txn.load_user(team.leader_id).await?.is_none() {
            errors.push(format!("Leader for #{team_id} not found"));
            continue;
        }

        txn.update_password_hash(team.leader_id, hash_password(&update.new_password))
            .await?;
        let revoked = txn.revoke_user_sessions(team.leader_id).await?;
        info!(
            target: LOG_TARGET,
            team_id,
            revoked_sessions = revoked,
            "leader password overridden"
        );
        updated.push(team_id.to_string());
    }

    if updated.is_empty() {
        return Err(RegistryError::validation(format!(
            "No teams updated. Errors: {}",
            errors.join(", ")
        )));
    }

    let mut message = format!(
        "Passwords successfully changed for Teams: {}. Active sessions terminated.",
        updated.join(", ")
    );
    if !errors.is_empty() {
        message.push_str(&format!(" (Failed rows: {})", errors.join(", ")));
    }
    Ok(MessageResponse::new(message))
}

pub(super) async fn adjust_points(
    txn: &mut (dyn RegistryTxn + Send),
    caller: &Caller,
    req: &AdjustPointsRequest,
) -> Result<AdjustPointsResponse, RegistryError> {
    validate_adjustment(req)?;
    let mut team = txn
        .load_team(req.team_id)
        .await?
        .ok_or(RegistryError::NotFound("team"))?;
    if team.is_disqualified && req.points > 0 {
        return Err(RegistryError::validation(format!(
            "Team {} is disqualified and cannot earn points",
            team.name
        )));
    }

    let weekly_cap = txn
        .load_week_config(team.week_number)
        .await?
        .map(|cfg| cfg.weekly_cap)
        .unwrap_or(DEFAULT_WEEKLY_CAP);
    let applied = team
        .apply_adjustment(req.points, weekly_cap)
        .ok_or_else(|| RegistryError::validation("adjustment would overflow the team's points"))?;
    txn.update_team(&team).await?;
    txn.insert_adjustment(NewPointAdjustment {
        team_id: team.id,
        points_changed: applied,
        reason: req.reason.trim().to_string(),
        adjusted_by: caller.user_id,
        week_number: team.week_number,
        proof_url: req.proof_url.clone(),
    })
    .await?;

    info!(
        target: LOG_TARGET,
        team_id = team.id,
        requested = req.points,
        applied,
        weekly_cap,
        "points adjusted"
    );

    Ok(AdjustPointsResponse {
        message: "Points adjusted successfully".into(),
        points_changed: applied,
        team_total_points: team.total_points,
        team_weekly_points: team.weekly_points,
        proof_url: req.proof_url.clone(),
    })
}

pub(super) async fn dashboard(
    txn: &mut (dyn RegistryTxn + Send),
) -> Result<DashboardCounts, RegistryError> {
    Ok(DashboardCounts {
        total_teams: txn.list_teams().await?.len() as u64,
        total_coordinators: txn.list_users_by_role(Role::Coordinator).await?.len() as u64,
        total_masters: txn.list_users_by_role(Role::Master).await?.len() as u64,
        total_players: txn.list_users_by_role(Role::Team).await?.len() as u64,
    })
}

pub(super) async fn master_dashboard(
    txn: &mut (dyn RegistryTxn + Send),
) -> Result<MasterDashboard, RegistryError> {
    let counts = dashboard(txn).await?;
    let active_powers = txn
        .list_powers()
        .await?
        .iter()
        .filter(|p| p.is_active)
        .count() as u64;
    Ok(MasterDashboard {
        counts,
        total_submissions: txn.count_submissions(None).await?,
        pending_submissions: txn
            .count_submissions(Some(SubmissionStatus::Pending))
            .await?,
        active_powers,
    })
}

pub(super) async fn coordinators(
    txn: &mut (dyn RegistryTxn + Send),
) -> Result<Vec<CoordinatorOverview>, RegistryError> {
    let teams = txn.list_teams().await?;
    let coordinators = txn.list_users_by_role(Role::Coordinator).await?;
    Ok(coordinators
        .into_iter()
        .map(|coord| CoordinatorOverview {
            assigned_teams: teams
                .iter()
                .filter(|t| t.coordinator_id == Some(coord.id))
                .map(|t| AssignedTeam {
                    team_id: t.id,
                    team_name: t.name.clone(),
                    total_points: t.total_points,
                })
                .collect(),
            coordinator_id: coord.id,
            name: coord.name,
            email: coord.email,
        })
        .collect())
}

async fn assigned_teams(
    txn: &mut (dyn RegistryTxn + Send),
    coordinator_id: UserId,
) -> Result<Vec<Team>, RegistryError> {
    Ok(txn
        .list_teams()
        .await?
        .into_iter()
        .filter(|t| t.coordinator_id == Some(coordinator_id))
        .collect())
}

pub(super) async fn coordinator_teams(
    txn: &mut (dyn RegistryTxn + Send),
    caller: &Caller,
) -> Result<Vec<TeamDetail>, RegistryError> {
    let teams = assigned_teams(txn, caller.user_id).await?;
    let mut result = Vec::with_capacity(teams.len());
    for team in teams {
        result.push(describe_team(txn, team).await?);
    }
    Ok(result)
}

async fn coordinator_submissions(
    txn: &mut (dyn RegistryTxn + Send),
    caller: &Caller,
) -> Result<(HashMap<TeamId, String>, Vec<StoredSubmission>), RegistryError> {
    let teams = assigned_teams(txn, caller.user_id).await?;
    let ids: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
    let submissions = txn.list_submissions_for_teams(&ids).await?;
    let names = teams.into_iter().map(|t| (t.id, t.name)).collect();
    Ok((names, submissions))
}

/// Reviewed submissions of the caller's teams, newest first.
pub(super) async fn coordinator_history(
    txn: &mut (dyn RegistryTxn + Send),
    caller: &Caller,
) -> Result<Vec<SubmissionRecord>, RegistryError> {
    let (names, submissions) = coordinator_submissions(txn, caller).await?;
    let mut history: Vec<SubmissionRecord> = submissions
        .into_iter()
        .filter(|s| s.status.is_reviewed())
        .map(|s| SubmissionRecord {
            id: s.id,
            team_name: names.get(&s.team_id).cloned().unwrap_or_default(),
            task_name: s.task_name,
            created_at: s.created_at,
            status: s.status.as_str().to_string(),
            points_awarded: s.points_awarded,
        })
        .collect();
    history.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(history)
}

pub(super) async fn coordinator_pending(
    txn: &mut (dyn RegistryTxn + Send),
    caller: &Caller,
) -> Result<Vec<PendingSubmission>, RegistryError> {
    let (names, submissions) = coordinator_submissions(txn, caller).await?;
    let mut pending: Vec<PendingSubmission> = submissions
        .into_iter()
        .filter(|s| !s.status.is_reviewed())
        .map(|s| PendingSubmission {
            submission_id: s.id,
            team_name: names.get(&s.team_id).cloned().unwrap_or_default(),
            task_name: s.task_name,
            proof_url: s.proof_url,
            description: s.description,
            created_at: s.created_at,
        })
        .collect();
    pending.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then(a.submission_id.cmp(&b.submission_id))
    });
    Ok(pending)
}

pub(super) async fn pending_powers(
    txn: &mut (dyn RegistryTxn + Send),
) -> Result<Vec<PendingPower>, RegistryError> {
    let names: HashMap<TeamId, String> = txn
        .list_teams()
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();
    Ok(txn
        .list_powers()
        .await?
        .into_iter()
        .filter(|p| p.is_pending())
        .filter_map(|p| {
            names.get(&p.team_id).map(|team_name| PendingPower {
                power_id: p.id,
                team_name: team_name.clone(),
                power_type: p.power_type,
                week_number: p.week_number,
            })
        })
        .collect())
}

pub(super) async fn export_teams(
    txn: &mut (dyn RegistryTxn + Send),
) -> Result<Vec<TeamDetail>, RegistryError> {
    let teams = txn.list_teams().await?;
    let mut details = Vec::with_capacity(teams.len());
    for team in teams {
        details.push(describe_team(txn, team).await?);
    }
    info!(
        target: LOG_TARGET,
        total_teams = details.len(),
        at = %Utc::now(),
        "export prepared"
    );
    Ok(details)
}

/// Eligible teams by total points, then weekly points, then id.
pub(super) async fn leaderboard(
    txn: &mut (dyn RegistryTxn + Send),
) -> Result<Vec<LeaderboardEntry>, RegistryError> {
    let week = txn.load_game_state().await?.current_week;
    let weekly_cap = txn
        .load_week_config(week)
        .await?
        .map(|cfg| cfg.weekly_cap)
        .unwrap_or(DEFAULT_WEEKLY_CAP);

    let mut teams: Vec<Team> = txn
        .list_teams()
        .await?
        .into_iter()
        .filter(|t| !t.is_disqualified)
        .collect();
    teams.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then(b.weekly_points.cmp(&a.weekly_points))
            .then(a.id.cmp(&b.id))
    });

    let mut entries = Vec::with_capacity(teams.len());
    for (idx, team) in teams.into_iter().enumerate() {
        let leader_email = txn
            .load_user(team.leader_id)
            .await?
            .map(|u| u.email)
            .unwrap_or_default();
        entries.push(LeaderboardEntry {
            rank: idx as u32 + 1,
            team_id: team.id,
            team_name: team.name,
            leader_email,
            weekly_points: team.weekly_points,
            weekly_cap,
            total_points: team.total_points,
        });
    }
    Ok(entries)
}
