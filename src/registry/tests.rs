use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};

use super::storage::{
    InMemoryRegistryStorage, NewPointAdjustment, NewSubmission, NewTeamPower, RegistryStorage,
};
use super::types::{
    AdjustPointsRequest, CreateTeamRequest, CsvUpload, DisqualifyRequest, MemberInput, PasswordUpdate,
};
use super::{RegistryError, RegistryService, RegistryServiceFactory};
use crate::config::{AppConfig, DEFAULT_SUPER_ADMIN_EMAIL};
use crate::domain::{
    Caller, GameAction, GamePhase, PowerKind, Role, SubmissionStatus, TeamId, WeekConfig,
    MAX_POINT_ADJUSTMENT,
};

const PASSWORD: &str = "password1";

struct Fixture {
    service: RegistryServiceFactory,
    storage: InMemoryRegistryStorage,
    super_admin: Caller,
}

async fn fixture() -> Result<Fixture> {
    let storage = InMemoryRegistryStorage::new();
    let service = RegistryServiceFactory::new(
        Arc::new(storage.clone()) as Arc<dyn RegistryStorage>,
        AppConfig::default(),
    );
    let super_admin = account(&service, "Gojo", DEFAULT_SUPER_ADMIN_EMAIL, Role::Master).await?;
    Ok(Fixture {
        service,
        storage,
        super_admin,
    })
}

async fn account(
    service: &RegistryServiceFactory,
    name: &str,
    email: &str,
    role: Role,
) -> Result<Caller> {
    let (user_id, _) = service
        .provision_account(name, email, PASSWORD, role)
        .await?;
    Ok(Caller {
        user_id,
        name: name.into(),
        email: email.into(),
        role,
    })
}

fn team_request(team_name: &str, leader_email: &str, members: usize) -> CreateTeamRequest {
    CreateTeamRequest {
        team_name: team_name.into(),
        leader_name: format!("{team_name} Leader"),
        leader_email: leader_email.into(),
        leader_password: "leader123".into(),
        leader_phone: None,
        members: (0..members)
            .map(|i| MemberInput {
                name: format!("Member {i}"),
                email: format!("member{i}@{team_name}.com").to_lowercase(),
                ..Default::default()
            })
            .collect(),
    }
}

async fn create_team(fx: &Fixture, name: &str) -> Result<TeamId> {
    let email = format!("{}@leaders.com", name.to_lowercase());
    let response = fx
        .service
        .create_team(&fx.super_admin, team_request(name, &email, 2))
        .await?;
    Ok(response.team_id)
}

fn upload(file_name: &str, body: &str) -> CsvUpload {
    CsvUpload {
        file_name: Some(file_name.into()),
        bytes: body.as_bytes().to_vec(),
    }
}

async fn adjust(fx: &Fixture, team_id: TeamId, points: i64) -> Result<i64, RegistryError> {
    fx.service
        .adjust_points(
            &fx.super_admin,
            AdjustPointsRequest {
                team_id,
                points,
                reason: "manual review".into(),
                proof_url: None,
            },
        )
        .await
        .map(|resp| resp.points_changed)
}

#[tokio::test]
async fn team_ids_start_at_101_and_coordinators_are_balanced() -> Result<()> {
    let fx = fixture().await?;
    let nanami = account(&fx.service, "Nanami", "nanami@jjk.com", Role::Coordinator).await?;
    let utahime = account(&fx.service, "Utahime", "utahime@jjk.com", Role::Coordinator).await?;

    let first = create_team(&fx, "Tokyo").await?;
    let second = create_team(&fx, "Kyoto").await?;
    let third = create_team(&fx, "Sendai").await?;
    assert_eq!((first, second, third), (101, 102, 103));

    let teams = fx.service.list_teams(&fx.super_admin).await?;
    let coordinator_of = |id: TeamId| {
        teams
            .iter()
            .find(|t| t.team_id == id)
            .and_then(|t| t.coordinator.as_ref())
            .map(|c| c.coordinator_id)
    };
    assert_eq!(coordinator_of(101), Some(nanami.user_id));
    assert_eq!(coordinator_of(102), Some(utahime.user_id));
    assert_eq!(coordinator_of(103), Some(nanami.user_id));

    let overview = fx.service.coordinators(&fx.super_admin).await?;
    assert_eq!(overview[0].assigned_teams.len(), 2);
    assert_eq!(overview[1].assigned_teams.len(), 1);
    Ok(())
}

#[tokio::test]
async fn create_team_keeps_only_submitted_members() -> Result<()> {
    let fx = fixture().await?;
    let response = fx
        .service
        .create_team(&fx.super_admin, team_request("Tokyo", "A@B.com", 2))
        .await?;
    assert_eq!(response.leader_email, "a@b.com");

    let detail = fx
        .service
        .team_detail(&fx.super_admin, response.team_id)
        .await?;
    assert_eq!(detail.members.len(), 2);
    assert_eq!(detail.leader.email, "a@b.com");
    assert!(detail.coordinator.is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_leader_email_is_rejected() -> Result<()> {
    let fx = fixture().await?;
    create_team(&fx, "Tokyo").await?;
    let err = fx
        .service
        .create_team(
            &fx.super_admin,
            team_request("Other", "TOKYO@leaders.com", 0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(ref msg) if msg == "Leader email already exists"));

    // nothing from the failed attempt was kept
    assert_eq!(fx.service.list_teams(&fx.super_admin).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn team_role_cannot_create_teams() -> Result<()> {
    let fx = fixture().await?;
    let player = account(&fx.service, "Yuji", "yuji@jjk.com", Role::Team).await?;
    let err = fx
        .service
        .create_team(&player, team_request("Tokyo", "a@b.com", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Forbidden(_)));

    let coordinator = account(&fx.service, "Ijichi", "ijichi@jjk.com", Role::Coordinator).await?;
    fx.service
        .create_team(&coordinator, team_request("Tokyo", "a@b.com", 0))
        .await?;
    Ok(())
}

#[tokio::test]
async fn new_login_revokes_previous_session() -> Result<()> {
    let fx = fixture().await?;
    let first = fx
        .service
        .login(DEFAULT_SUPER_ADMIN_EMAIL, PASSWORD)
        .await?;
    let caller = fx.service.authenticate(&first.token).await?;
    assert_eq!(caller.user_id, fx.super_admin.user_id);

    let second = fx
        .service
        .login(" SuperAdmin@Culling.Games ", PASSWORD)
        .await?;
    assert!(matches!(
        fx.service.authenticate(&first.token).await,
        Err(RegistryError::Unauthorized)
    ));

    fx.service.logout(&second.token).await?;
    assert!(matches!(
        fx.service.authenticate(&second.token).await,
        Err(RegistryError::Unauthorized)
    ));

    assert!(matches!(
        fx.service.login(DEFAULT_SUPER_ADMIN_EMAIL, "wrong-password").await,
        Err(RegistryError::InvalidCredentials)
    ));
    Ok(())
}

#[tokio::test]
async fn bulk_register_imports_rows_and_reports_failures() -> Result<()> {
    let fx = fixture().await?;
    let csv = "Team,Ts,Leader,Email,Phone,Year,Dept,M1,M1 Email,M1 Year,M1 Dept\n\
               Domain,,Yuji,yuji@jjk.com,9876543210,2,CSE,Megumi,megumi@jjk.com,2,CSE\n\
               Expansion,,Maki,maki@jjk.com,,3,ECE\n\
               ,,,,\n\
               Clone,,Yuta,yuji@jjk.com,,,\n";

    let report = fx
        .service
        .bulk_register(&fx.super_admin, Some(upload("roster.csv", csv)))
        .await?;
    assert_eq!(report.teams_created, 2);
    assert_eq!(report.message, "Successfully registered 2 teams from CSV.");
    assert_eq!(
        report.errors,
        vec!["Row 5: Email yuji@jjk.com already exists. Skipped.".to_string()]
    );

    fx.service.login("yuji@jjk.com", "9876543210").await?;
    fx.service.login("maki@jjk.com", "123456").await?;

    let detail = fx.service.team_detail(&fx.super_admin, 101).await?;
    assert_eq!(detail.team_name, "Domain");
    assert_eq!(detail.members.len(), 1);
    assert_eq!(detail.leader.department.as_deref(), Some("CSE"));
    Ok(())
}

#[tokio::test]
async fn bulk_register_is_reserved_for_super_admin() -> Result<()> {
    let fx = fixture().await?;
    let master = account(&fx.service, "Yaga", "yaga@jjk.com", Role::Master).await?;
    let err = fx
        .service
        .bulk_register(&master, Some(upload("roster.csv", "Team\n")))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Forbidden(_)));

    let err = fx
        .service
        .bulk_register(&fx.super_admin, Some(upload("roster.xlsx", "Team\n")))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));

    let err = fx
        .service
        .bulk_register(&fx.super_admin, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(ref msg) if msg == "No CSV file uploaded"));
    Ok(())
}

#[tokio::test]
async fn password_override_reports_row_failures() -> Result<()> {
    let fx = fixture().await?;
    let team_id = create_team(&fx, "Tokyo").await?;
    let session = fx.service.login("tokyo@leaders.com", "leader123").await?;

    let message = fx
        .service
        .change_team_passwords(
            &fx.super_admin,
            vec![
                PasswordUpdate {
                    team_id: team_id.to_string(),
                    new_password: "newpass1".into(),
                },
                PasswordUpdate {
                    team_id: "abc".into(),
                    new_password: "whatever1".into(),
                },
                PasswordUpdate {
                    team_id: "999".into(),
                    new_password: "another1".into(),
                },
                PasswordUpdate {
                    team_id: String::new(),
                    new_password: String::new(),
                },
            ],
        )
        .await?
        .message;
    assert!(message.contains("Teams: 101"), "{message}");
    assert!(message.contains("Invalid ID: abc"), "{message}");
    assert!(message.contains("#999 not found"), "{message}");

    assert!(matches!(
        fx.service.authenticate(&session.token).await,
        Err(RegistryError::Unauthorized)
    ));
    fx.service.login("tokyo@leaders.com", "newpass1").await?;

    let err = fx
        .service
        .change_team_passwords(&fx.super_admin, Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));

    let err = fx
        .service
        .change_team_passwords(
            &fx.super_admin,
            vec![PasswordUpdate {
                team_id: "999".into(),
                new_password: "another1".into(),
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(ref msg) if msg.starts_with("No teams updated")));
    Ok(())
}

#[tokio::test]
async fn positive_adjustments_respect_weekly_cap() -> Result<()> {
    let fx = fixture().await?;
    let team_id = create_team(&fx, "Tokyo").await?;

    assert_eq!(adjust(&fx, team_id, 20).await?, 20);
    assert_eq!(adjust(&fx, team_id, 20).await?, 10);
    assert_eq!(adjust(&fx, team_id, 5).await?, 0);
    assert_eq!(adjust(&fx, team_id, -5).await?, -5);

    let detail = fx.service.team_detail(&fx.super_admin, team_id).await?;
    assert_eq!(detail.total_points, 25);
    assert_eq!(detail.weekly_points, 25);
    Ok(())
}

#[tokio::test]
async fn out_of_range_adjustments_are_rejected_and_not_recorded() -> Result<()> {
    let fx = fixture().await?;
    let team_id = create_team(&fx, "Tokyo").await?;
    assert_eq!(adjust(&fx, team_id, 20).await?, 20);

    for points in [i64::MIN, i64::MAX, MAX_POINT_ADJUSTMENT + 1, -MAX_POINT_ADJUSTMENT - 1] {
        assert!(matches!(
            adjust(&fx, team_id, points).await,
            Err(RegistryError::Validation(_))
        ));
    }
    assert_eq!(
        adjust(&fx, team_id, -MAX_POINT_ADJUSTMENT).await?,
        -MAX_POINT_ADJUSTMENT
    );

    let detail = fx.service.team_detail(&fx.super_admin, team_id).await?;
    assert_eq!(detail.total_points, 20 - MAX_POINT_ADJUSTMENT);

    let mut txn = fx.storage.begin().await?;
    let trail = txn.list_adjustments(team_id).await?;
    txn.rollback().await;
    let booked: Vec<i64> = trail.iter().map(|a| a.points_changed).collect();
    assert_eq!(booked, vec![20, -MAX_POINT_ADJUSTMENT]);
    assert!(trail
        .iter()
        .all(|a| a.reason == "manual review" && a.adjusted_by == fx.super_admin.user_id));
    Ok(())
}

#[tokio::test]
async fn rolled_back_writes_never_reach_shared_state() -> Result<()> {
    let fx = fixture().await?;
    let team_id = create_team(&fx, "Tokyo").await?;

    let mut txn = fx.storage.begin().await?;
    txn.insert_adjustment(NewPointAdjustment {
        team_id,
        points_changed: 7,
        reason: "staged".into(),
        adjusted_by: fx.super_admin.user_id,
        week_number: 1,
        proof_url: None,
    })
    .await?;
    txn.insert_session("staged-token", fx.super_admin.user_id).await?;
    assert_eq!(txn.list_adjustments(team_id).await?.len(), 1);
    txn.rollback().await;

    let mut txn = fx.storage.begin().await?;
    assert!(txn.list_adjustments(team_id).await?.is_empty());
    assert_eq!(txn.load_session("staged-token").await?, None);
    assert!(!txn.revoke_session("staged-token").await?);
    let id = txn
        .insert_adjustment(NewPointAdjustment {
            team_id,
            points_changed: 3,
            reason: "kept".into(),
            adjusted_by: fx.super_admin.user_id,
            week_number: 1,
            proof_url: Some("https://proof.example/3".into()),
        })
        .await?;
    txn.commit().await?;

    let mut txn = fx.storage.begin().await?;
    let trail = txn.list_adjustments(team_id).await?;
    txn.rollback().await;
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].id, id);
    assert_eq!(trail[0].reason, "kept");
    assert_eq!(trail[0].proof_url.as_deref(), Some("https://proof.example/3"));
    Ok(())
}

#[tokio::test]
async fn disqualified_teams_cannot_gain_points() -> Result<()> {
    let fx = fixture().await?;
    let team_id = create_team(&fx, "Tokyo").await?;
    adjust(&fx, team_id, 10).await?;

    let err = fx
        .service
        .disqualify_team(
            &fx.super_admin,
            DisqualifyRequest {
                team_id,
                reason: " ".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));

    fx.service
        .disqualify_team(
            &fx.super_admin,
            DisqualifyRequest {
                team_id,
                reason: "rule breach".into(),
            },
        )
        .await?;
    assert!(matches!(
        adjust(&fx, team_id, 5).await,
        Err(RegistryError::Validation(_))
    ));
    assert_eq!(adjust(&fx, team_id, -3).await?, -3);

    fx.service.requalify_team(&fx.super_admin, team_id).await?;
    assert_eq!(adjust(&fx, team_id, 3).await?, 3);
    Ok(())
}

#[tokio::test]
async fn leaderboard_orders_eligible_teams() -> Result<()> {
    let fx = fixture().await?;
    fx.service
        .set_week_config(
            &fx.super_admin,
            WeekConfig {
                week_number: 1,
                weekly_cap: 40,
                curse_power: 5,
                shield_power: 3,
            },
        )
        .await?;

    let a = create_team(&fx, "Alpha").await?;
    let b = create_team(&fx, "Bravo").await?;
    let c = create_team(&fx, "Charlie").await?;
    adjust(&fx, a, 10).await?;
    adjust(&fx, b, 20).await?;
    adjust(&fx, c, 20).await?;

    let board = fx.service.leaderboard().await?;
    let order: Vec<(u32, TeamId)> = board.iter().map(|e| (e.rank, e.team_id)).collect();
    assert_eq!(order, vec![(1, b), (2, c), (3, a)]);
    assert!(board.iter().all(|e| e.weekly_cap == 40));
    assert_eq!(board[0].leader_email, "bravo@leaders.com");

    fx.service
        .disqualify_team(
            &fx.super_admin,
            DisqualifyRequest {
                team_id: c,
                reason: "cheating".into(),
            },
        )
        .await?;
    let board = fx.service.leaderboard().await?;
    assert_eq!(board.len(), 2);
    assert_eq!(board[1].rank, 2);
    assert_eq!(board[1].team_id, a);
    Ok(())
}

#[tokio::test]
async fn game_lifecycle_and_winner() -> Result<()> {
    let fx = fixture().await?;
    let a = create_team(&fx, "Alpha").await?;
    let b = create_team(&fx, "Bravo").await?;
    adjust(&fx, a, 15).await?;
    adjust(&fx, b, 25).await?;
    fx.service
        .disqualify_team(
            &fx.super_admin,
            DisqualifyRequest {
                team_id: b,
                reason: "late".into(),
            },
        )
        .await?;

    assert_eq!(fx.service.game_status().await?.status, GamePhase::NotLive);
    assert!(matches!(
        fx.service
            .apply_game_action(&fx.super_admin, GameAction::Pause)
            .await,
        Err(RegistryError::Conflict(_))
    ));

    let started = fx
        .service
        .apply_game_action(&fx.super_admin, GameAction::Start)
        .await?;
    assert_eq!(started.game.status, GamePhase::Live);
    assert!(started.winner.is_none());

    fx.service
        .apply_game_action(&fx.super_admin, GameAction::Pause)
        .await?;
    assert_eq!(fx.service.game_status().await?.status, GamePhase::Paused);

    let stopped = fx
        .service
        .apply_game_action(&fx.super_admin, GameAction::Stop)
        .await?;
    assert_eq!(stopped.game.status, GamePhase::NotLive);
    assert_eq!(stopped.winner.as_deref(), Some("Alpha"));

    let coordinator = account(&fx.service, "Nanami", "nanami@jjk.com", Role::Coordinator).await?;
    assert!(matches!(
        fx.service
            .apply_game_action(&coordinator, GameAction::Start)
            .await,
        Err(RegistryError::Forbidden(_))
    ));
    Ok(())
}

#[tokio::test]
async fn week_change_resets_points_and_powers() -> Result<()> {
    let fx = fixture().await?;
    let team_id = create_team(&fx, "Tokyo").await?;
    adjust(&fx, team_id, 12).await?;

    let mut txn = fx.storage.begin().await?;
    txn.insert_power(NewTeamPower {
        team_id,
        power_type: PowerKind::Shield,
        week_number: 1,
        is_active: true,
        used_count: 0,
        power_value: 3,
    })
    .await?;
    txn.commit().await?;

    let master = account(&fx.service, "Yaga", "yaga@jjk.com", Role::Master).await?;
    assert!(matches!(
        fx.service.change_week(&master, 2).await,
        Err(RegistryError::Forbidden(_))
    ));
    assert!(matches!(
        fx.service.change_week(&fx.super_admin, 0).await,
        Err(RegistryError::Validation(_))
    ));

    let response = fx.service.change_week(&fx.super_admin, 2).await?;
    assert_eq!(response.teams_reset, 1);
    assert_eq!(response.powers_deactivated, 1);

    let detail = fx.service.team_detail(&fx.super_admin, team_id).await?;
    assert_eq!(detail.week_number, 2);
    assert_eq!(detail.weekly_points, 0);
    assert_eq!(detail.total_points, 12);
    assert_eq!(fx.service.game_status().await?.state.current_week, 2);

    let dashboard = fx.service.master_dashboard(&fx.super_admin).await?;
    assert_eq!(dashboard.active_powers, 0);
    Ok(())
}

#[tokio::test]
async fn week_configs_are_upserted_and_validated() -> Result<()> {
    let fx = fixture().await?;
    let mut cfg = WeekConfig::default_for(3);
    fx.service.set_week_config(&fx.super_admin, cfg).await?;
    cfg.weekly_cap = 55;
    fx.service.set_week_config(&fx.super_admin, cfg).await?;

    let configs = fx.service.week_configs(&fx.super_admin).await?;
    assert_eq!(configs, vec![cfg]);

    cfg.weekly_cap = -1;
    assert!(matches!(
        fx.service.set_week_config(&fx.super_admin, cfg).await,
        Err(RegistryError::Validation(_))
    ));
    Ok(())
}

#[tokio::test]
async fn coordinator_sees_history_and_pending_for_own_teams() -> Result<()> {
    let fx = fixture().await?;
    let coordinator = account(&fx.service, "Nanami", "nanami@jjk.com", Role::Coordinator).await?;
    let team_id = create_team(&fx, "Tokyo").await?;

    let now = Utc::now();
    let mut txn = fx.storage.begin().await?;
    for (task, status, age) in [
        ("Curtain", SubmissionStatus::Approved, 3),
        ("Barrier", SubmissionStatus::Rejected, 1),
        ("Exorcism", SubmissionStatus::Pending, 2),
    ] {
        txn.insert_submission(NewSubmission {
            team_id,
            task_name: task.into(),
            proof_url: Some(format!("https://proof.example/{task}")),
            description: None,
            status,
            points_awarded: (status == SubmissionStatus::Approved).then_some(10),
            created_at: now - Duration::hours(age),
        })
        .await?;
    }
    txn.insert_power(NewTeamPower {
        team_id,
        power_type: PowerKind::Curse,
        week_number: 1,
        is_active: false,
        used_count: 0,
        power_value: 0,
    })
    .await?;
    txn.commit().await?;

    let history = fx.service.coordinator_history(&coordinator).await?;
    let tasks: Vec<&str> = history.iter().map(|s| s.task_name.as_str()).collect();
    assert_eq!(tasks, vec!["Barrier", "Curtain"]);
    assert_eq!(history[1].status, "APPROVED");
    assert_eq!(history[1].team_name, "Tokyo");

    let pending = fx.service.coordinator_pending(&coordinator).await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].task_name, "Exorcism");

    let teams = fx.service.coordinator_teams(&coordinator).await?;
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].members.len(), 2);

    let powers = fx.service.pending_powers(&fx.super_admin).await?;
    assert_eq!(powers.len(), 1);
    assert_eq!(powers[0].power_type, PowerKind::Curse);

    let dashboard = fx.service.master_dashboard(&fx.super_admin).await?;
    assert_eq!(dashboard.total_submissions, 3);
    assert_eq!(dashboard.pending_submissions, 1);
    assert_eq!(dashboard.counts.total_teams, 1);
    assert_eq!(dashboard.counts.total_coordinators, 1);
    Ok(())
}

#[tokio::test]
async fn leaders_read_their_own_team() -> Result<()> {
    let fx = fixture().await?;
    let team_id = create_team(&fx, "Tokyo").await?;
    let session = fx.service.login("tokyo@leaders.com", "leader123").await?;
    let leader = fx.service.authenticate(&session.token).await?;
    assert_eq!(leader.role, Role::Team);

    let mine = fx.service.my_team(&leader).await?;
    assert_eq!(mine.team_id, team_id);

    assert!(matches!(
        fx.service.my_team(&fx.super_admin).await,
        Err(RegistryError::Forbidden(_))
    ));
    Ok(())
}

#[tokio::test]
async fn export_requires_super_admin() -> Result<()> {
    let fx = fixture().await?;
    create_team(&fx, "Tokyo").await?;
    create_team(&fx, "Kyoto").await?;

    let bundle = fx.service.export_data(&fx.super_admin).await?;
    assert_eq!(bundle.total_teams, 2);
    assert_eq!(bundle.teams[1].team_name, "Kyoto");

    let master = account(&fx.service, "Yaga", "yaga@jjk.com", Role::Master).await?;
    assert!(matches!(
        fx.service.export_data(&master).await,
        Err(RegistryError::Forbidden(_))
    ));
    Ok(())
}

/// Runs against Postgres only when `DATABASE_URL` is set.
#[tokio::test]
async fn sea_orm_storage_round_trip() -> Result<()> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        return Ok(());
    };
    let conn = crate::db::connect_to_postgres_db(&url).await?;
    crate::db::ensure_schema(&conn).await?;

    let tag = uuid::Uuid::new_v4().simple().to_string();
    let admin_email = format!("admin-{tag}@culling.games");
    let service = RegistryServiceFactory::from_sea_orm(conn, AppConfig::new(admin_email.clone()));
    let admin = account(&service, "Gojo", &admin_email, Role::Master).await?;

    let leader_email = format!("leader-{tag}@jjk.com");
    let created = service
        .create_team(&admin, team_request(&format!("t{tag}"), &leader_email, 1))
        .await?;
    let detail = service.team_detail(&admin, created.team_id).await?;
    assert_eq!(detail.members.len(), 1);
    assert_eq!(detail.leader.email, leader_email);

    let session = service.login(&leader_email, "leader123").await?;
    let leader = service.authenticate(&session.token).await?;
    assert_eq!(service.my_team(&leader).await?.team_id, created.team_id);
    Ok(())
}
