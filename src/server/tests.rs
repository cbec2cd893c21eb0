use std::sync::Arc;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use zeroize::Zeroizing;

use crate::config::{AppConfig, DEFAULT_SUPER_ADMIN_EMAIL};
use crate::domain::Role;
use crate::registry::{RegistryService, RegistryServiceFactory};

use super::bootstrap::{seed_super_admin, SuperAdminSeed};
use super::routes::CullingGamesServer;

const ADMIN_PASSWORD: &str = "domain-expansion";

struct TestApp {
    router: Router,
    registry: Arc<dyn RegistryService>,
    token: String,
}

async fn test_app() -> Result<TestApp> {
    let registry: Arc<dyn RegistryService> =
        Arc::new(RegistryServiceFactory::in_memory(AppConfig::default()));
    seed_super_admin(
        registry.as_ref(),
        &SuperAdminSeed {
            name: "Gojo".into(),
            email: DEFAULT_SUPER_ADMIN_EMAIL.into(),
            password: Zeroizing::new(ADMIN_PASSWORD.into()),
        },
    )
    .await?;
    let token = registry
        .login(DEFAULT_SUPER_ADMIN_EMAIL, ADMIN_PASSWORD)
        .await?
        .token;
    let router = CullingGamesServer::new(Arc::clone(&registry)).into_router();
    Ok(TestApp {
        router,
        registry,
        token,
    })
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };
    read(router.clone().oneshot(request).await?).await
}

async fn read(response: axum::response::Response) -> Result<(StatusCode, Value)> {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

fn team_body(name: &str, email: &str) -> Value {
    json!({
        "team_name": name,
        "leader_name": "Yuji",
        "leader_email": email,
        "leader_password": "sukuna123",
        "members": [
            {"name": "Megumi", "email": "megumi@jjk.com"},
            {"name": "Nobara", "email": "nobara@jjk.com"}
        ]
    })
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() -> Result<()> {
    let app = test_app().await?;

    let (status, body) = send(&app.router, Method::GET, "/api/admin/teams", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/api/admin/teams",
        Some("not-a-session"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/api/admin/teams",
        Some(&app.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn public_routes_need_no_session() -> Result<()> {
    let app = test_app().await?;

    let (status, body) = send(&app.router, Method::GET, "/api/game/status", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "NOT_LIVE");
    assert_eq!(body["current_week"], 1);

    let (status, body) =
        send(&app.router, Method::GET, "/api/team/leaderboard", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn login_endpoint_issues_tokens() -> Result<()> {
    let app = test_app().await?;
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": DEFAULT_SUPER_ADMIN_EMAIL, "password": ADMIN_PASSWORD})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "MASTER");
    let token = body["token"].as_str().unwrap_or_default().to_string();
    assert!(!token.is_empty());

    // the fixture session was replaced by this login
    let (status, _) = send(
        &app.router,
        Method::GET,
        "/api/admin/dashboard",
        Some(&app.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, Method::POST, "/api/auth/logout", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": DEFAULT_SUPER_ADMIN_EMAIL, "password": "nope"})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid email or password");
    Ok(())
}

#[tokio::test]
async fn create_team_then_read_detail() -> Result<()> {
    let app = test_app().await?;
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/admin/create-team",
        Some(&app.token),
        Some(team_body("Tokyo", "a@b.com")),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["team_id"], 101);
    assert_eq!(body["leader_email"], "a@b.com");

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/api/admin/team/101",
        Some(&app.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["is_disqualified"], false);

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/api/admin/team/999",
        Some(&app.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "team not found");

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/admin/create-team",
        Some(&app.token),
        Some(team_body("Kyoto", "a@b.com")),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Leader email already exists");
    Ok(())
}

#[tokio::test]
async fn roles_are_enforced() -> Result<()> {
    let app = test_app().await?;
    app.registry
        .provision_account("Yaga", "yaga@jjk.com", "principal1", Role::Master)
        .await?;
    let master = app.registry.login("yaga@jjk.com", "principal1").await?.token;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/admin/change-team-password",
        Some(&master),
        Some(json!({"updates": [{"team_id": "101", "new_password": "abcdef"}]})),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "ACCESS DENIED: Super Admin privileges required."
    );

    let (status, _) = send(
        &app.router,
        Method::PUT,
        "/api/admin/week/set",
        Some(&master),
        Some(json!({"week_number": 2})),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    send(
        &app.router,
        Method::POST,
        "/api/admin/create-team",
        Some(&app.token),
        Some(team_body("Tokyo", "yuji@jjk.com")),
    )
    .await?;
    let leader = app.registry.login("yuji@jjk.com", "sukuna123").await?.token;
    let (status, _) = send(
        &app.router,
        Method::GET,
        "/api/admin/teams",
        Some(&leader),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app.router, Method::GET, "/api/team/me", Some(&leader), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team_name"], "Tokyo");
    Ok(())
}

#[tokio::test]
async fn game_actions_follow_the_state_machine() -> Result<()> {
    let app = test_app().await?;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/game/stop",
        Some(&app.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/game/start",
        Some(&app.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game"]["status"], "LIVE");

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/game/restart",
        Some(&app.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/week-config/set",
        Some(&app.token),
        Some(json!({"week_number": 1, "weekly_cap": 40, "curse_power": 5, "shield_power": 2})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/api/week-config/all",
        Some(&app.token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["weekly_cap"], 40);

    let (status, body) = send(
        &app.router,
        Method::PUT,
        "/api/admin/week/set",
        Some(&app.token),
        Some(json!({"week_number": 2})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["week_number"], 2);
    Ok(())
}

#[tokio::test]
async fn bulk_register_accepts_multipart_csv() -> Result<()> {
    let app = test_app().await?;
    let boundary = "culling-boundary";
    let csv = "Team,Ts,Leader,Email,Phone,Year,Dept\nShibuya,,Yuta,yuta@jjk.com,,3,CSE\n";
    let payload = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"roster.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/admin/bulk-register")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(payload))?;
    let (status, body) = read(app.router.clone().oneshot(request).await?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["teams_created"], 1);
    assert_eq!(body["message"], "Successfully registered 1 teams from CSV.");

    app.registry.login("yuta@jjk.com", "123456").await?;
    Ok(())
}
