use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::config::AppConfig;
use crate::db::{connect_to_postgres_db, ensure_schema};
use crate::domain::Role;
use crate::registry::{RegistryService, RegistryServiceFactory};

use super::routes::CullingGamesServer;

const LOG_TARGET: &str = "server::bootstrap";

/// The MASTER account created at boot when it does not exist yet.
pub struct SuperAdminSeed {
    pub name: String,
    pub email: String,
    pub password: Zeroizing<String>,
}

pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Postgres URL; `None` keeps everything in process memory.
    pub database_url: Option<String>,
    pub super_admin: SuperAdminSeed,
}

pub async fn build_registry(
    database_url: Option<&str>,
    app: AppConfig,
) -> Result<Arc<dyn RegistryService>> {
    let registry: Arc<dyn RegistryService> = match database_url {
        Some(url) => {
            let db = connect_to_postgres_db(url).await?;
            ensure_schema(&db).await?;
            Arc::new(RegistryServiceFactory::from_sea_orm(db, app))
        }
        None => {
            warn!(
                target: LOG_TARGET,
                "DATABASE_URL not set; registry data lives in memory only"
            );
            Arc::new(RegistryServiceFactory::in_memory(app))
        }
    };
    Ok(registry)
}

pub async fn seed_super_admin(registry: &dyn RegistryService, seed: &SuperAdminSeed) -> Result<()> {
    let (user_id, created) = registry
        .provision_account(&seed.name, &seed.email, &seed.password, Role::Master)
        .await
        .context("failed to provision super admin")?;
    if created {
        info!(target: LOG_TARGET, user_id, email = %seed.email, "super admin created");
    } else {
        info!(target: LOG_TARGET, user_id, email = %seed.email, "super admin already exists");
    }
    Ok(())
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let app = AppConfig::new(config.super_admin.email.clone());
    let registry = build_registry(config.database_url.as_deref(), app).await?;
    seed_super_admin(registry.as_ref(), &config.super_admin).await?;

    let server = CullingGamesServer::new(registry);
    let router = server.into_router();
    let make_service = router.into_make_service();

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let local_addr = listener.local_addr()?;
    info!(
        target: LOG_TARGET,
        %local_addr,
        persistent = config.database_url.is_some(),
        "culling games server listening"
    );

    axum::serve(listener, make_service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target: LOG_TARGET,
            error = %err,
            "failed to install ctrl-c handler"
        );
    }
    info!(target: LOG_TARGET, "shutdown signal received");
}
