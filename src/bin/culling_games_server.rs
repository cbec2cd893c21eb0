use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use zeroize::Zeroizing;

use culling_games::config::{DEFAULT_SUPER_ADMIN_EMAIL, MIN_PASSWORD_LEN};
use culling_games::server::{run_server, ServerConfig, SuperAdminSeed};

const DEFAULT_BIND: &str = "127.0.0.1:5000";

#[derive(Debug, Parser)]
#[command(name = "culling_games_server")]
#[command(about = "Launch the Culling Games admin API server", long_about = None)]
struct Args {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "SERVER_BIND", default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// SeaORM-compatible Postgres URL; omit to keep data in memory
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Email of the MASTER account allowed to run global actions
    #[arg(long, env = "SUPER_ADMIN_EMAIL", default_value = DEFAULT_SUPER_ADMIN_EMAIL)]
    super_admin_email: String,

    #[arg(long, env = "SUPER_ADMIN_PASSWORD", hide_env_values = true)]
    super_admin_password: String,

    #[arg(long, env = "SUPER_ADMIN_NAME", default_value = "Super Admin")]
    super_admin_name: String,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "SERVER_LOG_JSON", default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(args.json)?;
    let config = build_config(args)?;
    run_server(config).await
}

fn load_dotenv() {
    let manifest_env = env!("CARGO_MANIFEST_DIR");
    let manifest_env_path = PathBuf::from(manifest_env).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

fn build_config(args: Args) -> Result<ServerConfig> {
    if args.super_admin_password.chars().count() < MIN_PASSWORD_LEN {
        bail!("SUPER_ADMIN_PASSWORD must be at least {MIN_PASSWORD_LEN} characters");
    }
    Ok(ServerConfig {
        bind: args.bind,
        database_url: args.database_url.filter(|url| !url.trim().is_empty()),
        super_admin: SuperAdminSeed {
            name: args.super_admin_name,
            email: args.super_admin_email.trim().to_lowercase(),
            password: Zeroizing::new(args.super_admin_password),
        },
    })
}
