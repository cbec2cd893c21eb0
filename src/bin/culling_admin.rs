use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use culling_games::client::display::{progress_percent, status_label, winner_notice};
use culling_games::client::{
    ApiClient, ClientConfig, ClientError, Confirm, CreateTeamForm, FileTokenStore, FixedAnswer,
    LoginRedirect, MemberSlot, PasswordOverrideRow, DEFAULT_API_URL,
};
use culling_games::domain::{GameAction, TeamId, WeekConfig, MAX_EXTRA_MEMBERS};
use culling_games::registry::types::AdjustPointsRequest;

const DEFAULT_SESSION_FILE: &str = ".culling_session.json";

#[derive(Parser)]
#[command(author, version, about = "Culling Games admin console", long_about = None)]
struct Cli {
    /// API base URL, including the `/api` prefix
    #[arg(long, env = "CULLING_API_URL", default_value = DEFAULT_API_URL, global = true)]
    base_url: String,

    /// Where the session token is kept between invocations
    #[arg(long, env = "CULLING_SESSION_FILE", default_value = DEFAULT_SESSION_FILE, global = true)]
    session_file: PathBuf,

    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    /// Pretty-print JSON output
    #[arg(long, default_value_t = true, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CULLING_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Revoke the stored session
    Logout,
    /// Show the stored identity
    Whoami,
    #[command(subcommand)]
    Team(TeamCommand),
    /// Register teams from a roster CSV (Super Admin)
    Bulk {
        #[arg(long)]
        file: PathBuf,
    },
    /// Entity counts; `--master` adds submission and power totals
    Dashboard {
        #[arg(long)]
        master: bool,
    },
    /// Coordinators with their assigned teams
    Coordinators,
    #[command(subcommand)]
    Coordinator(CoordinatorCommand),
    /// Powers awaiting use
    Powers,
    /// Public standings
    Leaderboard,
    /// Write a full JSON backup into a directory (Super Admin)
    Export {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    #[command(subcommand)]
    Game(GameCommand),
    #[command(subcommand)]
    Week(WeekCommand),
}

#[derive(Subcommand)]
enum TeamCommand {
    List,
    Show {
        #[arg(long)]
        id: TeamId,
    },
    /// The signed-in leader's own team
    Me,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        leader_name: String,
        #[arg(long)]
        leader_email: String,
        #[arg(long)]
        leader_password: String,
        #[arg(long, default_value = "")]
        leader_phone: String,
        /// Member as `Name,email`; give 2 to 4
        #[arg(long = "member", value_parser = parse_member)]
        members: Vec<MemberSlot>,
    },
    Disqualify {
        #[arg(long)]
        id: TeamId,
        #[arg(long, default_value = "")]
        reason: String,
    },
    Requalify {
        #[arg(long)]
        id: TeamId,
    },
    /// Override leader passwords as `TEAM_ID=NEW_PASSWORD` (Super Admin)
    Passwords {
        #[arg(long = "set", value_parser = parse_override, required = true)]
        rows: Vec<PasswordOverrideRow>,
    },
    /// Add or remove points; positive values are clamped to the weekly cap
    Points {
        #[arg(long)]
        id: TeamId,
        #[arg(long, allow_hyphen_values = true)]
        points: i64,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        proof_url: Option<String>,
    },
}

#[derive(Subcommand)]
enum CoordinatorCommand {
    /// Assigned teams with members
    Teams,
    Pending,
    History,
}

#[derive(Subcommand)]
enum GameCommand {
    Status,
    /// One of start, pause, resume, stop
    Action { action: GameAction },
}

#[derive(Subcommand)]
enum WeekCommand {
    Configs,
    Configure {
        #[arg(long)]
        week: i32,
        #[arg(long)]
        cap: i64,
        #[arg(long, default_value_t = 0)]
        curse: i64,
        #[arg(long, default_value_t = 0)]
        shield: i64,
    },
    /// Move the game to a new week (Super Admin)
    Set {
        week: i32,
        /// Download a backup into this directory first
        #[arg(long)]
        backup: Option<PathBuf>,
    },
}

struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        if std::io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// A terminal has no login screen; tell the operator what to run instead.
struct CliRedirect;

impl LoginRedirect for CliRedirect {
    fn current_route(&self) -> String {
        "cli".to_string()
    }

    fn redirect_to_login(&self) {
        eprintln!("Session expired. Run `culling_admin login` again.");
    }
}

fn parse_member(raw: &str) -> Result<MemberSlot, String> {
    let (name, email) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `Name,email`, got `{raw}`"))?;
    Ok(MemberSlot::new(name.trim(), email.trim()))
}

fn parse_override(raw: &str) -> Result<PasswordOverrideRow, String> {
    let (team_id, password) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected `TEAM_ID=PASSWORD`, got `{raw}`"))?;
    Ok(PasswordOverrideRow::new(team_id.trim(), password))
}

fn write_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut handle, value)?;
    } else {
        serde_json::to_writer(&mut handle, value)?;
    }
    handle.write_all(b"\n")?;
    Ok(())
}

fn failure(fallback: &'static str) -> impl FnOnce(ClientError) -> anyhow::Error {
    move |err| match err {
        ClientError::Cancelled => anyhow!("Cancelled."),
        other => anyhow!(other.user_message(fallback)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(&cli.base_url).context("invalid base url")?;
    let api = ApiClient::new(
        config,
        Arc::new(FileTokenStore::new(cli.session_file.clone())),
        Arc::new(CliRedirect),
    )?;
    let confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(FixedAnswer(true))
    } else {
        Box::new(StdinConfirm)
    };

    run(cli.command, &api, confirm.as_ref(), cli.pretty).await
}

async fn run(command: Command, api: &ApiClient, confirm: &dyn Confirm, pretty: bool) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let login = api
                .login(&email, &password)
                .await
                .map_err(failure("Login failed"))?;
            println!("Signed in as {} ({})", login.name, login.role);
        }
        Command::Logout => {
            api.logout().await.map_err(failure("Logout failed"))?;
            println!("Signed out.");
        }
        Command::Whoami => match api.identity() {
            Some(identity) => println!("{} <{}> {}", identity.name, identity.email, identity.role),
            None => println!("Not signed in."),
        },
        Command::Team(team) => run_team(team, api, confirm, pretty).await?,
        Command::Bulk { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let report = api
                .bulk_register(&file_name, bytes)
                .await
                .map_err(failure("Upload failed"))?;
            println!("{}", report.message);
            for error in &report.errors {
                eprintln!("  {error}");
            }
        }
        Command::Dashboard { master: true } => write_json(
            &api.master_dashboard()
                .await
                .map_err(failure("Failed to load dashboard"))?,
            pretty,
        )?,
        Command::Dashboard { master: false } => write_json(
            &api.dashboard()
                .await
                .map_err(failure("Failed to load dashboard"))?,
            pretty,
        )?,
        Command::Coordinators => write_json(
            &api.coordinators()
                .await
                .map_err(failure("Failed to load coordinators"))?,
            pretty,
        )?,
        Command::Coordinator(CoordinatorCommand::Teams) => write_json(
            &api.coordinator_dashboard()
                .await
                .map_err(failure("Failed to load assigned teams"))?,
            pretty,
        )?,
        Command::Coordinator(CoordinatorCommand::Pending) => write_json(
            &api.coordinator_pending()
                .await
                .map_err(failure("Failed to load pending submissions"))?,
            pretty,
        )?,
        Command::Coordinator(CoordinatorCommand::History) => {
            let history = api
                .coordinator_history()
                .await
                .map_err(failure("Failed to load history"))?;
            for record in history {
                println!(
                    "#{:<5} {:<20} {:<24} {:<22} {}",
                    record.id,
                    record.team_name,
                    record.task_name,
                    status_label(&record.status),
                    record
                        .points_awarded
                        .map(|points| format!("{points:+}"))
                        .unwrap_or_default()
                );
            }
        }
        Command::Powers => write_json(
            &api.pending_powers()
                .await
                .map_err(failure("Failed to load powers"))?,
            pretty,
        )?,
        Command::Leaderboard => {
            let rows = api
                .leaderboard()
                .await
                .map_err(failure("Failed to load leaderboard"))?;
            for row in rows {
                println!(
                    "{:>3}. {:<24} {:>6} pts  week {:>3}/{:<3} ({}%)",
                    row.rank,
                    row.team_name,
                    row.total_points,
                    row.weekly_points,
                    row.weekly_cap,
                    progress_percent(Some(row.weekly_points), row.weekly_cap)
                );
            }
        }
        Command::Export { out } => {
            let week = api
                .game_status()
                .await
                .map_err(failure("Failed to fetch game state"))?
                .state
                .current_week;
            let path = api
                .download_backup(&out, week)
                .await
                .map_err(failure("Failed to download backup."))?;
            println!("Backup downloaded to {}", path.display());
        }
        Command::Game(GameCommand::Status) => write_json(
            &api.game_status()
                .await
                .map_err(failure("Failed to fetch game state"))?,
            pretty,
        )?,
        Command::Game(GameCommand::Action { action }) => {
            let response = api
                .game_action(action, confirm)
                .await
                .map_err(failure("Game action failed"))?;
            println!("{}", response.message);
            if let Some(winner) = response.winner.as_deref() {
                println!("{}", winner_notice(winner));
            }
        }
        Command::Week(week) => run_week(week, api, confirm, pretty).await?,
    }
    Ok(())
}

async fn run_team(
    command: TeamCommand,
    api: &ApiClient,
    confirm: &dyn Confirm,
    pretty: bool,
) -> Result<()> {
    match command {
        TeamCommand::List => write_json(
            &api.teams().await.map_err(failure("Failed to load teams"))?,
            pretty,
        )?,
        TeamCommand::Show { id } => write_json(
            &api.team(id).await.map_err(failure("Failed to load team"))?,
            pretty,
        )?,
        TeamCommand::Me => write_json(
            &api.my_team().await.map_err(failure("Failed to load team"))?,
            pretty,
        )?,
        TeamCommand::Create {
            name,
            leader_name,
            leader_email,
            leader_password,
            leader_phone,
            members,
        } => {
            if members.len() > MAX_EXTRA_MEMBERS {
                return Err(anyhow!(
                    "at most {MAX_EXTRA_MEMBERS} members besides the leader"
                ));
            }
            let mut form = CreateTeamForm {
                team_name: name,
                leader_name,
                leader_email,
                leader_password,
                leader_phone,
                ..CreateTeamForm::default()
            };
            for (slot, member) in form.members.iter_mut().zip(members) {
                *slot = member;
            }
            let created = api
                .create_team(&form)
                .await
                .map_err(failure("Failed to create team"))?;
            println!(
                "{} Team ID: {}, leader login: {}",
                created.message, created.team_id, created.leader_email
            );
        }
        TeamCommand::Disqualify { id, reason } => {
            let response = api
                .disqualify(id, &reason)
                .await
                .map_err(failure("Failed to disqualify team"))?;
            println!("{}", response.message);
        }
        TeamCommand::Requalify { id } => {
            let response = api
                .requalify(id, confirm)
                .await
                .map_err(failure("Failed to requalify team"))?;
            println!("{}", response.message);
        }
        TeamCommand::Passwords { rows } => {
            let response = api
                .change_passwords(&rows)
                .await
                .map_err(failure("Failed to update passwords"))?;
            println!("{}", response.message);
        }
        TeamCommand::Points {
            id,
            points,
            reason,
            proof_url,
        } => {
            let request = AdjustPointsRequest {
                team_id: id,
                points,
                reason,
                proof_url,
            };
            let response = api
                .adjust_points(&request)
                .await
                .map_err(failure("Failed to adjust points"))?;
            println!(
                "{} (applied {:+}, total {}, this week {})",
                response.message,
                response.points_changed,
                response.team_total_points,
                response.team_weekly_points
            );
        }
    }
    Ok(())
}

async fn run_week(
    command: WeekCommand,
    api: &ApiClient,
    confirm: &dyn Confirm,
    pretty: bool,
) -> Result<()> {
    match command {
        WeekCommand::Configs => write_json(
            &api.week_configs()
                .await
                .map_err(failure("Failed to fetch configurations"))?,
            pretty,
        )?,
        WeekCommand::Configure {
            week,
            cap,
            curse,
            shield,
        } => {
            let config = WeekConfig {
                week_number: week,
                weekly_cap: cap,
                curse_power: curse,
                shield_power: shield,
            };
            let response = api
                .set_week_config(&config)
                .await
                .map_err(failure("Failed to save configuration"))?;
            println!("{}", response.message);
        }
        WeekCommand::Set { week, backup } => {
            if let Some(dir) = backup {
                let current = api
                    .game_status()
                    .await
                    .map_err(failure("Failed to fetch game state"))?
                    .state
                    .current_week;
                let path = api
                    .download_backup(&dir, current)
                    .await
                    .map_err(failure("Failed to download backup."))?;
                println!("Backup downloaded to {}", path.display());
            }
            let response = api
                .change_week(week, confirm)
                .await
                .map_err(failure("Failed to update week"))?;
            println!("{}", response.message);
        }
    }
    Ok(())
}
