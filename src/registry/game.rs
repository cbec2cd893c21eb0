use tracing::{info, warn};

use crate::domain::{GameAction, WeekConfig, FIRST_WEEK};

use super::error::RegistryError;
use super::storage::RegistryTxn;
use super::types::{GameActionResponse, GameStatus, MessageResponse, WeekChangeResponse};
use super::validation::validate_week_config;

const LOG_TARGET: &str = "registry::game";

pub(super) async fn status(
    txn: &mut (dyn RegistryTxn + Send),
) -> Result<GameStatus, RegistryError> {
    Ok(txn.load_game_state().await?.into())
}

pub(super) async fn apply_action(
    txn: &mut (dyn RegistryTxn + Send),
    action: GameAction,
) -> Result<GameActionResponse, RegistryError> {
    let current = txn.load_game_state().await?;
    let next = current.apply(action)?;
    txn.save_game_state(&next).await?;

    let winner = match action {
        GameAction::Stop => {
            let mut eligible: Vec<_> = txn
                .list_teams()
                .await?
                .into_iter()
                .filter(|t| !t.is_disqualified)
                .collect();
            eligible.sort_by(|a, b| b.total_points.cmp(&a.total_points).then(a.id.cmp(&b.id)));
            eligible.into_iter().next().map(|t| t.name)
        }
        _ => None,
    };

    info!(
        target: LOG_TARGET,
        action = action.as_str(),
        week = next.current_week,
        winner = ?winner,
        "game state changed"
    );

    let message = match action {
        GameAction::Start => "Game started",
        GameAction::Pause => "Game paused",
        GameAction::Resume => "Game resumed",
        GameAction::Stop => "Game stopped",
    };
    Ok(GameActionResponse {
        message: message.into(),
        game: next.into(),
        winner,
    })
}

pub(super) async fn week_configs(
    txn: &mut (dyn RegistryTxn + Send),
) -> Result<Vec<WeekConfig>, RegistryError> {
    txn.list_week_configs().await
}

pub(super) async fn set_week_config(
    txn: &mut (dyn RegistryTxn + Send),
    cfg: &WeekConfig,
) -> Result<MessageResponse, RegistryError> {
    validate_week_config(cfg)?;
    txn.upsert_week_config(cfg).await?;
    info!(
        target: LOG_TARGET,
        week = cfg.week_number,
        weekly_cap = cfg.weekly_cap,
        curse_power = cfg.curse_power,
        shield_power = cfg.shield_power,
        "week config saved"
    );
    Ok(MessageResponse::new(format!(
        "Week {} configuration saved",
        cfg.week_number
    )))
}

/// Moves the whole game to `week_number`: weekly points start over and every
/// active power is switched off.
pub(super) async fn change_week(
    txn: &mut (dyn RegistryTxn + Send),
    week_number: i32,
) -> Result<WeekChangeResponse, RegistryError> {
    if week_number < FIRST_WEEK {
        return Err(RegistryError::validation(format!(
            "week_number must be at least {FIRST_WEEK}"
        )));
    }

    let mut state = txn.load_game_state().await?;
    let previous = state.current_week;
    state.current_week = week_number;
    txn.save_game_state(&state).await?;

    let teams_reset = txn.roll_teams_to_week(week_number).await?;
    let powers_deactivated = txn.deactivate_powers().await?;

    warn!(
        target: LOG_TARGET,
        previous,
        week = week_number,
        teams_reset,
        powers_deactivated,
        "week changed"
    );

    Ok(WeekChangeResponse {
        message: format!(
            "Week set to {week_number}. Weekly points reset for {teams_reset} teams."
        ),
        week_number,
        teams_reset,
        powers_deactivated,
    })
}
