//! Global game lifecycle and the transitions an admin can drive

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::week::FIRST_WEEK;
use super::UnknownVariant;

/// Singleton game state as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub is_active: bool,
    pub is_paused: bool,
    pub current_week: i32,
    pub registration_open: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            is_active: false,
            is_paused: false,
            current_week: FIRST_WEEK,
            registration_open: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    NotLive,
    Live,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameAction {
    Start,
    Pause,
    Resume,
    Stop,
}

impl GameAction {
    pub fn as_str(self) -> &'static str {
        match self {
            GameAction::Start => "start",
            GameAction::Pause => "pause",
            GameAction::Resume => "resume",
            GameAction::Stop => "stop",
        }
    }
}

impl FromStr for GameAction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Ok(GameAction::Start),
            "pause" => Ok(GameAction::Pause),
            "resume" => Ok(GameAction::Resume),
            "stop" => Ok(GameAction::Stop),
            _ => Err(UnknownVariant {
                kind: "game action",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} a game that is {phase:?}")]
pub struct TransitionError {
    pub action: &'static str,
    pub phase: GamePhase,
}

impl GameState {
    pub fn phase(&self) -> GamePhase {
        match (self.is_active, self.is_paused) {
            (false, _) => GamePhase::NotLive,
            (true, false) => GamePhase::Live,
            (true, true) => GamePhase::Paused,
        }
    }

    /// NOT_LIVE -> LIVE <-> PAUSED -> NOT_LIVE. Stopping returns the game to
    /// NOT_LIVE while keeping the current week.
    pub fn apply(self, action: GameAction) -> Result<GameState, TransitionError> {
        let phase = self.phase();
        let next = match (phase, action) {
            (GamePhase::NotLive, GameAction::Start) => (true, false),
            (GamePhase::Live, GameAction::Pause) => (true, true),
            (GamePhase::Paused, GameAction::Resume) => (true, false),
            (GamePhase::Live | GamePhase::Paused, GameAction::Stop) => (false, false),
            _ => {
                return Err(TransitionError {
                    action: action.as_str(),
                    phase,
                })
            }
        };

        Ok(GameState {
            is_active: next.0,
            is_paused: next.1,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lifecycle() {
        let state = GameState::default();
        assert_eq!(state.phase(), GamePhase::NotLive);

        let live = state.apply(GameAction::Start).unwrap();
        assert_eq!(live.phase(), GamePhase::Live);

        let paused = live.apply(GameAction::Pause).unwrap();
        assert_eq!(paused.phase(), GamePhase::Paused);

        let resumed = paused.apply(GameAction::Resume).unwrap();
        assert_eq!(resumed.phase(), GamePhase::Live);

        let stopped = resumed.apply(GameAction::Stop).unwrap();
        assert_eq!(stopped.phase(), GamePhase::NotLive);
        assert_eq!(stopped.current_week, state.current_week);
    }

    #[test]
    fn paused_game_can_be_stopped() {
        let paused = GameState {
            is_active: true,
            is_paused: true,
            ..GameState::default()
        };
        assert_eq!(
            paused.apply(GameAction::Stop).unwrap().phase(),
            GamePhase::NotLive
        );
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let idle = GameState::default();
        for action in [GameAction::Pause, GameAction::Resume, GameAction::Stop] {
            let err = idle.apply(action).unwrap_err();
            assert_eq!(err.phase, GamePhase::NotLive);
        }

        let live = idle.apply(GameAction::Start).unwrap();
        assert!(live.apply(GameAction::Start).is_err());
        assert!(live.apply(GameAction::Resume).is_err());
    }

    #[test]
    fn actions_parse_from_path_segments() {
        assert_eq!("STOP".parse::<GameAction>().unwrap(), GameAction::Stop);
        assert_eq!("resume".parse::<GameAction>().unwrap(), GameAction::Resume);
        assert!("restart".parse::<GameAction>().is_err());
    }
}
