/// Asks the operator before an irreversible action is sent.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

pub const STOP_GAME_PROMPT: &str = "Are you sure? This ends the game and determines the winner.";
pub const REQUALIFY_PROMPT: &str = "Are you sure you want to requalify this team?";
pub const WEEK_CHANGE_PROMPT: &str =
    "Changing the week resets all weekly points and deactivates powers. Proceed?";

/// Answers every prompt the same way. Used for `--yes` and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
