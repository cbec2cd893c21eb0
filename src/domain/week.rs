use serde::{Deserialize, Serialize};

pub const FIRST_WEEK: i32 = 1;
/// Cap applied when no config row exists for a week.
pub const DEFAULT_WEEKLY_CAP: i64 = 30;

/// Per-week scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekConfig {
    pub week_number: i32,
    pub weekly_cap: i64,
    pub curse_power: i64,
    pub shield_power: i64,
}

impl WeekConfig {
    pub fn default_for(week_number: i32) -> Self {
        Self {
            week_number,
            weekly_cap: DEFAULT_WEEKLY_CAP,
            curse_power: 0,
            shield_power: 0,
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.week_number < FIRST_WEEK {
            return Err("week_number must be at least 1");
        }
        if self.weekly_cap < 0 {
            return Err("weekly_cap cannot be negative");
        }
        if self.curse_power < 0 || self.shield_power < 0 {
            return Err("power values cannot be negative");
        }
        Ok(())
    }
}
