use serde::{Deserialize, Serialize};

use super::{TeamId, UserId};

/// Team ids are handed out sequentially starting here.
pub const FIRST_TEAM_ID: TeamId = 101;
/// Members besides the leader.
pub const MAX_EXTRA_MEMBERS: usize = 4;
/// Largest magnitude a single manual adjustment may carry.
pub const MAX_POINT_ADJUSTMENT: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub leader_id: UserId,
    pub coordinator_id: Option<UserId>,
    pub total_points: i64,
    pub weekly_points: i64,
    pub week_number: i32,
    pub weekly_cap_reached: bool,
    pub is_disqualified: bool,
}

impl Team {
    pub fn new(id: TeamId, name: impl Into<String>, leader_id: UserId, week_number: i32) -> Self {
        Self {
            id,
            name: name.into(),
            leader_id,
            coordinator_id: None,
            total_points: 0,
            weekly_points: 0,
            week_number,
            weekly_cap_reached: false,
            is_disqualified: false,
        }
    }

    /// Applies a manual adjustment and returns the delta actually booked.
    /// Positive deltas are clamped to what is left under `weekly_cap`;
    /// deductions always go through. Returns `None` and leaves the team
    /// untouched when either running total would overflow.
    pub fn apply_adjustment(&mut self, points: i64, weekly_cap: i64) -> Option<i64> {
        let mut applied = points;
        let mut cap_reached = self.weekly_cap_reached;
        if points > 0 {
            let remaining = weekly_cap.saturating_sub(self.weekly_points);
            if remaining <= 0 {
                applied = 0;
                cap_reached = true;
            } else if points > remaining {
                applied = remaining;
                cap_reached = true;
            }
        }

        let weekly_points = self.weekly_points.checked_add(applied)?;
        let total_points = self.total_points.checked_add(applied)?;
        self.weekly_points = weekly_points;
        self.total_points = total_points;
        self.weekly_cap_reached = cap_reached;
        Some(applied)
    }

    /// Week rollover: weekly accumulation starts over.
    pub fn roll_to_week(&mut self, week_number: i32) {
        self.week_number = week_number;
        self.weekly_points = 0;
        self.weekly_cap_reached = false;
    }
}

/// Next id after `last`, never below [`FIRST_TEAM_ID`].
pub fn next_team_id(last: Option<TeamId>) -> TeamId {
    match last {
        Some(id) if id >= FIRST_TEAM_ID => id + 1,
        _ => FIRST_TEAM_ID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Team {
        Team::new(101, "Gojo", 1, 1)
    }

    #[test]
    fn adjustment_within_cap_is_booked_in_full() {
        let mut team = team();
        assert_eq!(team.apply_adjustment(10, 30), Some(10));
        assert_eq!(team.weekly_points, 10);
        assert_eq!(team.total_points, 10);
        assert!(!team.weekly_cap_reached);
    }

    #[test]
    fn adjustment_is_clamped_to_remaining_cap() {
        let mut team = team();
        team.weekly_points = 25;
        team.total_points = 80;

        assert_eq!(team.apply_adjustment(10, 30), Some(5));
        assert_eq!(team.weekly_points, 30);
        assert_eq!(team.total_points, 85);
        assert!(team.weekly_cap_reached);

        assert_eq!(team.apply_adjustment(4, 30), Some(0));
        assert_eq!(team.total_points, 85);
    }

    #[test]
    fn deductions_ignore_the_cap() {
        let mut team = team();
        team.weekly_points = 30;
        team.total_points = 30;
        assert_eq!(team.apply_adjustment(-12, 30), Some(-12));
        assert_eq!(team.weekly_points, 18);
        assert_eq!(team.total_points, 18);
    }

    #[test]
    fn overflowing_adjustment_leaves_team_untouched() {
        let mut team = team();
        team.weekly_points = 5;
        team.total_points = i64::MIN + 3;
        assert_eq!(team.apply_adjustment(-4, 30), None);
        assert_eq!(team.weekly_points, 5);
        assert_eq!(team.total_points, i64::MIN + 3);

        team.total_points = i64::MAX - 1;
        assert_eq!(team.apply_adjustment(10, i64::MAX), None);
        assert_eq!(team.weekly_points, 5);
        assert!(!team.weekly_cap_reached);

        assert_eq!(team.apply_adjustment(-3, 30), Some(-3));
        assert_eq!(team.total_points, i64::MAX - 4);
    }

    #[test]
    fn rollover_resets_weekly_state_only() {
        let mut team = team();
        team.apply_adjustment(30, 30);
        team.apply_adjustment(1, 30);
        team.roll_to_week(2);
        assert_eq!(team.week_number, 2);
        assert_eq!(team.weekly_points, 0);
        assert_eq!(team.total_points, 30);
        assert!(!team.weekly_cap_reached);
    }

    #[test]
    fn team_ids_start_at_first_team_id() {
        assert_eq!(next_team_id(None), 101);
        assert_eq!(next_team_id(Some(7)), 101);
        assert_eq!(next_team_id(Some(101)), 102);
        assert_eq!(next_team_id(Some(250)), 251);
    }
}
