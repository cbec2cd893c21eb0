/// Share of the weekly cap already earned, in whole percent. Missing points
/// or a cap of zero show as an empty bar.
pub fn progress_percent(weekly_points: Option<i64>, weekly_cap: i64) -> u8 {
    let Some(points) = weekly_points else {
        return 0;
    };
    if weekly_cap <= 0 || points <= 0 {
        return 0;
    }
    let percent = points.saturating_mul(100) / weekly_cap;
    percent.min(100) as u8
}

pub fn status_label(status: &str) -> String {
    if status == "APPROVED" {
        "VERIFIED (APPROVED)".to_string()
    } else {
        status.to_string()
    }
}

pub fn winner_notice(winner: &str) -> String {
    format!("WINNER: {winner}")
}

pub fn backup_file_name(current_week: i32) -> String {
    format!("CullingGames_Backup_Week_{current_week}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_never_divides_by_zero() {
        assert_eq!(progress_percent(Some(15), 0), 0);
        assert_eq!(progress_percent(None, 30), 0);
        assert_eq!(progress_percent(Some(-4), 30), 0);
    }

    #[test]
    fn progress_is_capped() {
        assert_eq!(progress_percent(Some(15), 30), 50);
        assert_eq!(progress_percent(Some(45), 30), 100);
        assert_eq!(progress_percent(Some(i64::MAX), 1), 100);
    }

    #[test]
    fn approved_submissions_read_as_verified() {
        assert_eq!(status_label("APPROVED"), "VERIFIED (APPROVED)");
        assert_eq!(status_label("REJECTED"), "REJECTED");
    }

    #[test]
    fn backup_name_carries_the_week() {
        assert_eq!(backup_file_name(3), "CullingGames_Backup_Week_3.json");
        assert_eq!(winner_notice("Tokyo"), "WINNER: Tokyo");
    }
}
