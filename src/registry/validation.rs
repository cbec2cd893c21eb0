use crate::config::MIN_PASSWORD_LEN;
use crate::domain::{TeamId, WeekConfig, MAX_EXTRA_MEMBERS, MAX_POINT_ADJUSTMENT};

use super::error::RegistryError;
use super::types::{AdjustPointsRequest, CreateTeamRequest, DisqualifyRequest};

pub fn validate_create_team(req: &CreateTeamRequest) -> Result<(), RegistryError> {
    if is_blank(&req.team_name)
        || is_blank(&req.leader_name)
        || is_blank(&req.leader_email)
        || req.leader_password.is_empty()
    {
        return Err(RegistryError::validation(
            "team_name, leader_name, leader_email, leader_password required",
        ));
    }
    ensure_password_len(&req.leader_password)?;
    if req.members.len() > MAX_EXTRA_MEMBERS {
        return Err(RegistryError::validation(format!(
            "a team has at most {MAX_EXTRA_MEMBERS} members besides the leader"
        )));
    }
    if req
        .members
        .iter()
        .any(|m| is_blank(&m.name) || is_blank(&m.email))
    {
        return Err(RegistryError::validation(
            "every member needs a name and an email",
        ));
    }
    Ok(())
}

pub fn ensure_password_len(password: &str) -> Result<(), RegistryError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RegistryError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_disqualify(req: &DisqualifyRequest) -> Result<(), RegistryError> {
    if req.team_id <= 0 || is_blank(&req.reason) {
        return Err(RegistryError::validation("team_id and reason required"));
    }
    Ok(())
}

pub fn validate_adjustment(req: &AdjustPointsRequest) -> Result<(), RegistryError> {
    if is_blank(&req.reason) {
        return Err(RegistryError::validation(
            "team_id, points, and reason are required",
        ));
    }
    if req.points.unsigned_abs() > MAX_POINT_ADJUSTMENT.unsigned_abs() {
        return Err(RegistryError::validation(format!(
            "points must be between -{MAX_POINT_ADJUSTMENT} and {MAX_POINT_ADJUSTMENT}"
        )));
    }
    Ok(())
}

pub fn validate_week_config(cfg: &WeekConfig) -> Result<(), RegistryError> {
    cfg.validate().map_err(RegistryError::validation)
}

/// Parses a team id typed into a form field.
pub fn parse_team_id(raw: &str) -> Option<TeamId> {
    raw.trim().parse::<TeamId>().ok()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::MemberInput;

    fn request() -> CreateTeamRequest {
        CreateTeamRequest {
            team_name: "Jujutsu High".into(),
            leader_name: "Yuji".into(),
            leader_email: "yuji@example.com".into(),
            leader_password: "sukuna1".into(),
            leader_phone: None,
            members: vec![MemberInput {
                name: "Megumi".into(),
                email: "megumi@example.com".into(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn accepts_complete_request() {
        assert!(validate_create_team(&request()).is_ok());
    }

    #[test]
    fn rejects_missing_leader_fields() {
        let mut req = request();
        req.leader_email = "  ".into();
        assert!(matches!(
            validate_create_team(&req),
            Err(RegistryError::Validation(_))
        ));
    }

    #[test]
    fn rejects_short_password_and_oversized_roster() {
        let mut req = request();
        req.leader_password = "12345".into();
        assert!(validate_create_team(&req).is_err());

        let mut req = request();
        req.members = vec![req.members[0].clone(); 5];
        assert!(validate_create_team(&req).is_err());
    }

    #[test]
    fn disqualify_needs_reason() {
        let req = DisqualifyRequest {
            team_id: 101,
            reason: " ".into(),
        };
        assert!(validate_disqualify(&req).is_err());
    }

    #[test]
    fn team_ids_are_trimmed() {
        assert_eq!(parse_team_id(" 104 "), Some(104));
        assert_eq!(parse_team_id("abc"), None);
    }
}
