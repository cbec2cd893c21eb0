//! Form state as an operator fills it in, and the checks applied before it is sent.

use crate::config::MIN_PASSWORD_LEN;
use crate::domain::MAX_EXTRA_MEMBERS;

/// Member slots that must be filled besides the leader.
pub const REQUIRED_MEMBER_SLOTS: usize = 2;
use crate::registry::types::{CreateTeamRequest, MemberInput, PasswordUpdate};

use super::error::FormError;

/// One line of the password override table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordOverrideRow {
    pub team_id: String,
    pub new_password: String,
}

impl PasswordOverrideRow {
    pub fn new(team_id: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            new_password: new_password.into(),
        }
    }
}

/// Drops rows with a blank id or password. Nothing left, or any short
/// password among the rest, blocks the whole submission.
pub fn prepare_password_overrides(
    rows: &[PasswordOverrideRow],
) -> Result<Vec<PasswordUpdate>, FormError> {
    let updates: Vec<PasswordUpdate> = rows
        .iter()
        .filter(|row| !row.team_id.trim().is_empty() && !row.new_password.trim().is_empty())
        .map(|row| PasswordUpdate {
            team_id: row.team_id.trim().to_string(),
            new_password: row.new_password.clone(),
        })
        .collect();

    if updates.is_empty() {
        return Err(FormError::NoOverrides);
    }
    if updates
        .iter()
        .any(|update| update.new_password.chars().count() < MIN_PASSWORD_LEN)
    {
        return Err(FormError::PasswordTooShort);
    }
    Ok(updates)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberSlot {
    pub name: String,
    pub email: String,
}

impl MemberSlot {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    fn is_filled(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty()
    }
}

/// The registration form: leader fields plus a fixed number of member
/// slots, the first [`REQUIRED_MEMBER_SLOTS`] of them mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTeamForm {
    pub team_name: String,
    pub leader_name: String,
    pub leader_email: String,
    pub leader_password: String,
    pub leader_phone: String,
    pub members: [MemberSlot; MAX_EXTRA_MEMBERS],
}

impl Default for CreateTeamForm {
    fn default() -> Self {
        Self {
            team_name: String::new(),
            leader_name: String::new(),
            leader_email: String::new(),
            leader_password: String::new(),
            leader_phone: String::new(),
            members: std::array::from_fn(|_| MemberSlot::default()),
        }
    }
}

impl CreateTeamForm {
    /// Builds the request body; optional slots missing a name or email are
    /// left out.
    pub fn to_request(&self) -> Result<CreateTeamRequest, FormError> {
        let required = [
            ("team_name", &self.team_name),
            ("leader_name", &self.leader_name),
            ("leader_email", &self.leader_email),
            ("leader_password", &self.leader_password),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(FormError::MissingField(field));
            }
        }
        if self.leader_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort);
        }
        if let Some(index) = self.members[..REQUIRED_MEMBER_SLOTS]
            .iter()
            .position(|slot| !slot.is_filled())
        {
            return Err(FormError::MissingMember(index + 2));
        }

        let phone = self.leader_phone.trim();
        Ok(CreateTeamRequest {
            team_name: self.team_name.trim().to_string(),
            leader_name: self.leader_name.trim().to_string(),
            leader_email: self.leader_email.trim().to_string(),
            leader_password: self.leader_password.clone(),
            leader_phone: (!phone.is_empty()).then(|| phone.to_string()),
            members: self
                .members
                .iter()
                .filter(|slot| slot.is_filled())
                .map(|slot| MemberInput {
                    name: slot.name.trim().to_string(),
                    email: slot.email.trim().to_string(),
                    ..MemberInput::default()
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_override_rows_are_dropped() {
        let rows = [
            PasswordOverrideRow::new(" 101 ", "newpass1"),
            PasswordOverrideRow::new("", "orphaned"),
            PasswordOverrideRow::new("102", "   "),
        ];
        let updates = prepare_password_overrides(&rows).unwrap();
        assert_eq!(
            updates,
            vec![PasswordUpdate {
                team_id: "101".into(),
                new_password: "newpass1".into(),
            }]
        );
    }

    #[test]
    fn empty_override_table_is_rejected() {
        let rows = [PasswordOverrideRow::default(), PasswordOverrideRow::new("101", "")];
        assert_eq!(
            prepare_password_overrides(&rows),
            Err(FormError::NoOverrides)
        );
        assert_eq!(
            FormError::NoOverrides.to_string(),
            "Please fill in at least one Team ID and Password."
        );
    }

    #[test]
    fn one_short_password_blocks_every_row() {
        let rows = [
            PasswordOverrideRow::new("101", "longenough"),
            PasswordOverrideRow::new("102", "abc"),
        ];
        let err = prepare_password_overrides(&rows).unwrap_err();
        assert_eq!(err, FormError::PasswordTooShort);
        assert_eq!(
            err.to_string(),
            "All new passwords must be at least 6 characters long."
        );
    }

    fn filled_form() -> CreateTeamForm {
        let mut form = CreateTeamForm {
            team_name: "Tokyo".into(),
            leader_name: "Yuji".into(),
            leader_email: "a@b.com".into(),
            leader_password: "sukuna123".into(),
            ..CreateTeamForm::default()
        };
        form.members[0] = MemberSlot::new("Megumi", "megumi@jjk.com");
        form.members[1] = MemberSlot::new("Nobara", "nobara@jjk.com");
        form
    }

    #[test]
    fn unfilled_member_slots_are_omitted() {
        let mut form = filled_form();
        form.members[2] = MemberSlot::new("Maki", "");

        let request = form.to_request().unwrap();
        assert_eq!(request.members.len(), 2);
        assert_eq!(request.members[1].name, "Nobara");
        assert_eq!(request.leader_phone, None);
    }

    #[test]
    fn missing_leader_fields_are_reported() {
        let mut form = filled_form();
        form.leader_email = "  ".into();
        assert_eq!(
            form.to_request().unwrap_err(),
            FormError::MissingField("leader_email")
        );

        let mut form = filled_form();
        form.leader_password = "12345".into();
        assert_eq!(form.to_request().unwrap_err(), FormError::PasswordTooShort);
    }

    #[test]
    fn first_two_member_slots_are_required() {
        let mut form = filled_form();
        form.members = std::array::from_fn(|_| MemberSlot::default());
        assert_eq!(form.to_request().unwrap_err(), FormError::MissingMember(2));

        let mut form = filled_form();
        form.members[1] = MemberSlot::new("Nobara", " ");
        let err = form.to_request().unwrap_err();
        assert_eq!(err, FormError::MissingMember(3));
        assert_eq!(err.to_string(), "Member 3 name and email are required");

        // later slots do not stand in for the required ones
        let mut form = filled_form();
        form.members[0] = MemberSlot::default();
        form.members[2] = MemberSlot::new("Maki", "maki@jjk.com");
        form.members[3] = MemberSlot::new("Toge", "toge@jjk.com");
        assert_eq!(form.to_request().unwrap_err(), FormError::MissingMember(2));

        assert_eq!(filled_form().to_request().unwrap().members.len(), 2);
    }
}
