//! Bulk team roster import from a spreadsheet CSV export.
//!
//! Layout (0-based columns): 0 team name, 1 unused, 2 leader name,
//! 3 leader email, 4 leader phone, 5 academic year, 6 department, then up
//! to four members of four columns each (name, email, year, department)
//! starting at 7, 11, 15 and 19. The first line is a header.

use crate::config::{DEFAULT_IMPORT_PASSWORD, MIN_PASSWORD_LEN};
use crate::domain::Person;

use super::error::RegistryError;

const MEMBER_COLUMNS: [usize; 4] = [7, 11, 15, 19];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub row_number: u64,
    pub team_name: String,
    pub leader: Person,
    pub members: Vec<Person>,
}

impl RosterRow {
    /// Leaders log in with their phone number until the password is changed.
    pub fn initial_password(&self) -> &str {
        match self.leader.phone.as_deref() {
            Some(phone) if phone.chars().count() >= MIN_PASSWORD_LEN => phone,
            _ => DEFAULT_IMPORT_PASSWORD,
        }
    }
}

pub fn ensure_csv_filename(file_name: Option<&str>) -> Result<(), RegistryError> {
    match file_name {
        Some(name) if name.to_ascii_lowercase().ends_with(".csv") => Ok(()),
        _ => Err(RegistryError::validation(
            "Only CSV files are allowed. Make sure you downloaded the Google Sheet as '.csv'",
        )),
    }
}

/// UTF-8 (BOM tolerated) with a Latin-1 fallback for spreadsheet exports.
pub fn decode_upload(bytes: &[u8]) -> Result<String, RegistryError> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.strip_prefix('\u{feff}').unwrap_or(text).to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    };

    if text.contains('\0') {
        return Err(RegistryError::validation(
            "This looks like an Excel file renamed to .csv. Please open it in Excel/Sheets and click 'File -> Download -> CSV'.",
        ));
    }
    Ok(text)
}

/// Parses every data row. Rows with a blank first cell are dropped; rows that
/// cannot describe a team come back as `Err` with a user-facing message.
pub fn parse_roster(text: &str) -> Vec<Result<RosterRow, String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let fallback_line = idx as u64 + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                rows.push(Err(format!("Row {fallback_line} Failed: {err}")));
                continue;
            }
        };
        let row_number = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(fallback_line);
        let cell = |i: usize| record.get(i).map(str::trim).unwrap_or("");

        let team_name = cell(0);
        if team_name.is_empty() {
            continue;
        }

        let leader_name = cell(2);
        let leader_email = cell(3);
        if leader_name.is_empty() || leader_email.is_empty() {
            rows.push(Err(format!(
                "Row {row_number} Failed: missing leader name or email"
            )));
            continue;
        }

        let leader = Person {
            name: leader_name.to_string(),
            email: leader_email.to_string(),
            phone: optional(cell(4)),
            academic_year: optional(cell(5)),
            department: optional(cell(6)),
        };

        let members = MEMBER_COLUMNS
            .iter()
            .filter_map(|&start| {
                let name = cell(start);
                let email = cell(start + 1);
                if name.is_empty() || email.is_empty() {
                    return None;
                }
                Some(Person {
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: None,
                    academic_year: optional(cell(start + 2)),
                    department: optional(cell(start + 3)),
                })
            })
            .collect();

        rows.push(Ok(RosterRow {
            row_number,
            team_name: team_name.to_string(),
            leader,
            members,
        }));
    }
    rows
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
