/// Shortest password accepted for team leaders.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Leader password for bulk-imported rows that carry no phone number.
pub const DEFAULT_IMPORT_PASSWORD: &str = "123456";
pub const DEFAULT_SUPER_ADMIN_EMAIL: &str = "superadmin@culling.games";

/// Runtime settings shared by the registry service and the HTTP layer.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The single MASTER allowed to run destructive global actions.
    pub super_admin_email: String,
}

impl AppConfig {
    pub fn new(super_admin_email: impl Into<String>) -> Self {
        Self {
            super_admin_email: super_admin_email.into(),
        }
    }

    pub fn is_super_admin(&self, email: &str) -> bool {
        self.super_admin_email.eq_ignore_ascii_case(email.trim())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SUPER_ADMIN_EMAIL)
    }
}
