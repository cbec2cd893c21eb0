use thiserror::Error;

/// Input rejected before any request was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please fill in at least one Team ID and Password.")]
    NoOverrides,
    #[error("All new passwords must be at least 6 characters long.")]
    PasswordTooShort,
    #[error("A reason is required to disqualify a team.")]
    MissingReason,
    #[error("{0} is required")]
    MissingField(&'static str),
    /// Numbered the way the form labels it: the leader is member 1.
    #[error("Member {0} name and email are required")]
    MissingMember(usize),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The session is gone; the token store has already been cleared.
    #[error("session expired")]
    Unauthorized { message: Option<String> },

    #[error("server returned {status}")]
    Api { status: u16, message: Option<String> },

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("cancelled")]
    Cancelled,

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Text for the single notification shown after a failed action: the
    /// server's own message when it sent one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Unauthorized {
                message: Some(message),
            }
            | ClientError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::Form(err) => err.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
