use serde::{Deserialize, Serialize};

use crate::domain::TeamId;

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamPath {
    pub team_id: TeamId,
}

#[derive(Debug, Deserialize)]
pub struct GameActionPath {
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
