use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API response for health and readiness checks
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    /// Storage backend shapes and chat are recorded to ("postgres" or "memory")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}
