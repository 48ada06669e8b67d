use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for diagnostics information
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsResponse {
    pub n_shapes: usize,
    pub n_users: usize,
    pub n_conn: usize,
    pub has_background: bool,
}
