use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response returned after uploading a background image
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BackgroundUploadResponse {
    pub id: String,
}
