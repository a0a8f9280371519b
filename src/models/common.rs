use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Envelope used by every JSON list/detail endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DataResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            message: "success".to_string(),
            data,
        }
    }
}

/// Row count reported by delete / confirm.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangesResponse {
    pub message: String,
    pub changes: u64,
}

impl ChangesResponse {
    pub fn new(message: &str, changes: u64) -> Self {
        Self {
            message: message.to_string(),
            changes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiError,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}
