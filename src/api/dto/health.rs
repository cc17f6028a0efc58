//! Health check DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "healthy",
    "timestamp": "2024-01-01T12:00:00+00:00"
}))]
pub struct HealthResponse {
    /// Overall health status
    #[schema(example = "healthy")]
    pub status: String,
    /// Timestamp of the health check (RFC 3339)
    #[schema(example = "2024-01-01T12:00:00+00:00")]
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_expected_fields() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "healthy");
        assert!(value["timestamp"].is_string());
    }
}
