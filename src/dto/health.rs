//! Payload of the `/healthcheck` route.

use serde::Serialize;
use utoipa::ToSchema;

/// Overall server condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The room store accepts new rooms.
    Ok,
    /// Existing rooms are served but new ones are refused.
    Degraded,
}

/// Body of the health check.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: HealthStatus,
}

impl From<HealthStatus> for HealthResponse {
    fn from(status: HealthStatus) -> Self {
        Self { status }
    }
}
