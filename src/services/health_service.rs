use tracing::warn;

use crate::{
    dto::health::{HealthResponse, HealthStatus},
    state::SharedState,
};

/// Report `ok` while the room store passes its health check.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let status = match state.rooms().health_check().await {
        Ok(()) => HealthStatus::Ok,
        Err(err) => {
            warn!(error = %err, "room store health check failed");
            HealthStatus::Degraded
        }
    };
    status.into()
}
