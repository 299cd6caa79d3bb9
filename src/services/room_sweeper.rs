use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::dao::room_store::RoomStore;

const MAX_DELAY: Duration = Duration::from_secs(10 * 60);

/// Periodically drop rooms idle for longer than `ttl`.
///
/// A failing sweep backs off exponentially (capped) and returns to `interval`
/// after the next success.
pub async fn run(store: Arc<dyn RoomStore>, ttl: Duration, interval: Duration) {
    let mut delay = interval;

    loop {
        sleep(delay).await;
        match store.purge_idle(ttl).await {
            Ok(0) => {
                debug!("room expiry sweep found nothing to drop");
                delay = interval;
            }
            Ok(purged) => {
                info!(purged, ttl_secs = ttl.as_secs(), "dropped idle rooms");
                delay = interval;
            }
            Err(err) => {
                warn!(error = %err, "room expiry sweep failed; backing off");
                delay = (delay * 2).min(MAX_DELAY.max(interval));
            }
        }
    }
}
