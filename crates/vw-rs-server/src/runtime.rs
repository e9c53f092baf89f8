//! Logging setup and the async world loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::config::LoggingSection;
use crate::server::Server;
use crate::transport::TransportEvent;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(logging: &LoggingSection) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Drives `server` until `shutdown` flips to `true` or the event channel
/// closes: inbound transport events are handled as they arrive and
/// [`Server::tick`] runs every `tick_interval_ms`. Every session is removed
/// on the way out.
pub async fn run(
    server: Arc<Server>,
    mut events: mpsc::Receiver<TransportEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = Duration::from_millis(server.config().world.tick_interval_ms);
    let mut tick_interval = tokio::time::interval(period);
    info!("World loop running ({}ms ticks)", period.as_millis());
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(e) => server.handle_event(e),
                    None => break, // transport gone
                }
            }
            _ = tick_interval.tick() => {
                server.tick();
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }
    }
    server.shutdown();
    info!("World loop stopped after {} ticks", server.current_tick());
}
