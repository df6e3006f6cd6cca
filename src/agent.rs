//! RespawnAgent – drives [`RespawnService::tick`] from a wall-clock interval
//! and publishes every produced event.
//!
//! ## Outbound contract
//!
//! Each [`RespawnEvent`] is wrapped in a `WorldEvent<RespawnEvent>` envelope,
//! serialised to JSON and sent on the agent's channel as a [`Published`]
//! message tagged with the event's subject (see [`crate::protocol`]).

use crate::protocol::{RespawnEvent, WorldEvent};
use crate::service::RespawnService;
use anyhow::{ensure, Result};
use bytes::Bytes;
use log::{info, warn};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Fastest supported tick loop; one tick per millisecond.
pub const MAX_TICK_RATE_HZ: f32 = 1000.0;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Session name stamped on every envelope.
    pub session: String,
    /// Tick rate in Hz. The host engine ticks at 20.
    pub tick_rate_hz: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            session: "default".into(),
            tick_rate_hz: 20.0,
        }
    }
}

/// One serialised event ready for a transport.
#[derive(Debug, Clone)]
pub struct Published {
    pub subject: &'static str,
    pub payload: Bytes,
}

// ---------------------------------------------------------------------------
// RespawnAgent
// ---------------------------------------------------------------------------

pub struct RespawnAgent {
    config: AgentConfig,
    service: Arc<Mutex<RespawnService>>,
    sink: mpsc::Sender<Published>,
}

impl RespawnAgent {
    pub fn new(
        config: AgentConfig,
        service: Arc<Mutex<RespawnService>>,
        sink: mpsc::Sender<Published>,
    ) -> Self {
        Self {
            config,
            service,
            sink,
        }
    }

    /// Tick until SIGINT.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Tick until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let rate = self.config.tick_rate_hz;
        ensure!(
            rate.is_finite() && rate > 0.0 && rate <= MAX_TICK_RATE_HZ,
            "tick rate must be within (0, {}] Hz, got {}",
            MAX_TICK_RATE_HZ,
            rate
        );

        let span = tracing::info_span!("respawn_agent", session = %self.config.session);
        async move {
            info!(
                "RespawnAgent active – ticking at {:.0}Hz",
                self.config.tick_rate_hz
            );

            let interval = std::time::Duration::from_secs_f32(1.0 / self.config.tick_rate_hz);
            let mut timer = tokio::time::interval(interval);
            tokio::pin!(shutdown);

            loop {
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("RespawnAgent shutting down");
                        break;
                    }
                    _ = timer.tick() => {
                        // Hold the lock only long enough to tick, then release before publishing.
                        let tick_events = {
                            let mut svc = self.service.lock();
                            svc.tick()
                        };

                        for event in &tick_events.events {
                            publish_event(
                                &self.sink,
                                WorldEvent::new(self.config.session.as_str(), tick_events.tick, event),
                            )
                            .await;
                        }
                    }
                }
            }
            Ok(())
        }
        .instrument(span)
        .await
    }
}

// ---------------------------------------------------------------------------
// Publish helper
// ---------------------------------------------------------------------------

/// Serialise `event` and send it on its subject.
///
/// Errors are logged and swallowed so one bad publish cannot stop the ticks.
async fn publish_event(sink: &mpsc::Sender<Published>, event: WorldEvent<&RespawnEvent>) {
    let subject = event.payload.subject();
    match serde_json::to_vec(&event) {
        Ok(payload) => {
            let msg = Published {
                subject,
                payload: Bytes::from(payload),
            };
            if let Err(e) = sink.send(msg).await {
                warn!("Failed to publish to {}: {}", subject, e);
            }
        }
        Err(e) => warn!("Failed to serialise event for {}: {}", subject, e),
    }
}
