//! # Panel Runtime
//!
//! Drives a [`Panel`] from a single tokio task.
//!
//! ```text
//!  PanelEvent ──mpsc──▶ ┌──────────────────────────┐ ──▶ PanelUpdate
//!                       │ select! {                │
//!                       │   events.recv(),         │
//!                       │   sleep_until(deadline), │ ──▶ OutboundMessage
//!                       │ }                        │
//!                       └──────────────────────────┘
//! ```
//!
//! Events are handled strictly one after another, so the panel needs no
//! locking. The only timers are the validation debounce and notice expiry,
//! both read from [`Panel::next_deadline`] on every turn of the loop.
//! Failed events become [`PanelUpdate::Error`]; they never stop the loop.

use std::time::Instant;

use rulepad_editor::OutboundMessage;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::panel::{Panel, PanelEvent, PanelUpdate};

/// Capacity of the event channel
const EVENT_BUFFER: usize = 100;

/// Host side of a running panel
pub struct PanelChannels {
    pub events: mpsc::Sender<PanelEvent>,
    pub updates: mpsc::UnboundedReceiver<PanelUpdate>,
    pub outbound: mpsc::UnboundedReceiver<OutboundMessage>,
}

pub struct PanelRuntime {
    panel: Panel,
    events: mpsc::Receiver<PanelEvent>,
    updates: mpsc::UnboundedSender<PanelUpdate>,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
}

impl PanelRuntime {
    pub fn new(panel: Panel) -> (Self, PanelChannels) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let runtime = Self {
            panel,
            events: event_rx,
            updates: update_tx,
            outbound: outbound_tx,
        };
        let channels = PanelChannels {
            events: event_tx,
            updates: update_rx,
            outbound: outbound_rx,
        };
        (runtime, channels)
    }

    /// Run until the event channel closes or `Shutdown` arrives
    ///
    /// Returns the panel so the host can inspect or persist its final state.
    pub async fn run(mut self) -> Panel {
        info!("Panel runtime started");

        if let Err(e) = self.panel.start() {
            self.report(e.to_string());
        }
        self.flush();

        loop {
            let deadline = self.panel.next_deadline();

            tokio::select! {
                event = self.events.recv() => match event {
                    None | Some(PanelEvent::Shutdown) => break,
                    Some(event) => {
                        if let Err(e) = self.panel.handle_event(event, clock()) {
                            warn!(error = %e, "Panel event failed");
                            self.report(e.to_string());
                        }
                    }
                },
                _ = sleep_until(deadline) => {
                    self.panel.tick(clock());
                }
            }

            self.flush();
        }

        self.flush();
        info!("Panel runtime stopped");
        self.panel
    }

    fn report(&self, message: String) {
        if self.updates.send(PanelUpdate::Error { message }).is_err() {
            debug!("Update receiver dropped");
        }
    }

    fn flush(&mut self) {
        for update in self.panel.take_updates() {
            if self.updates.send(update).is_err() {
                debug!("Update receiver dropped");
                break;
            }
        }

        for message in self.panel.take_outbound() {
            debug!(bytes = message.document().len(), "Sending to evaluator");
            if self.outbound.send(message).is_err() {
                debug!("Evaluator receiver dropped");
                break;
            }
        }
    }
}

/// Current time on the tokio clock, so paused-time tests stay deterministic
fn clock() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
        }
        None => std::future::pending().await,
    }
}
