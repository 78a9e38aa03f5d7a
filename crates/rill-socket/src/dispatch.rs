//! Frame dispatch: decode, classify, fan out.
//!
//! Dispatch is synchronous and runs on the receive loop's task, so frames
//! from one connection are observed in arrival order. Fault isolation is
//! per-callback: a decode failure drops the frame, a callback failure is
//! logged and the remaining callbacks still run.

use std::sync::Arc;

use tracing::{debug, warn};

use rill_core::Packet;

use crate::protocol::WireProtocol;
use crate::registry::SubscriberRegistry;

/// What the session needs to know about a dispatched frame.
#[derive(Clone, Debug, Default)]
pub struct Dispatch {
    /// The frame answered an outstanding keep-alive.
    pub keepalive_reply: bool,
    /// The peer asked us to drop and re-establish the connection.
    pub reconnect_requested: bool,
    /// An immediate reply the peer expects, ready to send.
    pub reply: Option<String>,
}

/// Decodes inbound frames and fans them out to the registry.
pub struct Dispatcher {
    protocol: Arc<dyn WireProtocol>,
    registry: Arc<SubscriberRegistry>,
}

impl Dispatcher {
    /// Build a dispatcher over `protocol`, delivering to `registry`.
    #[must_use]
    pub fn new(protocol: Arc<dyn WireProtocol>, registry: Arc<SubscriberRegistry>) -> Self {
        Self { protocol, registry }
    }

    /// The registry this dispatcher delivers to.
    #[must_use]
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Decode `frame`, classify it, and invoke interested subscribers.
    ///
    /// An undecodable frame is logged and dropped — one bad frame never
    /// terminates the connection. Subscribers for the coarse discriminator
    /// (plus catch-alls) run first, then subscribers for the fine
    /// `"<kind>/<sub>"` key when the shape refines further, all in
    /// registration order.
    pub fn dispatch(&self, frame: &str) -> Dispatch {
        let packet = match self.protocol.decode(frame) {
            Ok(packet) => packet,
            Err(err) => {
                warn!(protocol = self.protocol.name(), %err, "dropping undecodable frame");
                return Dispatch::default();
            }
        };

        let outcome = Dispatch {
            keepalive_reply: self.protocol.is_keepalive_reply(&packet),
            reconnect_requested: self.protocol.wants_reconnect(&packet),
            reply: self.protocol.reply_for(&packet),
        };

        let kind = packet.discriminator().to_string();
        debug!(protocol = self.protocol.name(), %kind, "dispatching packet");
        self.fan_out(&kind, true, &packet);
        if let Some(sub) = packet.sub_discriminator() {
            self.fan_out(&format!("{kind}/{sub}"), false, &packet);
        }
        outcome
    }

    fn fan_out(&self, key: &str, include_all: bool, packet: &Packet) {
        for (id, handler) in self.registry.handlers_for(key, include_all) {
            if let Err(err) = handler(packet) {
                warn!(?id, %key, %err, "subscriber callback failed");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
