//! Packet dispatch.
//!
//! One stateless [`PacketHandler`] per packet id. Everything a handler mutates
//! lives on the [`PlayerSession`], the registry or the [`Server`].

mod chunk_radius;
mod disconnect;
mod login;
mod movement;
mod skin;
mod spawn;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use vw_rs_proto::packets::Packet;

use crate::server::Server;
use crate::session::PlayerSession;
use crate::transport::SessionHandle;

pub use chunk_radius::ChunkRadiusHandler;
pub use disconnect::DisconnectHandler;
pub use login::{HandshakeState, LoginHandler};
pub use movement::MovementHandler;
pub use skin::PlayerSkinHandler;
pub use spawn::SpawnHandler;

/// Result of dispatching one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Handled,
    /// No handler for the packet, or it does not apply in the current state.
    /// Non-fatal; the connection stays open.
    Unhandled,
    /// The packet was understood and refused. The caller decides what happens
    /// to the connection.
    Rejected,
}

impl HandlerOutcome {
    pub fn is_handled(self) -> bool {
        self == HandlerOutcome::Handled
    }
}

pub trait PacketHandler: Send + Sync {
    fn packet_id(&self) -> u32;

    /// `session` is the player bound to `handle`, if the handshake completed.
    fn handle(
        &self,
        packet: &Packet,
        session: Option<&Arc<PlayerSession>>,
        handle: SessionHandle,
        server: &Server,
    ) -> HandlerOutcome;
}

#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<u32, Box<dyn PacketHandler>>,
}

impl Dispatcher {
    /// An empty dispatcher. Every packet is unhandled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Login plus the gameplay handlers.
    pub fn with_default_handlers() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Box::new(LoginHandler));
        dispatcher.register(Box::new(MovementHandler));
        dispatcher.register(Box::new(ChunkRadiusHandler));
        dispatcher.register(Box::new(PlayerSkinHandler));
        dispatcher.register(Box::new(SpawnHandler));
        dispatcher.register(Box::new(DisconnectHandler));
        dispatcher
    }

    /// Registers `handler` for its packet id, returning the one it replaced.
    pub fn register(
        &mut self,
        handler: Box<dyn PacketHandler>,
    ) -> Option<Box<dyn PacketHandler>> {
        self.handlers.insert(handler.packet_id(), handler)
    }

    pub fn is_registered(&self, packet_id: u32) -> bool {
        self.handlers.contains_key(&packet_id)
    }

    pub fn dispatch(
        &self,
        packet: &Packet,
        session: Option<&Arc<PlayerSession>>,
        handle: SessionHandle,
        server: &Server,
    ) -> HandlerOutcome {
        let packet_id = packet.id();
        match self.handlers.get(&packet_id) {
            Some(handler) => handler.handle(packet, session, handle, server),
            None => {
                debug!("Unhandled packet 0x{packet_id:02X} from {handle}");
                HandlerOutcome::Unhandled
            }
        }
    }
}
