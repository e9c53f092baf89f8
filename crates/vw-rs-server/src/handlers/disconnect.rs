use std::sync::Arc;

use tracing::info;
use vw_rs_proto::packets::{id, Packet};

use super::{HandlerOutcome, PacketHandler};
use crate::server::Server;
use crate::session::PlayerSession;
use crate::transport::SessionHandle;

/// Client-initiated disconnect.
pub struct DisconnectHandler;

impl PacketHandler for DisconnectHandler {
    fn packet_id(&self) -> u32 {
        id::DISCONNECT
    }

    fn handle(
        &self,
        packet: &Packet,
        session: Option<&Arc<PlayerSession>>,
        handle: SessionHandle,
        server: &Server,
    ) -> HandlerOutcome {
        let (Packet::Disconnect(disconnect), Some(player)) = (packet, session) else {
            return HandlerOutcome::Unhandled;
        };
        info!(
            "{} on {handle} disconnected: {}",
            player.name(),
            disconnect.message
        );
        server.remove_player(player);
        HandlerOutcome::Handled
    }
}
