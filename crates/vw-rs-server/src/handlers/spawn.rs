use std::sync::Arc;

use tracing::warn;
use vw_rs_proto::packets::{id, Packet};

use super::{HandlerOutcome, PacketHandler};
use crate::server::Server;
use crate::session::PlayerSession;
use crate::transport::SessionHandle;

/// The client finished loading; the player becomes visible in the world.
pub struct SpawnHandler;

impl PacketHandler for SpawnHandler {
    fn packet_id(&self) -> u32 {
        id::SET_LOCAL_PLAYER_AS_INITIALIZED
    }

    fn handle(
        &self,
        packet: &Packet,
        session: Option<&Arc<PlayerSession>>,
        handle: SessionHandle,
        server: &Server,
    ) -> HandlerOutcome {
        let (Packet::SetLocalPlayerAsInitialized(init), Some(player)) = (packet, session) else {
            return HandlerOutcome::Unhandled;
        };
        if init.entity_runtime_id != player.runtime_id() {
            warn!(
                "{} on {handle} initialized runtime id {}, expected {}",
                player.name(),
                init.entity_runtime_id,
                player.runtime_id()
            );
            return HandlerOutcome::Rejected;
        }
        if server.spawn_player(player) {
            HandlerOutcome::Handled
        } else {
            HandlerOutcome::Unhandled
        }
    }
}
