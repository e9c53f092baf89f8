use std::sync::Arc;

use tracing::debug;
use vw_rs_proto::packets::{id, Packet, PlayerSkin};

use super::{HandlerOutcome, PacketHandler};
use crate::server::Server;
use crate::session::{PlayerSession, Visible};
use crate::transport::SessionHandle;

/// Appearance change. Stored on the identity and relayed to spawned peers.
pub struct PlayerSkinHandler;

impl PacketHandler for PlayerSkinHandler {
    fn packet_id(&self) -> u32 {
        id::PLAYER_SKIN
    }

    fn handle(
        &self,
        packet: &Packet,
        session: Option<&Arc<PlayerSession>>,
        handle: SessionHandle,
        server: &Server,
    ) -> HandlerOutcome {
        let (Packet::PlayerSkin(change), Some(player)) = (packet, session) else {
            return HandlerOutcome::Unhandled;
        };
        if player.is_finalized() {
            return HandlerOutcome::Unhandled;
        }

        player.set_skin(change.skin.clone());
        debug!(
            "{} on {handle} changed skin to {}",
            player.name(),
            change.skin.skin_id
        );

        // Relay with the server-side uuid, never the one the client claims.
        let relay: Packet = PlayerSkin {
            uuid: player.identity().uuid(),
            ..change.clone()
        }
        .into();
        for peer in server.registry().players() {
            if Arc::ptr_eq(&peer, player) || !peer.is_spawned() {
                continue;
            }
            peer.send(relay.clone());
        }
        HandlerOutcome::Handled
    }
}
