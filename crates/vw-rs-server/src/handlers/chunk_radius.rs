use std::sync::Arc;

use tracing::debug;
use vw_rs_proto::packets::{id, ChunkRadiusUpdated, Packet};

use super::{HandlerOutcome, PacketHandler};
use crate::server::Server;
use crate::session::PlayerSession;
use crate::transport::SessionHandle;

/// Client view distance request, clamped to the configured maximum.
pub struct ChunkRadiusHandler;

impl PacketHandler for ChunkRadiusHandler {
    fn packet_id(&self) -> u32 {
        id::REQUEST_CHUNK_RADIUS
    }

    fn handle(
        &self,
        packet: &Packet,
        session: Option<&Arc<PlayerSession>>,
        handle: SessionHandle,
        server: &Server,
    ) -> HandlerOutcome {
        let (Packet::RequestChunkRadius(request), Some(player)) = (packet, session) else {
            return HandlerOutcome::Unhandled;
        };
        if player.is_finalized() {
            return HandlerOutcome::Unhandled;
        }

        let max = server.config().world.max_view_distance;
        let radius = (request.chunk_radius.max(0) as u32).min(max);
        debug!(
            "{} on {handle} requested radius {}, granted {radius}",
            player.name(),
            request.chunk_radius
        );

        player.set_view_distance(radius);
        player.send(
            ChunkRadiusUpdated {
                chunk_radius: radius as i32,
            }
            .into(),
        );
        player.refresh_visibility(server.world());
        HandlerOutcome::Handled
    }
}
