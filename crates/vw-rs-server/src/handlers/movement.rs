use std::sync::Arc;

use tracing::warn;
use vw_rs_proto::packets::{id, MoveMode, MovePlayer, Packet};

use super::{HandlerOutcome, PacketHandler};
use crate::server::Server;
use crate::session::{Movable, PlayerSession};
use crate::transport::SessionHandle;

/// Client position sync. Drives the visibility passes.
pub struct MovementHandler;

impl PacketHandler for MovementHandler {
    fn packet_id(&self) -> u32 {
        id::MOVE_PLAYER
    }

    fn handle(
        &self,
        packet: &Packet,
        session: Option<&Arc<PlayerSession>>,
        handle: SessionHandle,
        server: &Server,
    ) -> HandlerOutcome {
        let (Packet::MovePlayer(movement), Some(player)) = (packet, session) else {
            return HandlerOutcome::Unhandled;
        };

        if !movement.position.is_finite() {
            warn!("Invalid position (NaN/Inf) from {} on {handle}", player.name());
            let correction = MovePlayer {
                mode: MoveMode::Reset,
                ..MovePlayer::normal(
                    player.runtime_id(),
                    player.position(),
                    player.rotation(),
                    player.on_ground(),
                )
            };
            player.send(correction.into());
            return HandlerOutcome::Rejected;
        }

        if player.sync_move(
            movement.position,
            movement.rotation,
            movement.on_ground,
            server.world(),
        ) {
            HandlerOutcome::Handled
        } else {
            HandlerOutcome::Unhandled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Visible;
    use crate::test_support::TestServer;
    use vw_rs_proto::types::{ChunkPos, Rotation, Vec3};

    fn move_to(x: f32, z: f32) -> Packet {
        MovePlayer::normal(1, Vec3::new(x, 5.0, z), Rotation::ZERO, true).into()
    }

    #[test]
    fn movement_without_session_is_unhandled() {
        let test = TestServer::new();
        let outcome = test.server.handle_packet(SessionHandle(9), move_to(0.0, 0.0));
        assert_eq!(outcome, HandlerOutcome::Unhandled);
    }

    #[test]
    fn movement_updates_visibility() {
        let test = TestServer::with_config("[world]\ndefault_view_distance = 2\n");
        let player = test.login_player("Steve", 1);

        let outcome = test.server.handle_packet(SessionHandle(1), move_to(0.5, 0.5));
        assert_eq!(outcome, HandlerOutcome::Handled);
        assert_eq!(player.tracked_chunk_count(), 13);

        test.server.handle_packet(SessionHandle(1), move_to(80.5, 0.5));
        assert_eq!(player.chunk_pos(), ChunkPos::new(5, 0));
        assert_eq!(player.tracked_chunk_count(), 13);
        assert!(!player.sees_chunk(ChunkPos::new(0, 0)));
    }

    #[test]
    fn non_finite_position_is_corrected() {
        let test = TestServer::new();
        let player = test.login_player("Steve", 1);
        test.transport.take();

        let outcome = test
            .server
            .handle_packet(SessionHandle(1), move_to(f32::NAN, 0.0));
        assert_eq!(outcome, HandlerOutcome::Rejected);
        assert!(player.position().is_finite());
        match test.transport.sent_to(SessionHandle(1)).as_slice() {
            [Packet::MovePlayer(mv)] => assert_eq!(mv.mode, MoveMode::Reset),
            other => panic!("expected one correction, got {other:?}"),
        }
    }

    #[test]
    fn movement_after_removal_is_unhandled() {
        let test = TestServer::new();
        let player = test.login_player("Steve", 1);
        test.server.remove_player(&player);

        assert!(!player.sync_move(Vec3::ZERO, Rotation::ZERO, true, test.server.world()));
        assert!(!player.has_any_chunk_in_use());
    }
}
