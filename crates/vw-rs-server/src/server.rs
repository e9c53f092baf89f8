//! Server-wide context handed to every packet handler.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use vw_rs_proto::packets::{Packet, PlayStatus, PlayStatusType, RemoveEntity};
use vw_rs_proto::types::Vec3;
use vw_rs_world::{chunk_index, ChunkProvider};

use crate::config::ServerConfig;
use crate::handlers::{Dispatcher, HandlerOutcome};
use crate::permissions::PermissionManager;
use crate::registry::PlayerRegistry;
use crate::session::{Identity, PlayerSession, Visible};
use crate::transport::{SessionHandle, Transport, TransportEvent};

pub struct Server {
    config: ServerConfig,
    registry: PlayerRegistry,
    permissions: PermissionManager,
    world: Arc<dyn ChunkProvider>,
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    next_entity_id: AtomicI64,
    current_tick: AtomicU64,
}

impl Server {
    pub fn new(
        config: ServerConfig,
        world: Arc<dyn ChunkProvider>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let permissions = PermissionManager::from_config(&config.permissions);
        Self {
            config,
            registry: PlayerRegistry::new(),
            permissions,
            world,
            transport,
            dispatcher: Dispatcher::with_default_handlers(),
            next_entity_id: AtomicI64::new(1),
            current_tick: AtomicU64::new(0),
        }
    }

    /// Replaces the default handler table.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn permissions(&self) -> &PermissionManager {
        &self.permissions
    }

    pub fn world(&self) -> &dyn ChunkProvider {
        self.world.as_ref()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn send(&self, handle: SessionHandle, packet: Packet) {
        self.transport.send(handle, packet);
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::Relaxed)
    }

    pub fn players_count(&self) -> usize {
        self.registry.len()
    }

    /// Registry capacity; `max_players = 0` means unlimited.
    pub fn player_capacity(&self) -> usize {
        match self.config.server.max_players {
            0 => usize::MAX,
            max => max,
        }
    }

    /// Builds an unregistered session at the world spawn with the default
    /// group and view distance.
    pub(crate) fn create_session(
        &self,
        handle: SessionHandle,
        identity: Identity,
    ) -> Arc<PlayerSession> {
        let entity_id = self.next_entity_id.fetch_add(1, Ordering::Relaxed);
        let [x, y, z] = self.config.world.spawn;
        Arc::new(PlayerSession::new(
            handle,
            entity_id,
            identity,
            self.permissions.default_group(),
            Vec3::new(x, y, z),
            self.config.world.default_view_distance,
            Arc::clone(&self.transport),
        ))
    }

    pub fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Connected(handle) => {
                debug!("Connection opened: {handle}");
            }
            TransportEvent::Packet(handle, packet) => {
                let is_login = matches!(packet, Packet::Login(_));
                let outcome = self.handle_packet(handle, packet);
                // A refused handshake leaves nothing bound to the handle.
                if is_login
                    && outcome == HandlerOutcome::Rejected
                    && self.registry.get_player_by_handle(handle).is_none()
                {
                    self.transport.close(handle, "Login rejected");
                }
            }
            TransportEvent::Disconnected(handle) => {
                self.disconnect(handle);
            }
        }
    }

    /// Inbound delivery: dispatches `packet` with the session bound to `handle`.
    pub fn handle_packet(&self, handle: SessionHandle, packet: Packet) -> HandlerOutcome {
        let session = self.registry.get_player_by_handle(handle);
        self.dispatcher.dispatch(&packet, session.as_ref(), handle, self)
    }

    /// Tears down whatever session is bound to `handle`.
    pub fn disconnect(&self, handle: SessionHandle) -> bool {
        match self.registry.get_player_by_handle(handle) {
            Some(session) => self.remove_player(&session),
            None => {
                debug!("Connection closed without a session: {handle}");
                false
            }
        }
    }

    /// Finalizes `session`, releases its chunks, despawns it from every
    /// spawned peer that sees its chunk and unbinds it from the registry.
    /// Runs under the registry write lock. Returns `false` if the session was
    /// already removed.
    pub fn remove_player(&self, session: &Arc<PlayerSession>) -> bool {
        let despawned = self.registry.remove_session_with(session, |peers| {
            let finalized = session.finalize()?;
            let mut despawned = 0;
            if finalized.was_spawned {
                let index = chunk_index(finalized.anchor.x, finalized.anchor.z);
                let packet: Packet = RemoveEntity {
                    entity_unique_id: session.entity_id(),
                }
                .into();
                for peer in peers {
                    if peer.is_spawned() && peer.has_chunk_in_use(index) {
                        peer.send(packet.clone());
                        despawned += 1;
                    }
                }
            }
            Some(despawned)
        });
        match despawned {
            Some(peers) => {
                info!(
                    "{} left the game ({} players online, despawned for {peers})",
                    session.name(),
                    self.registry.len()
                );
                true
            }
            None => false,
        }
    }

    /// Makes the player visible: initial chunk load, attribute sync, then
    /// `PlayStatus(PlayerSpawn)`. Returns `false` if already spawned, or if
    /// the session is removed before the spawn completes.
    pub fn spawn_player(&self, session: &Arc<PlayerSession>) -> bool {
        if !session.set_spawned() {
            return false;
        }
        let (_, loaded) = session.refresh_visibility(self.world());
        if session.is_finalized() {
            debug!("{} was removed while spawning", session.name());
            return false;
        }
        session.update_attributes();
        session.send(PlayStatus::new(PlayStatusType::PlayerSpawn).into());
        info!(
            "{} spawned at {} ({loaded} chunks)",
            session.name(),
            session.chunk_pos()
        );
        true
    }

    /// Moves the player into another permission group. Returns `false` for
    /// unknown groups.
    pub fn set_permission_group(&self, session: &PlayerSession, group: &str) -> bool {
        match self.permissions.group(group) {
            Some(group) => {
                session.set_permission_group(group);
                true
            }
            None => {
                warn!("Unknown permission group {group} for {}", session.name());
                false
            }
        }
    }

    /// One world tick: entity tick and attribute resync for every session.
    pub fn tick(&self) -> u64 {
        let tick = self.current_tick.fetch_add(1, Ordering::Relaxed) + 1;
        let interval = self.config.world.attribute_sync_interval;
        for player in self.registry.players() {
            player.tick(tick, interval);
        }
        tick
    }

    /// Removes every session and closes its connection.
    pub fn shutdown(&self) {
        let players = self.registry.players();
        info!("Shutting down, removing {} players", players.len());
        for player in players {
            self.remove_player(&player);
            self.transport.close(player.handle(), "Server closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::Permission;
    use crate::session::{visibility, Movable, Permissible};
    use crate::test_support::TestServer;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;
    use vw_rs_proto::packets::{LoginPacket, UpdateAttributes};
    use vw_rs_proto::types::{ChunkPos, Rotation};
    use vw_rs_world::Chunk;

    fn despawns(test: &TestServer, handle: u64, entity: i64) -> usize {
        test.transport
            .sent_to(SessionHandle(handle))
            .iter()
            .filter(|p| {
                **p == Packet::RemoveEntity(RemoveEntity {
                    entity_unique_id: entity,
                })
            })
            .count()
    }

    #[test]
    fn spawn_loads_chunks_and_attributes() {
        let test = TestServer::with_config("[world]\ndefault_view_distance = 2\n");
        let player = test.login_player("Steve", 1);
        test.transport.take();

        assert!(test.server.spawn_player(&player));
        assert!(player.is_spawned());
        assert_eq!(player.tracked_chunk_count(), 13);

        let sent = test.transport.sent_to(SessionHandle(1));
        assert!(matches!(sent.first(), Some(Packet::LevelChunk(_))));
        assert!(matches!(sent[13], Packet::UpdateAttributes(UpdateAttributes { .. })));
        assert_eq!(
            sent.last(),
            Some(&Packet::PlayStatus(PlayStatus::new(PlayStatusType::PlayerSpawn)))
        );
        assert!(!test.server.spawn_player(&player));
    }

    #[test]
    fn removal_despawns_for_watching_peers_once() {
        let test = TestServer::with_config("[world]\ndefault_view_distance = 2\n");
        let steve = test.login_player("Steve", 1);
        let alex = test.login_player("Alex", 2);
        let far = test.login_player("Faraway", 3);
        for player in [&steve, &alex, &far] {
            test.server.spawn_player(player);
        }
        let world = test.server.world();
        far.sync_move(Vec3::new(800.0, 5.0, 0.0), Rotation::ZERO, true, world);
        test.transport.take();

        assert!(test.server.remove_player(&steve));
        assert!(!test.server.remove_player(&steve));
        assert!(!test.server.disconnect(SessionHandle(1)));

        assert_eq!(despawns(&test, 2, steve.entity_id()), 1);
        assert_eq!(despawns(&test, 3, steve.entity_id()), 0);
        assert!(steve.is_finalized());
        assert!(!steve.has_any_chunk_in_use());
        assert!(test
            .world
            .column(0, 0)
            .unwrap()
            .viewers()
            .iter()
            .all(|v| *v != steve.viewer_id()));
        assert_eq!(test.server.players_count(), 2);
    }

    #[test]
    fn removal_during_spawn_sends_nothing() {
        let test = TestServer::with_config("[world]\ndefault_view_distance = 2\n");
        let steve = test.login_player("Steve", 1);
        test.transport.take();

        let server = Arc::clone(&test.server);
        let target = Arc::clone(&steve);
        test.provider.on_next_fetch(move || {
            server.remove_player(&target);
        });

        assert!(!test.server.spawn_player(&steve));
        assert!(steve.is_finalized());
        assert!(!steve.is_spawned());
        assert!(!steve.has_any_chunk_in_use());
        assert!(test.transport.sent_to(SessionHandle(1)).is_empty());
        for pos in visibility::chunks_in_range(ChunkPos::new(0, 0), 2) {
            let column = test.world.column(pos.x, pos.z).unwrap();
            assert!(!column.has_viewer(steve.viewer_id()));
        }
    }

    #[test]
    fn teardown_races_visibility_passes() {
        for _ in 0..20 {
            let test = TestServer::with_config("[world]\ndefault_view_distance = 2\n");
            let steve = test.login_player("Steve", 1);
            let alex = test.login_player("Alex", 2);
            test.server.spawn_player(&steve);
            test.server.spawn_player(&alex);
            test.transport.take();

            let moves = Arc::new(AtomicUsize::new(0));
            let barrier = Arc::new(Barrier::new(2));

            let mover = {
                let server = Arc::clone(&test.server);
                let steve = Arc::clone(&steve);
                let moves = Arc::clone(&moves);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    // Stays inside chunks (0, 0) and (1, 0), both watched by Alex.
                    for step in 0..10_000u32 {
                        let x = (step % 32) as f32;
                        let position = Vec3::new(x, 5.0, 8.0);
                        if !steve.sync_move(position, Rotation::ZERO, true, server.world()) {
                            break;
                        }
                        steve.set_view_distance(1 + step % 3);
                        steve.refresh_visibility(server.world());
                        moves.fetch_add(1, Ordering::SeqCst);
                    }
                })
            };
            let remover = {
                let server = Arc::clone(&test.server);
                let steve = Arc::clone(&steve);
                let moves = Arc::clone(&moves);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    while moves.load(Ordering::SeqCst) < 20 {
                        thread::yield_now();
                    }
                    server.remove_player(&steve)
                })
            };
            mover.join().unwrap();
            assert!(remover.join().unwrap());
            assert!(!test.server.remove_player(&steve));

            assert!(steve.is_finalized());
            assert!(!steve.has_any_chunk_in_use());
            for x in -4..=5 {
                for z in -4..=4 {
                    let column = test.world.column(x, z).unwrap();
                    assert!(!column.has_viewer(steve.viewer_id()), "({x}, {z})");
                }
            }
            assert_eq!(despawns(&test, 2, steve.entity_id()), 1);
            assert!(!steve.sync_move(Vec3::ZERO, Rotation::ZERO, true, test.server.world()));
        }
    }

    #[test]
    fn unspawned_removal_sends_no_despawn() {
        let test = TestServer::new();
        let steve = test.login_player("Steve", 1);
        let alex = test.login_player("Alex", 2);
        test.server.spawn_player(&alex);
        test.transport.take();

        assert!(test.server.remove_player(&steve));
        assert_eq!(despawns(&test, 2, steve.entity_id()), 0);
    }

    #[test]
    fn name_is_free_after_removal() {
        let test = TestServer::new();
        test.login("Steve", 1);
        test.server.disconnect(SessionHandle(1));
        assert_eq!(test.login("Steve", 2), HandlerOutcome::Handled);
    }

    #[test]
    fn rejected_login_event_closes_connection() {
        let test = TestServer::new();
        test.login("Steve", 1);
        test.server.handle_event(TransportEvent::Packet(
            SessionHandle(2),
            LoginPacket::with_username("Steve").into(),
        ));
        assert_eq!(test.transport.closed(), vec![SessionHandle(2)]);

        // A second login on a live connection leaves it open.
        test.server.handle_event(TransportEvent::Packet(
            SessionHandle(1),
            LoginPacket::with_username("Alex").into(),
        ));
        assert_eq!(test.transport.closed(), vec![SessionHandle(2)]);
    }

    #[test]
    fn disconnect_event_removes_player() {
        let test = TestServer::new();
        test.server.handle_event(TransportEvent::Connected(SessionHandle(1)));
        test.login("Steve", 1);
        test.server.handle_event(TransportEvent::Disconnected(SessionHandle(1)));
        assert!(test.server.registry().is_empty());
        test.server.handle_event(TransportEvent::Disconnected(SessionHandle(1)));
    }

    #[test]
    fn entity_ids_are_unique() {
        let test = TestServer::new();
        let steve = test.login_player("Steve", 1);
        let alex = test.login_player("Alex", 2);
        assert_ne!(steve.entity_id(), alex.entity_id());
    }

    #[test]
    fn fly_permission_follows_override() {
        let test = TestServer::new();
        let steve = test.login_player("Steve", 1);

        assert!(!steve.has_permission("fly"));
        assert!(!steve.add_permission(Permission::new("fly")));
        assert!(steve.has_permission("fly"));
        assert!(steve.remove_permission("fly"));
        assert!(!steve.has_permission("fly"));
        assert!(!steve.remove_permission("fly"));
    }

    #[test]
    fn permission_group_switch() {
        let test = TestServer::with_config(
            r#"
[permissions]
default_group = "member"

[[permissions.groups]]
name = "member"
permissions = ["chat"]

[[permissions.groups]]
name = "operator"
permissions = ["fly"]
inherits = "member"
"#,
        );
        let steve = test.login_player("Steve", 1);
        assert!(steve.has_permission("chat"));
        assert!(!steve.has_permission("fly"));

        assert!(test.server.set_permission_group(&steve, "operator"));
        assert!(steve.has_permission("fly"));
        assert!(steve.has_permission("chat"));
        assert!(!test.server.set_permission_group(&steve, "admin"));
    }

    #[test]
    fn tick_resyncs_spawned_players() {
        let test = TestServer::with_config("[world]\nattribute_sync_interval = 2\n");
        let steve = test.login_player("Steve", 1);
        test.login_player("Alex", 2);
        test.server.spawn_player(&steve);
        test.transport.take();

        assert_eq!(test.server.tick(), 1);
        assert_eq!(test.server.tick(), 2);
        assert_eq!(test.server.current_tick(), 2);
        assert_eq!(test.transport.sent_to(SessionHandle(1)).len(), 1);
        assert!(test.transport.sent_to(SessionHandle(2)).is_empty());
    }

    #[test]
    fn shutdown_removes_everyone() {
        let test = TestServer::new();
        test.login("Steve", 1);
        test.login("Alex", 2);
        test.server.shutdown();
        assert!(test.server.registry().is_empty());
        let mut closed = test.transport.closed();
        closed.sort_by_key(|h| h.0);
        assert_eq!(closed, vec![SessionHandle(1), SessionHandle(2)]);
    }

    #[test]
    fn teleport_moves_view() {
        let test = TestServer::new();
        let steve = test.login_player("Steve", 1);
        let target = Vec3::new(-40.0, 64.0, 40.0);
        steve.teleport(target, Rotation::ZERO, test.server.world());
        assert_eq!(steve.chunk_pos(), ChunkPos::new(-3, 2));
    }
}
