use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use vw_rs_proto::packets::{id, Packet, PlayStatus, PlayStatusType, ResourcePacksInfo};

use super::{HandlerOutcome, PacketHandler};
use crate::registry::Registration;
use crate::server::Server;
use crate::session::{Identity, PlayerSession};
use crate::transport::SessionHandle;

/// Handshake progress for one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    AwaitingLogin,
    NameChecked,
    SessionCreated,
    CapabilitySent,
    Rejected,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeState::AwaitingLogin => "awaiting-login",
            HandshakeState::NameChecked => "name-checked",
            HandshakeState::SessionCreated => "session-created",
            HandshakeState::CapabilitySent => "capability-sent",
            HandshakeState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Turns a Login packet into a registered [`PlayerSession`].
///
/// The name check and the registry insert happen in one critical section, so
/// of several concurrent logins with the same name exactly one succeeds. A
/// duplicate name is rejected silently; a full server gets
/// `PlayStatus(FailedServerFull)` first.
pub struct LoginHandler;

impl LoginHandler {
    fn transition(
        handle: SessionHandle,
        from: HandshakeState,
        to: HandshakeState,
    ) -> HandshakeState {
        debug!("Handshake {handle}: {from} -> {to}");
        to
    }
}

impl PacketHandler for LoginHandler {
    fn packet_id(&self) -> u32 {
        id::LOGIN
    }

    fn handle(
        &self,
        packet: &Packet,
        session: Option<&Arc<PlayerSession>>,
        handle: SessionHandle,
        server: &Server,
    ) -> HandlerOutcome {
        let Packet::Login(login) = packet else {
            return HandlerOutcome::Unhandled;
        };
        let mut state = HandshakeState::AwaitingLogin;

        if let Some(existing) = session {
            warn!(
                "Login for {} on {handle}, already bound to {}",
                login.username,
                existing.name()
            );
            Self::transition(handle, state, HandshakeState::Rejected);
            return HandlerOutcome::Rejected;
        }
        if login.username.is_empty() {
            warn!("Login with empty username on {handle}");
            Self::transition(handle, state, HandshakeState::Rejected);
            return HandlerOutcome::Rejected;
        }

        let registration = server.registry().register_with(
            &login.username,
            handle,
            server.player_capacity(),
            || {
                state = Self::transition(handle, state, HandshakeState::NameChecked);
                let identity = Identity::from_login(login);
                let player = server.create_session(handle, identity);
                state = Self::transition(handle, state, HandshakeState::SessionCreated);
                player
            },
        );

        let player = match registration {
            Registration::Registered(player) => player,
            Registration::NameTaken => {
                info!("Rejected login for {}: name already in use", login.username);
                Self::transition(handle, state, HandshakeState::Rejected);
                return HandlerOutcome::Rejected;
            }
            Registration::HandleInUse => {
                warn!("Rejected login for {}: {handle} already bound", login.username);
                Self::transition(handle, state, HandshakeState::Rejected);
                return HandlerOutcome::Rejected;
            }
            Registration::Full => {
                info!("Rejected login for {}: server full", login.username);
                server.send(
                    handle,
                    PlayStatus::new(PlayStatusType::FailedServerFull).into(),
                );
                Self::transition(handle, state, HandshakeState::Rejected);
                return HandlerOutcome::Rejected;
            }
        };

        player.send(PlayStatus::new(PlayStatusType::LoginSuccess).into());
        player.send(ResourcePacksInfo::default().into());
        Self::transition(handle, state, HandshakeState::CapabilitySent);

        info!(
            "{} logged in on {handle} (entity {}, uuid {})",
            player.name(),
            player.entity_id(),
            player.identity().uuid()
        );
        HandlerOutcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Visible;
    use crate::test_support::TestServer;
    use std::sync::Barrier;
    use std::thread;
    use vw_rs_proto::packets::LoginPacket;

    #[test]
    fn login_sends_status_then_capabilities() {
        let test = TestServer::new();
        assert_eq!(test.login("Steve", 1), HandlerOutcome::Handled);

        let sent = test.transport.sent_to(SessionHandle(1));
        assert_eq!(
            sent,
            vec![
                Packet::PlayStatus(PlayStatus::new(PlayStatusType::LoginSuccess)),
                Packet::ResourcePacksInfo(ResourcePacksInfo::default()),
            ]
        );
        let player = test.server.registry().get_player_by_name("Steve").unwrap();
        assert_eq!(player.handle(), SessionHandle(1));
        assert!(!player.is_spawned());
        assert!(!player.is_finalized());
        assert!(!player.has_any_chunk_in_use());
    }

    #[test]
    fn duplicate_name_is_rejected_without_packets() {
        let test = TestServer::new();
        test.login("Steve", 1);
        test.transport.take();

        assert_eq!(test.login("Steve", 2), HandlerOutcome::Rejected);
        assert!(test.transport.sent_to(SessionHandle(2)).is_empty());
        assert_eq!(test.server.registry().len(), 1);
        assert!(test.server.registry().get_player_by_handle(SessionHandle(2)).is_none());
    }

    #[test]
    fn second_login_on_same_connection_is_rejected() {
        let test = TestServer::new();
        test.login("Steve", 1);
        assert_eq!(test.login("Alex", 1), HandlerOutcome::Rejected);
        assert!(test.server.registry().get_player_by_name("Alex").is_none());
    }

    #[test]
    fn full_server_reports_status() {
        let test = TestServer::with_config("[server]\nmax_players = 1\n");
        test.login("Steve", 1);

        assert_eq!(test.login("Alex", 2), HandlerOutcome::Rejected);
        assert_eq!(
            test.transport.sent_to(SessionHandle(2)),
            vec![Packet::PlayStatus(PlayStatus::new(
                PlayStatusType::FailedServerFull
            ))]
        );
    }

    #[test]
    fn empty_username_is_rejected() {
        let test = TestServer::new();
        assert_eq!(test.login("", 1), HandlerOutcome::Rejected);
        assert!(test.server.registry().is_empty());
    }

    #[test]
    fn concurrent_logins_admit_exactly_one() {
        let test = Arc::new(TestServer::new());
        let barrier = Arc::new(Barrier::new(2));
        let workers: Vec<_> = (1..=2u64)
            .map(|h| {
                let test = Arc::clone(&test);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    test.server.handle_packet(
                        SessionHandle(h),
                        LoginPacket::with_username("Steve").into(),
                    )
                })
            })
            .collect();
        let outcomes: Vec<HandlerOutcome> =
            workers.into_iter().map(|w| w.join().unwrap()).collect();

        assert_eq!(outcomes.iter().filter(|o| o.is_handled()).count(), 1);
        assert!(outcomes.contains(&HandlerOutcome::Rejected));
        assert_eq!(test.server.registry().len(), 1);
    }
}
