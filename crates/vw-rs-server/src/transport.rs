//! The seam between the core and the network transport.
//!
//! The transport adapter decodes wire bytes into [`Packet`] values and feeds
//! them in as [`TransportEvent`]s; everything the core sends goes back out
//! through [`Transport::send`].

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use vw_rs_proto::packets::Packet;

/// Opaque identifier of one transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(pub u64);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Events delivered by the transport adapter.
#[derive(Debug)]
pub enum TransportEvent {
    Connected(SessionHandle),
    Packet(SessionHandle, Packet),
    Disconnected(SessionHandle),
}

/// Outbound side of the transport. Implementations must not block: the core
/// calls these while holding session locks.
pub trait Transport: Send + Sync {
    fn send(&self, handle: SessionHandle, packet: Packet);

    /// Ask the adapter to close the connection.
    fn close(&self, handle: SessionHandle, reason: &str);
}

/// Command queued for the transport adapter.
#[derive(Debug)]
pub enum TransportCommand {
    Send { handle: SessionHandle, packet: Packet },
    Close { handle: SessionHandle, reason: String },
}

/// A [`Transport`] that queues commands on an unbounded channel drained by
/// the adapter task.
pub struct ChannelTransport {
    command_tx: mpsc::UnboundedSender<TransportCommand>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportCommand>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        (Self { command_tx }, command_rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, handle: SessionHandle, packet: Packet) {
        // A closed channel means the adapter is gone; nothing left to deliver to.
        let _ = self
            .command_tx
            .send(TransportCommand::Send { handle, packet });
    }

    fn close(&self, handle: SessionHandle, reason: &str) {
        let _ = self.command_tx.send(TransportCommand::Close {
            handle,
            reason: reason.to_string(),
        });
    }
}

/// A [`Transport`] that records everything it is asked to do.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(SessionHandle, Packet)>>,
    closed: Mutex<Vec<SessionHandle>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Packets sent to `handle`, in order.
    pub fn sent_to(&self, handle: SessionHandle) -> Vec<Packet> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drains and returns everything sent so far.
    pub fn take(&self) -> Vec<(SessionHandle, Packet)> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn closed(&self) -> Vec<SessionHandle> {
        self.closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, handle: SessionHandle, packet: Packet) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((handle, packet));
    }

    fn close(&self, handle: SessionHandle, _reason: &str) {
        self.closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vw_rs_proto::packets::{PlayStatus, PlayStatusType};

    #[test]
    fn channel_transport_queues_commands() {
        let (transport, mut rx) = ChannelTransport::new();
        transport.send(
            SessionHandle(1),
            PlayStatus::new(PlayStatusType::LoginSuccess).into(),
        );
        transport.close(SessionHandle(1), "bye");

        match rx.try_recv().unwrap() {
            TransportCommand::Send { handle, packet } => {
                assert_eq!(handle, SessionHandle(1));
                assert_eq!(packet.id(), vw_rs_proto::packets::id::PLAY_STATUS);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        match rx.try_recv().unwrap() {
            TransportCommand::Close { handle, reason } => {
                assert_eq!(handle, SessionHandle(1));
                assert_eq!(reason, "bye");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn channel_transport_ignores_dropped_receiver() {
        let (transport, rx) = ChannelTransport::new();
        drop(rx);
        transport.send(SessionHandle(1), Packet::Unknown { id: 1 });
    }

    #[test]
    fn recording_transport_filters_by_handle() {
        let transport = RecordingTransport::new();
        transport.send(SessionHandle(1), Packet::Unknown { id: 1 });
        transport.send(SessionHandle(2), Packet::Unknown { id: 2 });
        transport.send(SessionHandle(1), Packet::Unknown { id: 3 });
        let ids: Vec<u32> = transport
            .sent_to(SessionHandle(1))
            .iter()
            .map(|p| p.id())
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(transport.take().len(), 3);
        assert_eq!(transport.sent_count(), 0);
    }
}
