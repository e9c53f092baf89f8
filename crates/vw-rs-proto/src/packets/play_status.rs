//! PlayStatus (0x02): Server → Client.

/// Status codes for the PlayStatus packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PlayStatusType {
    /// Login accepted.
    LoginSuccess = 0,
    /// Client is too old (needs update).
    FailedClient = 1,
    /// Server is too old.
    FailedServer = 2,
    /// Player can spawn into the world.
    PlayerSpawn = 3,
    /// Server is full.
    FailedServerFull = 7,
}

/// Sent by the server to indicate login result or player spawn readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayStatus {
    pub status: PlayStatusType,
}

impl PlayStatus {
    pub fn new(status: PlayStatusType) -> Self {
        Self { status }
    }
}
