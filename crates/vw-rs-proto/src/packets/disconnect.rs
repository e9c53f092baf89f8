//! Disconnect (0x05): Bidirectional.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disconnect {
    pub hide_disconnect_screen: bool,
    pub message: String,
}
