//! Typed packet values and shared protocol types.
//!
//! Byte-level encoding lives in the transport's codec; the server core only
//! ever sees the values defined here.

pub mod packets;
pub mod types;
