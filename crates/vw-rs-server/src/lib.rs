//! Session protocol and chunk visibility core of a voxel-world server.
//!
//! A transport adapter feeds decoded packets in as
//! [`transport::TransportEvent`]s; the [`server::Server`] dispatches them to
//! handlers that mutate [`session::PlayerSession`]s and the
//! [`registry::PlayerRegistry`], and emits packets back through the
//! [`transport::Transport`]. [`runtime::run`] drives the world tick.

pub mod config;
pub mod error;
pub mod handlers;
pub mod permissions;
pub mod registry;
pub mod runtime;
pub mod server;
pub mod session;
pub mod transport;

pub use config::ServerConfig;
pub use error::ConfigError;
pub use handlers::{Dispatcher, HandlerOutcome, PacketHandler};
pub use registry::PlayerRegistry;
pub use server::Server;
pub use session::{Movable, Permissible, PlayerSession, Visible};
pub use transport::{SessionHandle, Transport, TransportEvent};
