//! Connection state: handshake authentication, per-connection records, and
//! the presence registry that indexes them by user.

pub mod authenticator;
pub mod record;
pub mod registry;

pub use authenticator::{AuthenticatedConnection, ConnectionAuthenticator};
pub use record::ConnectionRecord;
pub use registry::{PresenceRegistry, Removed, SharedRegistry};
