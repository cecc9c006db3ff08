// aptag-netconf: async NETCONF client for Catalyst wireless controllers
//
// `framing` and `message` are transport-agnostic; `session` runs the
// protocol over any async byte stream; `ssh` supplies the stream from an
// SSH `netconf` subsystem channel.

pub mod error;
pub mod framing;
pub mod message;
pub mod session;
pub mod ssh;
pub mod transport;

pub use error::Error;
pub use framing::Framing;
pub use message::{Datastore, RpcError, RpcReply, ServerHello};
pub use session::NetconfSession;
pub use ssh::{SshCredentials, SshSession, SshTarget};
pub use transport::{HostKeyPolicy, NETCONF_PORT, TransportConfig};
