// aptag-core: AP tag provisioning pipeline
//
// Turns AP announcements into NETCONF edit-config + save-config runs
// against Catalyst 9800 controllers. The bus and the NETCONF transport
// sit behind the `MessageSource` and `SessionManager` traits.

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lookup;
pub mod model;
pub mod payload;
pub mod provisioner;
pub mod session;

pub use backend::NetconfSessionManager;
pub use config::{
    Credentials, HostKeyVerification, NETCONF_PORT, ProvisionerConfig, SessionSettings,
    SubscriptionConfig, WirelessController,
};
pub use dispatch::{ChannelSource, Dispatcher, MessageSource};
pub use error::ProvisionError;
pub use model::{ControllerAddress, InboundEvent, TagTriple};
pub use payload::{COMMIT_REQUEST, ConfigPayload, build_edit_payload, commit_request};
pub use provisioner::{
    CommitStatus, EditStatus, ProvisionOutcome, ProvisionReport, Provisioner, Step,
};
pub use session::{CommitReply, ControllerSession, EditReply, Reply, SessionManager};

pub use aptag_netconf::Datastore;
