// ── NETCONF-over-SSH session backend ──

use async_trait::async_trait;
use tracing::debug;

use aptag_netconf::{
    Datastore, HostKeyPolicy, RpcReply, SshCredentials, SshSession, SshTarget, TransportConfig,
};

use crate::config::{Credentials, HostKeyVerification, SessionSettings};
use crate::error::ProvisionError;
use crate::model::ControllerAddress;
use crate::provisioner::Step;
use crate::session::{CommitReply, ControllerSession, EditReply, Reply, SessionManager};

/// Opens a fresh SSH `netconf` subsystem session for every run.
pub struct NetconfSessionManager {
    credentials: SshCredentials,
    transport: TransportConfig,
}

impl NetconfSessionManager {
    pub fn new(credentials: &Credentials, settings: &SessionSettings) -> Self {
        let host_keys = match settings.host_keys {
            HostKeyVerification::AcceptUnpinned => HostKeyPolicy::AcceptUnknown,
            HostKeyVerification::PinnedOnly => HostKeyPolicy::PinnedOnly,
        };
        Self {
            credentials: SshCredentials {
                username: credentials.username.clone(),
                password: credentials.password.clone(),
            },
            transport: TransportConfig {
                host_keys,
                connect_timeout: settings.timeout,
                ..TransportConfig::default()
            },
        }
    }
}

#[async_trait]
impl SessionManager for NetconfSessionManager {
    async fn open(
        &self,
        target: &ControllerAddress,
    ) -> Result<Box<dyn ControllerSession>, ProvisionError> {
        let ssh_target = SshTarget {
            address: &target.address,
            port: target.port,
            host_key: target.host_key.as_deref(),
        };
        let session = SshSession::connect(ssh_target, &self.credentials, &self.transport)
            .await
            .map_err(|e| ProvisionError::connect(target.to_string(), e))?;
        debug!(address = session.address(), session_id = ?session.session_id(), "session open");
        Ok(Box::new(NetconfControllerSession { inner: session }))
    }
}

struct NetconfControllerSession {
    inner: SshSession,
}

fn into_reply(reply: RpcReply) -> Reply {
    Reply {
        failed: reply.error_summary(),
        result: reply.raw,
    }
}

#[async_trait]
impl ControllerSession for NetconfControllerSession {
    async fn edit_config(
        &mut self,
        datastore: Datastore,
        config: &str,
    ) -> Result<EditReply, ProvisionError> {
        self.inner
            .edit_config(datastore, config)
            .await
            .map(into_reply)
            .map_err(|e| ProvisionError::transport(Step::Edit, e))
    }

    async fn rpc(&mut self, request: &str) -> Result<CommitReply, ProvisionError> {
        self.inner
            .rpc(request)
            .await
            .map(into_reply)
            .map_err(|e| ProvisionError::transport(Step::Commit, e))
    }

    async fn close(&mut self) -> Result<(), ProvisionError> {
        self.inner
            .close()
            .await
            .map_err(|e| ProvisionError::transport(Step::Close, e))
    }
}
