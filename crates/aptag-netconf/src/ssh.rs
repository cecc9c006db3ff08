// NETCONF over SSH
//
// Opens an SSH connection, authenticates with a password, requests the
// `netconf` subsystem, and runs the NETCONF hello exchange on the
// resulting channel. The SSH handle is kept alongside the NETCONF
// session so that dropping the session tears the connection down.

use std::sync::Arc;

use async_trait::async_trait;
use russh::{ChannelMsg, Disconnect};
use russh::client::{self, Handle};
use russh_keys::key::PublicKey;
use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::error::Error;
use crate::message::{Datastore, RpcReply};
use crate::session::NetconfSession;
use crate::transport::{HostKeyPolicy, TransportConfig, normalize_fingerprint};

/// Object-safe alias for the SSH channel stream.
pub trait Duplex: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Duplex for T {}

/// Where and how to open a session.
#[derive(Debug, Clone, Copy)]
pub struct SshTarget<'a> {
    pub address: &'a str,
    pub port: u16,
    /// Pinned SHA-256 host-key fingerprint, if any.
    pub host_key: Option<&'a str>,
}

/// Password credentials shared by every controller.
#[derive(Debug, Clone)]
pub struct SshCredentials {
    pub username: String,
    pub password: SecretString,
}

/// Host-key verification for one connection.
struct HostKeyCheck {
    address: String,
    pinned: Option<String>,
    policy: HostKeyPolicy,
}

#[async_trait]
impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();

        if let Some(ref pinned) = self.pinned {
            let accepted = normalize_fingerprint(pinned) == normalize_fingerprint(&fingerprint);
            if !accepted {
                warn!(
                    address = %self.address,
                    presented = %fingerprint,
                    "host key does not match pinned fingerprint"
                );
            }
            return Ok(accepted);
        }

        match self.policy {
            HostKeyPolicy::AcceptUnknown => {
                debug!(address = %self.address, fingerprint = %fingerprint, "accepting unpinned host key");
                Ok(true)
            }
            HostKeyPolicy::PinnedOnly => {
                warn!(
                    address = %self.address,
                    presented = %fingerprint,
                    "no pinned host key for controller"
                );
                Ok(false)
            }
        }
    }
}

/// A NETCONF session running over an SSH `netconf` subsystem channel.
pub struct SshSession {
    netconf: NetconfSession<Box<dyn Duplex>>,
    handle: Handle<HostKeyCheck>,
    address: String,
}

impl SshSession {
    /// Connect, authenticate, and complete the NETCONF hello exchange.
    ///
    /// The whole sequence is bounded by `transport.connect_timeout`.
    pub async fn connect(
        target: SshTarget<'_>,
        credentials: &SshCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let limit = transport.connect_timeout;
        tokio::time::timeout(limit, Self::connect_inner(target, credentials, transport))
            .await
            .map_err(|_| Error::Timeout {
                timeout_secs: limit.as_secs(),
            })?
    }

    async fn connect_inner(
        target: SshTarget<'_>,
        credentials: &SshCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let address = format!("{}:{}", target.address, target.port);
        let config = Arc::new(client::Config {
            inactivity_timeout: Some(transport.inactivity_timeout),
            ..client::Config::default()
        });
        let handler = HostKeyCheck {
            address: address.clone(),
            pinned: target.host_key.map(str::to_owned),
            policy: transport.host_keys,
        };

        debug!(%address, "opening SSH connection");
        let mut handle = client::connect(config, (target.address, target.port), handler)
            .await
            .map_err(|e| match e {
                russh::Error::UnknownKey => Error::HostKeyRejected {
                    address: address.clone(),
                },
                other => Error::Connect {
                    address: address.clone(),
                    reason: other.to_string(),
                },
            })?;

        let authenticated = handle
            .authenticate_password(
                credentials.username.clone(),
                credentials.password.expose_secret(),
            )
            .await?;
        if !authenticated {
            return Err(Error::Authentication {
                username: credentials.username.clone(),
                address,
            });
        }

        let mut channel = handle.channel_open_session().await?;
        channel
            .request_subsystem(true, "netconf")
            .await
            .map_err(|_| Error::SubsystemRefused {
                address: address.clone(),
            })?;
        // The request only queues the message; the server's answer arrives
        // on the channel.
        loop {
            if let Some(answer) = subsystem_reply(channel.wait().await, &address) {
                answer?;
                break;
            }
        }

        let stream: Box<dyn Duplex> = Box::new(channel.into_stream());
        let netconf = NetconfSession::establish(stream).await?;
        debug!(%address, session_id = ?netconf.session_id(), "NETCONF session established");

        Ok(Self {
            netconf,
            handle,
            address,
        })
    }

    /// `host:port` this session is connected to.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn session_id(&self) -> Option<u32> {
        self.netconf.session_id()
    }

    pub async fn edit_config(
        &mut self,
        datastore: Datastore,
        config: &str,
    ) -> Result<RpcReply, Error> {
        self.netconf.edit_config(datastore, config).await
    }

    pub async fn rpc(&mut self, body: &str) -> Result<RpcReply, Error> {
        self.netconf.rpc(body).await
    }

    /// Close the NETCONF session and disconnect SSH.
    ///
    /// The SSH disconnect is sent even if `<close-session>` fails.
    pub async fn close(&mut self) -> Result<(), Error> {
        let closed = self.netconf.close().await;
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            debug!(address = %self.address, error = %e, "SSH disconnect failed");
        }
        closed
    }
}

/// Classify a channel message received while waiting for the subsystem
/// request's reply. `None` means keep waiting.
fn subsystem_reply(msg: Option<ChannelMsg>, address: &str) -> Option<Result<(), Error>> {
    match msg {
        Some(ChannelMsg::Success) => Some(Ok(())),
        Some(ChannelMsg::Failure) => Some(Err(Error::SubsystemRefused {
            address: address.to_owned(),
        })),
        None => Some(Err(Error::SessionClosed)),
        Some(other) => {
            debug!(%address, msg = ?other, "ignoring channel message before subsystem reply");
            None
        }
    }
}
