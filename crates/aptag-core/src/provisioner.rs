// ── Provisioning orchestrator ──
//
// One call to `handle_message` is one complete provisioning run:
// decode → resolve → locate → build payload → open → edit → commit → close.
// Runs share nothing but the read-only config and the session manager, so
// any number of them may execute concurrently.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use aptag_netconf::Datastore;
use aptag_netconf::message::element_text;

use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;
use crate::model::{ControllerAddress, InboundEvent};
use crate::payload::{build_edit_payload, commit_request};
use crate::session::{ControllerSession, SessionManager};

/// Network step of a run; each one is bounded by the session timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Step {
    Open,
    Edit,
    Commit,
    Close,
}

// ── Outcome ─────────────────────────────────────────────────────────

/// How the controller answered the edit-config.
#[derive(Debug)]
pub enum EditStatus {
    /// Reply text contained `ok`.
    Accepted { result: String },
    /// Well-formed reply without `ok`. The commit is still attempted.
    /// `error` is always `ProvisionError::ProtocolFailure`.
    Rejected {
        result: String,
        error: ProvisionError,
    },
    /// The request never got a reply. No commit was attempted.
    Failed(ProvisionError),
}

impl EditStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// What happened to the save-config request.
#[derive(Debug)]
pub enum CommitStatus {
    /// `result` is the `<result>` text when the reply has one, otherwise
    /// the raw reply.
    Saved { result: String },
    /// The reply carried an `<rpc-error>`.
    Rejected {
        result: String,
        error: ProvisionError,
    },
    Failed(ProvisionError),
    Skipped,
}

/// Everything observed on a run that reached an open session.
#[derive(Debug)]
pub struct ProvisionReport {
    pub mac: String,
    pub controller: ControllerAddress,
    pub edit: EditStatus,
    pub commit: CommitStatus,
    /// `None` when `close` succeeded.
    pub close_error: Option<ProvisionError>,
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum ProvisionOutcome {
    Completed(ProvisionReport),
    Abandoned(ProvisionError),
}

impl ProvisionOutcome {
    pub fn report(&self) -> Option<&ProvisionReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Abandoned(_) => None,
        }
    }

    pub fn abandoned(&self) -> Option<&ProvisionError> {
        match self {
            Self::Completed(_) => None,
            Self::Abandoned(err) => Some(err),
        }
    }
}

// ── Provisioner ─────────────────────────────────────────────────────

/// Applies tag assignments announced on the bus.
pub struct Provisioner {
    config: Arc<ProvisionerConfig>,
    sessions: Arc<dyn SessionManager>,
}

impl Provisioner {
    pub fn new(config: Arc<ProvisionerConfig>, sessions: Arc<dyn SessionManager>) -> Self {
        Self { config, sessions }
    }

    /// Entry point for one raw bus message.
    pub async fn handle_message(&self, payload: &[u8]) -> ProvisionOutcome {
        match InboundEvent::decode(payload) {
            Ok(event) => self.provision(&event).await,
            Err(e) => {
                warn!(error = %e, "dropping message");
                ProvisionOutcome::Abandoned(e)
            }
        }
    }

    /// Provision a decoded event. Every failure is logged here; nothing is
    /// returned to the caller as an error.
    pub async fn provision(&self, event: &InboundEvent) -> ProvisionOutcome {
        let mac = event.mac.as_str();
        let wlc = event.controller.as_str();

        let (target, config_xml) = match self.prepare(event) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(mac, wlc, error = %e, "provisioning abandoned");
                return ProvisionOutcome::Abandoned(e);
            }
        };

        info!(mac, wlc, address = %target, "provisioning AP tags");
        let mut session = match self
            .bounded(Step::Open, self.sessions.open(&target))
            .await
        {
            Ok(session) => session,
            Err(e) => {
                warn!(mac, wlc, address = %target, error = %e, "provisioning abandoned");
                return ProvisionOutcome::Abandoned(e);
            }
        };

        let (edit, commit) = self.submit(session.as_mut(), mac, wlc, &config_xml).await;

        let close_error = match self.bounded(Step::Close, session.close()).await {
            Ok(()) => None,
            Err(e) => {
                warn!(mac, wlc, address = %target, error = %e, "session close failed");
                Some(e)
            }
        };

        ProvisionOutcome::Completed(ProvisionReport {
            mac: event.mac.clone(),
            controller: target,
            edit,
            commit,
            close_error,
        })
    }

    /// Lookups and payload construction. No network access.
    fn prepare(&self, event: &InboundEvent) -> Result<(ControllerAddress, String), ProvisionError> {
        let tags = self.config.resolve(&event.mac)?;
        let mut target = self.config.locate(&event.controller)?;
        target.port = self.config.session_port(&target);
        let config_xml = build_edit_payload(&event.mac, tags).to_xml()?;
        debug!(mac = %event.mac, payload = %config_xml, "edit payload built");
        Ok((target, config_xml))
    }

    /// Edit, then commit. The commit runs whether or not the edit was
    /// accepted, unless the edit request failed at the transport level.
    async fn submit(
        &self,
        session: &mut dyn ControllerSession,
        mac: &str,
        wlc: &str,
        config_xml: &str,
    ) -> (EditStatus, CommitStatus) {
        let edit = match self
            .bounded(Step::Edit, session.edit_config(Datastore::Running, config_xml))
            .await
        {
            Ok(reply) if reply.is_ok() => {
                info!(mac, wlc, "AP tags applied");
                EditStatus::Accepted {
                    result: reply.result,
                }
            }
            Ok(reply) => {
                let e = ProvisionError::ProtocolFailure {
                    step: Step::Edit,
                    message: reply.failed.clone().unwrap_or_else(|| reply.result.clone()),
                };
                warn!(mac, wlc, error = %e, "controller did not accept AP tags");
                EditStatus::Rejected {
                    result: reply.result,
                    error: e,
                }
            }
            Err(e) => {
                warn!(mac, wlc, error = %e, "edit-config failed");
                return (EditStatus::Failed(e), CommitStatus::Skipped);
            }
        };

        let commit = match self.bounded(Step::Commit, session.rpc(commit_request())).await {
            Ok(reply) => {
                let result = match element_text(&reply.result, "result") {
                    Ok(Some(text)) => text,
                    _ => reply.result,
                };
                match reply.failed {
                    Some(message) => {
                        let e = ProvisionError::ProtocolFailure {
                            step: Step::Commit,
                            message,
                        };
                        warn!(mac, wlc, error = %e, "save-config response");
                        CommitStatus::Rejected { result, error: e }
                    }
                    None => {
                        info!(mac, wlc, %result, "save-config response");
                        CommitStatus::Saved { result }
                    }
                }
            }
            Err(e) => {
                warn!(mac, wlc, error = %e, "save-config failed");
                CommitStatus::Failed(e)
            }
        };

        (edit, commit)
    }

    async fn bounded<T, F>(&self, step: Step, fut: F) -> Result<T, ProvisionError>
    where
        F: Future<Output = Result<T, ProvisionError>>,
    {
        let limit = self.config.session.timeout;
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ProvisionError::Timeout {
                step,
                timeout_secs: limit.as_secs(),
            })?
    }
}
