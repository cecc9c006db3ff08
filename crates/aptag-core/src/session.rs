// ── Session capability ──
//
// The orchestrator talks to controllers only through these two traits.
// `backend::NetconfSessionManager` is the production implementation;
// tests substitute in-memory fakes.

use async_trait::async_trait;

use aptag_netconf::Datastore;

use crate::error::ProvisionError;
use crate::model::ControllerAddress;

/// Reply to an edit-config or generic RPC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Error text reported by the controller, if any.
    pub failed: Option<String>,
    /// Raw reply text.
    pub result: String,
}

pub type EditReply = Reply;
pub type CommitReply = Reply;

impl Reply {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            failed: None,
            result: result.into(),
        }
    }

    /// Success iff the result text contains `ok` (case-sensitive substring).
    pub fn is_ok(&self) -> bool {
        self.result.contains("ok")
    }
}

/// Opens one authenticated session per provisioning run.
#[async_trait]
pub trait SessionManager: Send + Sync {
    async fn open(
        &self,
        target: &ControllerAddress,
    ) -> Result<Box<dyn ControllerSession>, ProvisionError>;
}

/// An open configuration session on a single controller.
#[async_trait]
pub trait ControllerSession: Send {
    async fn edit_config(
        &mut self,
        datastore: Datastore,
        config: &str,
    ) -> Result<EditReply, ProvisionError>;

    async fn rpc(&mut self, request: &str) -> Result<CommitReply, ProvisionError>;

    async fn close(&mut self) -> Result<(), ProvisionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ok_is_success() {
        assert!(Reply::new("ok").is_ok());
    }

    #[test]
    fn ok_inside_reply_is_success() {
        assert!(Reply::new("<rpc-reply>...ok...</rpc-reply>").is_ok());
        assert!(Reply::new("<ok/>").is_ok());
    }

    #[test]
    fn failed_is_failure() {
        assert!(!Reply::new("failed").is_ok());
        assert!(!Reply::new("OK").is_ok());
    }
}
