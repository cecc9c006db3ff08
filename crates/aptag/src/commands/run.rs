use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use aptag_core::{Dispatcher, HostKeyVerification, NetconfSessionManager, Provisioner};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::mqtt::MqttSource;

/// Subscribe and provision until Ctrl-C. In-flight runs are not drained.
pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load(global)?;
    let credentials = aptag_config::resolve_credentials()?;
    let runtime = Arc::new(config.to_provisioner_config());

    if runtime.session.host_keys == HostKeyVerification::AcceptUnpinned {
        let unpinned: Vec<&str> = runtime
            .controllers
            .iter()
            .filter(|c| c.host_key.is_none())
            .map(|c| c.name.as_str())
            .collect();
        if !unpinned.is_empty() {
            warn!(
                controllers = ?unpinned,
                "SSH host keys of these controllers will be accepted without verification"
            );
        }
    }

    let sessions = Arc::new(NetconfSessionManager::new(&credentials, &runtime.session));
    let provisioner = Arc::new(Provisioner::new(Arc::clone(&runtime), sessions));
    let dispatcher = Dispatcher::new(provisioner, runtime.max_in_flight);

    let source = MqttSource::connect(&runtime.subscription).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                on_interrupt.cancel();
            }
            Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });

    info!(
        controllers = runtime.controllers.len(),
        mapped_aps = runtime.tag_map.len(),
        "waiting for AP announcements"
    );
    dispatcher.run(source, cancel).await;
    Ok(())
}
