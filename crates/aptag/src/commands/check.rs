use std::io::Write;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Validate config and credentials without touching the network.
pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load(global)?;
    let credentials = aptag_config::resolve_credentials()?;
    let runtime = config.to_provisioner_config();

    let mut out = std::io::stdout().lock();
    writeln!(out, "config:      {}", global.config.display())?;
    writeln!(out, "controllers: {}", runtime.controllers.len())?;
    for controller in &runtime.controllers {
        let pinned = if controller.host_key.is_some() { "pinned" } else { "unpinned" };
        writeln!(
            out,
            "  {} (port {}, host key {pinned})",
            controller.name, controller.port
        )?;
    }
    writeln!(out, "mapped APs:  {}", runtime.tag_map.len())?;
    writeln!(
        out,
        "mqtt:        {}:{} topic '{}' as '{}'",
        runtime.subscription.broker,
        runtime.subscription.port,
        runtime.subscription.topic,
        runtime.subscription.client_id
    )?;
    writeln!(out, "wlc user:    {}", credentials.username)?;
    writeln!(out, "timeout:     {}s", runtime.session.timeout.as_secs())?;
    Ok(())
}
