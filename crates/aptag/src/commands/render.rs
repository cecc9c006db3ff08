use std::io::Write;

use aptag_core::{build_edit_payload, commit_request};

use crate::cli::{GlobalOpts, RenderArgs};
use crate::error::CliError;

/// Print the edit-config and save-config bodies for one AP.
pub fn handle(args: &RenderArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let runtime = super::load(global)?.to_provisioner_config();

    let tags = runtime.resolve(&args.mac)?;
    let mut out = std::io::stdout().lock();

    if let Some(ref wlc) = args.wlc {
        let mut target = runtime.locate(wlc)?;
        target.port = runtime.session_port(&target);
        writeln!(out, "<!-- target: {target} -->")?;
    }

    let payload = build_edit_payload(&args.mac, tags).to_xml()?;
    writeln!(out, "{payload}")?;
    writeln!(out, "{}", commit_request())?;
    Ok(())
}
