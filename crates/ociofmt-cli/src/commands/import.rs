//! Import command.
//!
//! Plays the host side of the read protocol against the plugin and
//! reports what a real host would receive.

use std::fs;

use anyhow::{bail, Context, Result};
use ociofmt_plugin::{
    FixedRoles, HostCallbacks, HostRecord, Plugin, ResultCode, Role, Selector,
};
use tracing::{debug, info, trace};

use crate::ImportArgs;

const STEPS: [Selector; 4] = [
    Selector::ReadPrepare,
    Selector::ReadStart,
    Selector::ReadContinue,
    Selector::ReadFinish,
];

/// Host that logs progress and keeps the last handed-off buffer.
#[derive(Debug, Default)]
struct CliHost {
    reports: usize,
    handoffs: usize,
    keep: bool,
    data: Vec<u8>,
}

impl HostCallbacks for CliHost {
    fn progress(&mut self, done: f64, total: f64) {
        self.reports += 1;
        trace!(done, total, "progress");
    }

    fn advance_state(&mut self, record: &HostRecord) -> ResultCode {
        let Some(data) = record.data.as_ref() else {
            return ResultCode::BadParameters;
        };
        self.handoffs += 1;
        debug!(bytes = data.len(), row_bytes = record.row_bytes, "advance state");
        if self.keep {
            self.data.clone_from(data);
        }
        ResultCode::NoErr
    }
}

/// Runs the import command.
pub fn run(args: ImportArgs, verbose: u8) -> Result<()> {
    let mut settings = super::load_settings(args.settings.as_deref())?;
    if let Some(depth) = args.depth {
        settings.host_depth = depth;
    }
    if let Some(config) = args.config.clone() {
        settings.config = Some(config);
    }
    settings.validate().context("Invalid settings")?;

    let selector = FixedRoles {
        input: args.input_role,
        output: args.output_role,
    };
    let mut plugin = Plugin::from_settings(settings, selector).context("Failed to load config")?;
    let mut record = HostRecord::new(&args.input);
    let mut host = CliHost {
        keep: args.output.is_some(),
        ..CliHost::default()
    };

    let mut roles = (Role::Unknown, Role::Unknown);
    let mut transformed = false;
    for step in STEPS {
        let code = plugin.dispatch(step, &mut record, &mut host);
        if !code.is_ok() {
            bail!("{:?} failed for {}: {}", step, args.input.display(), code);
        }
        if let (Selector::ReadStart, Some(session)) = (step, plugin.session()) {
            roles = (session.input_role(), session.output_role());
            transformed = session.transformed();
        }
    }
    info!(file = %args.input.display(), input = %roles.0, output = %roles.1, "imported");

    println!("{}", args.input.display());
    println!("  Size:         {}x{}", record.width, record.height);
    println!("  Planes:       {} ({:?})", record.planes, record.image_mode);
    if record.transparency_plane >= 0 {
        println!("  Alpha plane:  {}", record.transparency_plane);
    }
    println!("  Depth:        {} bits", record.depth);
    println!("  Input role:   {} ({})", roles.0.label(), roles.0);
    println!("  Output role:  {} ({})", roles.1.label(), roles.1);
    println!("  Transformed:  {}", if transformed { "yes" } else { "no" });
    if verbose > 0 {
        println!(
            "  Strides:      col {} / row {} / plane {}",
            record.col_bytes, record.row_bytes, record.plane_bytes
        );
        println!("  Rect:         {:?}", record.the_rect);
        println!("  Progress:     {} reports, {} handoffs", host.reports, host.handoffs);
    }

    if let Some(out) = &args.output {
        fs::write(out, &host.data).with_context(|| format!("Failed to save: {}", out.display()))?;
        println!("  Wrote {} to {}", super::format_size(host.data.len()), out.display());
    }
    Ok(())
}
