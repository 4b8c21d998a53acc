//! Roles command - what the role menus would offer.

use anyhow::Result;
use ociofmt_color::ColorConfig;
use ociofmt_plugin::{available_roles, infer_output_role, Role};

use crate::RolesArgs;

/// Runs the roles command.
pub fn run(args: RolesArgs, verbose: u8) -> Result<()> {
    let settings = super::load_settings(args.settings.as_deref())?;
    let config = super::load_config(args.config.as_deref().or(settings.config.as_deref()))?;
    print!("{}", describe(&config, &settings.output_role_priority, verbose > 0));
    Ok(())
}

fn describe(config: &dyn ColorConfig, priority: &[Role], all: bool) -> String {
    let mut out = String::new();
    out.push_str("Roles:\n");
    for role in available_roles(config) {
        let name = role.name().unwrap_or_default();
        let cs = config.colorspace_for_role(name).unwrap_or_default();
        out.push_str(&format!("  {:<16} {:<16} -> {}\n", role.label(), name, cs));
    }

    if all {
        // every role slot, including undefined and unknown names
        for i in 0..config.num_roles() {
            if let Some(name) = config.role_name(i) {
                if Role::from_name(&name) == Role::Unknown {
                    out.push_str(&format!("  (other)          {name}\n"));
                }
            }
        }
    }

    match config.default_display_device() {
        Some(device) => {
            let view = config.default_display_transform(&device).unwrap_or_default();
            let cs = config
                .display_colorspace(&device, &view)
                .unwrap_or_else(|e| format!("<{e}>"));
            out.push_str(&format!("Display: {device} / {view} -> {cs}\n"));
        }
        None => out.push_str("Display: none\n"),
    }

    let output = infer_output_role(config, priority);
    out.push_str(&format!("Default output: {}\n", output.label()));
    out
}
