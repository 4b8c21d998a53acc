//! Preview command.
//!
//! Builds the role dialog's preview on the software device and writes out
//! what a GPU would receive: the fragment shader and the 3D LUT.

use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ociofmt_color::Baker;
use ociofmt_io::DecoderRegistry;
use ociofmt_plugin::{
    available_roles, infer_input_role, infer_output_role, output_roles, RoleDialog,
    RoleRequest, TransformResolver,
};
use ociofmt_preview::SoftwareDevice;
use tracing::{debug, info};

use crate::PreviewArgs;

/// Runs the preview command.
pub fn run(args: PreviewArgs, verbose: u8) -> Result<()> {
    let mut settings = super::load_settings(args.settings.as_deref())?;
    if let Some(edge) = args.edge {
        settings.lut_edge = edge;
    }
    if let Some(mode) = &args.mode {
        settings.shader_mode = super::parse_mode(mode)?;
    }
    if let Some(config) = args.config.clone() {
        settings.config = Some(config);
    }
    settings.validate().context("Invalid settings")?;

    let config = super::load_config_arc(settings.config.as_deref())?;
    let resolver = TransformResolver::new(Arc::clone(&config));

    let (mut handle, metadata) = DecoderRegistry::with_builtin()
        .open_for_read(&args.input)
        .with_context(|| format!("Failed to open: {}", args.input.display()))?;
    let pixels = handle
        .decode_full(&mut |_: f32| true)
        .with_context(|| format!("Failed to decode: {}", args.input.display()))?;
    handle.close();
    debug!(%metadata, "decoded for preview");

    let request = RoleRequest {
        input: infer_input_role(&metadata),
        output: infer_output_role(&*config, &settings.output_role_priority),
        input_roles: available_roles(&*config),
        output_roles: output_roles(&*config),
        metadata: &metadata,
        pixels: &pixels,
    };
    let mut dialog = RoleDialog::open(
        SoftwareDevice::new(),
        &resolver,
        &request,
        settings.lut_edge,
        settings.shader_mode,
    )
        .context("Failed to create preview")?;
    if let Some(role) = args.input_role {
        dialog
            .set_input_role(role)
            .with_context(|| format!("Cannot preview input role '{}'", role))?;
    }
    if let Some(role) = args.output_role {
        dialog
            .set_output_role(role)
            .with_context(|| format!("Cannot preview output role '{}'", role))?;
    }

    let (input, output) = (dialog.input_role(), dialog.output_role());
    let bundle = dialog.surface().compiler().bundle();
    if !bundle.is_ready() {
        bail!("No preview for {} -> {}", input, output);
    }
    info!(%input, %output, cache_id = bundle.cache_id().unwrap_or_default(), "preview ready");

    println!("{}", args.input.display());
    println!("  Roles:     {} -> {}", input.label(), output.label());
    println!("  Cache id:  {}", bundle.cache_id().unwrap_or_default());
    println!("  LUT:       {}^3", bundle.edge());
    if verbose > 0 {
        println!("  Aspect:    {:.4}", dialog.surface().aspect());
        println!("  Objects:   {}", dialog.surface().compiler().device().live_objects());
    }

    if let Some(path) = &args.shader {
        fs::write(path, bundle.shader_text())
            .with_context(|| format!("Failed to save: {}", path.display()))?;
        println!("  Shader:    {}", path.display());
    }

    if let Some(path) = &args.cube {
        let processor = resolver.resolve(input, output)?;
        let baker = Baker::new(&processor);
        let lut = baker.bake_lut_3d(settings.lut_edge)?;
        baker
            .write_cube_3d(path, &lut)
            .with_context(|| format!("Failed to save: {}", path.display()))?;
        println!("  Cube:      {}", path.display());
    }

    Ok(())
}
