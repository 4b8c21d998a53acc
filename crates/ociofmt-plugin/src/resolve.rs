//! Transform resolution and default-role inference.
//!
//! ```
//! use ociofmt_color::Config;
//! use ociofmt_plugin::{resolve, Role};
//!
//! let config = Config::builtin();
//! let p = resolve(Role::SceneLinear, Role::Display, &config).unwrap();
//! assert!(!p.is_identity());
//! let p = resolve(Role::Data, Role::Unknown, &config).unwrap();
//! assert!(p.is_identity());
//! ```

use std::sync::Arc;

use ociofmt_color::{require_role, ColorConfig, Processor, ProcessorCache};
use ociofmt_core::ImageMetadata;
use tracing::debug;

use crate::error::{ImportError, ImportResult};
use crate::role::{self, Role};

/// Output roles tried, in order, when none was chosen.
pub const DEFAULT_OUTPUT_PRIORITY: [Role; 3] =
    [Role::MattePaint, Role::TexturePaint, Role::CompositingLog];

/// Color space names a role pair converts between.
///
/// `None` when either role is [`Role::Unknown`], meaning no transform.
/// The other role is still checked against `config`.
///
/// # Errors
///
/// [`ImportError::TransformUnavailable`] when a named role is not defined
/// by `config`, when `display` is used as input, or when a transform to
/// `display` is needed and the config has no default display.
pub fn endpoints(
    input: Role,
    output: Role,
    config: &dyn ColorConfig,
) -> ImportResult<Option<(String, String)>> {
    let src = match input {
        Role::Unknown => None,
        role => Some(role_colorspace(config, role)?),
    };
    let dst = match output {
        Role::Unknown => None,
        // the default display is only looked up for a real transform
        Role::Display if src.is_none() => None,
        Role::Display => Some(display_colorspace(config)?),
        role => Some(role_colorspace(config, role)?),
    };
    Ok(src.zip(dst))
}

fn role_colorspace(config: &dyn ColorConfig, role: Role) -> ImportResult<String> {
    let name = role.name().ok_or_else(|| {
        ImportError::TransformUnavailable(format!("role '{role}' has no color space"))
    })?;
    Ok(require_role(config, name)?)
}

fn display_colorspace(config: &dyn ColorConfig) -> ImportResult<String> {
    let device = config
        .default_display_device()
        .ok_or_else(|| ImportError::TransformUnavailable("no default display".into()))?;
    let view = config.default_display_transform(&device).ok_or_else(|| {
        ImportError::TransformUnavailable(format!("display '{device}' has no views"))
    })?;
    Ok(config.display_colorspace(&device, &view)?)
}

/// Builds the transform for `input` to `output`.
///
/// An [`Role::Unknown`] on either side yields the identity, which the
/// pipeline skips.
pub fn resolve(input: Role, output: Role, config: &dyn ColorConfig) -> ImportResult<Processor> {
    match endpoints(input, output, config)? {
        Some((src, dst)) => {
            debug!(%input, %output, %src, %dst, "resolving transform");
            Ok(config.processor(&src, &dst)?)
        }
        None => Ok(Processor::identity()),
    }
}

/// Default input role for a decoded image.
///
/// Float data is scene-linear, 10-bit integer data is log, anything else
/// is data.
pub fn infer_input_role(meta: &ImageMetadata) -> Role {
    if meta.format.is_float() {
        Role::SceneLinear
    } else if meta.bits_per_sample() == Some(10) {
        Role::CompositingLog
    } else {
        Role::Data
    }
}

/// First role of `priority` that `config` defines, else [`Role::Unknown`].
pub fn infer_output_role(config: &dyn ColorConfig, priority: &[Role]) -> Role {
    priority
        .iter()
        .copied()
        .find(|r| role::is_available(config, *r))
        .unwrap_or(Role::Unknown)
}

/// Resolver bound to one configuration, caching processors by color
/// space pair.
pub struct TransformResolver {
    config: Arc<dyn ColorConfig>,
    cache: ProcessorCache,
}

impl TransformResolver {
    /// Creates a resolver over `config`.
    pub fn new(config: Arc<dyn ColorConfig>) -> Self {
        Self {
            config,
            cache: ProcessorCache::new(),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &dyn ColorConfig {
        self.config.as_ref()
    }

    /// Shared handle to the configuration.
    pub fn config_arc(&self) -> Arc<dyn ColorConfig> {
        Arc::clone(&self.config)
    }

    /// Same as [`resolve`], reusing processors built earlier.
    pub fn resolve(&self, input: Role, output: Role) -> ImportResult<Processor> {
        match endpoints(input, output, self.config())? {
            Some((src, dst)) => Ok(self.cache.get_or_create(self.config(), &src, &dst)?),
            None => Ok(Processor::identity()),
        }
    }

    /// Number of cached processors.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl std::fmt::Debug for TransformResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformResolver")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ociofmt_color::{builtin, Config};
    use ociofmt_core::{DataFormat, BITS_PER_SAMPLE};

    #[test]
    fn input_inference() {
        assert_eq!(
            infer_input_role(&ImageMetadata::new(4, 4, 3, DataFormat::F32)),
            Role::SceneLinear
        );
        assert_eq!(
            infer_input_role(&ImageMetadata::new(4, 4, 3, DataFormat::F16)),
            Role::SceneLinear
        );

        let mut dpx = ImageMetadata::new(4, 4, 3, DataFormat::U16);
        dpx.set_attr(BITS_PER_SAMPLE, 10);
        assert_eq!(infer_input_role(&dpx), Role::CompositingLog);

        dpx.set_attr(BITS_PER_SAMPLE, 12);
        assert_eq!(infer_input_role(&dpx), Role::Data);
        assert_eq!(
            infer_input_role(&ImageMetadata::new(4, 4, 3, DataFormat::U8)),
            Role::Data
        );
    }

    #[test]
    fn output_inference_follows_priority() {
        let config = Config::builtin();
        assert_eq!(
            infer_output_role(&config, &DEFAULT_OUTPUT_PRIORITY),
            Role::MattePaint
        );
        assert_eq!(
            infer_output_role(&config, &[Role::TexturePaint, Role::MattePaint]),
            Role::TexturePaint
        );

        let mut sparse = Config::builtin();
        sparse.set_role("matte_paint", "missing");
        sparse.set_role("texture_paint", "missing");
        assert_eq!(
            infer_output_role(&sparse, &DEFAULT_OUTPUT_PRIORITY),
            Role::CompositingLog
        );
        assert_eq!(infer_output_role(&Config::new(), &DEFAULT_OUTPUT_PRIORITY), Role::Unknown);
    }

    #[test]
    fn display_goes_through_default_view() {
        let config = Config::builtin();
        let (src, dst) = endpoints(Role::SceneLinear, Role::Display, &config)
            .unwrap()
            .unwrap();
        assert_eq!(src, builtin::LINEAR);
        assert_eq!(dst, builtin::SRGB_DISPLAY);

        let p = resolve(Role::SceneLinear, Role::Display, &config).unwrap();
        let mut px = [0.18f32, 0.18, 0.18];
        p.apply_one(&mut px);
        assert_relative_eq!(px[0], 0.4613, epsilon = 1e-3);
    }

    #[test]
    fn unknown_is_identity() {
        let config = Config::builtin();
        assert!(endpoints(Role::Unknown, Role::Display, &config).unwrap().is_none());
        assert!(resolve(Role::SceneLinear, Role::Unknown, &config)
            .unwrap()
            .is_identity());
    }

    #[test]
    fn unknown_does_not_hide_an_undefined_role() {
        let mut config = Config::builtin();
        config.set_role("texture_paint", "missing");
        assert!(matches!(
            endpoints(Role::Unknown, Role::TexturePaint, &config),
            Err(ImportError::TransformUnavailable(_))
        ));
        assert!(matches!(
            resolve(Role::TexturePaint, Role::Unknown, &config),
            Err(ImportError::TransformUnavailable(_))
        ));
        assert!(matches!(
            resolve(Role::Display, Role::Unknown, &config),
            Err(ImportError::TransformUnavailable(_))
        ));
        // no transform, so no display device is needed
        assert!(endpoints(Role::Unknown, Role::Display, &Config::new()).unwrap().is_none());
    }

    #[test]
    fn missing_roles_fail() {
        let mut config = Config::builtin();
        config.set_role("texture_paint", "missing");
        assert!(matches!(
            resolve(Role::SceneLinear, Role::TexturePaint, &config),
            Err(ImportError::TransformUnavailable(_))
        ));
        assert!(matches!(
            resolve(Role::Display, Role::Data, &config),
            Err(ImportError::TransformUnavailable(_))
        ));
        assert!(matches!(
            resolve(Role::SceneLinear, Role::Display, &Config::new()),
            Err(ImportError::TransformUnavailable(_))
        ));
    }

    #[test]
    fn resolver_reuses_processors() {
        let resolver = TransformResolver::new(Arc::new(Config::builtin()));
        let a = resolver.resolve(Role::SceneLinear, Role::MattePaint).unwrap();
        let b = resolver.resolve(Role::SceneLinear, Role::MattePaint).unwrap();
        assert_eq!(a.cache_id(), b.cache_id());
        assert_eq!(resolver.cached(), 1);
        resolver.resolve(Role::Data, Role::Unknown).unwrap();
        assert_eq!(resolver.cached(), 1);
    }
}
