//! Import state machine.
//!
//! The host drives one import through `ReadPrepare`, `ReadStart`,
//! `ReadContinue` and `ReadFinish`, one call at a time. [`Plugin`] owns the
//! [`ImportSession`] between calls; nothing is kept in globals.
//!
//! ```text
//! Idle -> Prepared -> Started -> Continued* -> Finished
//!            \           \           \
//!             +-----------+-----------+--> Failed (terminal)
//! ```
//!
//! Start decodes the whole file, picks the roles and applies the transform
//! once. Continue only converts to the host format and hands the buffer
//! over.

use std::sync::Arc;

use ociofmt_color::{ColorConfig, ColorResult, Config, Processor};
use ociofmt_core::ImageMetadata;
use ociofmt_io::{DecodeHandle, DecoderRegistry};
use tracing::{debug, info, warn};

use crate::error::{ImportError, ImportResult};
use crate::host::{HostCallbacks, HostRecord, ImageMode, Rect, ResultCode, Selector};
use crate::pipeline::{self, HostLayout};
use crate::resolve::{infer_input_role, infer_output_role, TransformResolver};
use crate::role::{self, Role};
use crate::selector::{RoleRequest, RoleSelector};
use crate::settings::PluginSettings;

/// Denominator of every progress report. Decoding covers `[0, 1]`, the
/// handoff the rest.
pub const PROGRESS_TOTAL: f64 = 1.2;
const PROGRESS_CONVERTED: f64 = 1.1;

/// Where the plugin is in the read protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No import in progress.
    #[default]
    Idle,
    /// `ReadPrepare` succeeded.
    Prepared,
    /// `ReadStart` succeeded; the session holds the transformed image.
    Started,
    /// At least one `ReadContinue` succeeded.
    Continued,
    /// `ReadFinish` released the session.
    Finished,
    /// A step failed; only a new `ReadPrepare` is accepted.
    Failed,
}

/// Working set of one import.
pub struct ImportSession {
    metadata: ImageMetadata,
    pixels: Vec<f32>,
    handle: Option<Box<dyn DecodeHandle>>,
    input: Role,
    output: Role,
    processor: Processor,
    transformed: bool,
    subimage: usize,
    mipmap: usize,
}

impl ImportSession {
    /// Decoded image description.
    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    /// Transformed float pixels.
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Confirmed input role.
    pub fn input_role(&self) -> Role {
        self.input
    }

    /// Confirmed output role.
    pub fn output_role(&self) -> Role {
        self.output
    }

    /// Transform chosen at start.
    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Whether the transform changed the pixels.
    pub fn transformed(&self) -> bool {
        self.transformed
    }

    /// Subimage and mipmap level being read; always `(0, 0)`.
    pub fn level(&self) -> (usize, usize) {
        (self.subimage, self.mipmap)
    }

    fn close(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        debug!(samples = self.pixels.len(), "session released");
    }
}

impl std::fmt::Debug for ImportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportSession")
            .field("metadata", &self.metadata)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("transformed", &self.transformed)
            .finish_non_exhaustive()
    }
}

/// The plugin entry point.
pub struct Plugin<S: RoleSelector> {
    resolver: TransformResolver,
    registry: DecoderRegistry,
    settings: PluginSettings,
    selector: S,
    session: Option<ImportSession>,
    state: SessionState,
}

impl<S: RoleSelector> Plugin<S> {
    /// Creates a plugin over an explicit configuration and decoder set.
    pub fn new(
        config: Arc<dyn ColorConfig>,
        registry: DecoderRegistry,
        settings: PluginSettings,
        selector: S,
    ) -> Self {
        Self {
            resolver: TransformResolver::new(config),
            registry,
            settings,
            selector,
            session: None,
            state: SessionState::Idle,
        }
    }

    /// Creates a plugin with the built-in decoders and the color config
    /// named by `settings`, `$OCIO`, or the built-in one.
    pub fn from_settings(settings: PluginSettings, selector: S) -> ColorResult<Self> {
        let config = Config::from_env_or_builtin(settings.config.as_deref())?;
        Ok(Self::new(
            Arc::new(config),
            DecoderRegistry::with_builtin(),
            settings,
            selector,
        ))
    }

    /// Protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current session, between a successful start and finish.
    pub fn session(&self) -> Option<&ImportSession> {
        self.session.as_ref()
    }

    /// Settings in use.
    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    /// Resolver over the active configuration.
    pub fn resolver(&self) -> &TransformResolver {
        &self.resolver
    }

    /// The role selector.
    pub fn selector_mut(&mut self) -> &mut S {
        &mut self.selector
    }

    /// Runs one protocol step and returns the code for the host.
    pub fn dispatch(
        &mut self,
        selector: Selector,
        record: &mut HostRecord,
        host: &mut dyn HostCallbacks,
    ) -> ResultCode {
        debug!(?selector, state = ?self.state, "dispatch");
        if selector == Selector::About {
            return ResultCode::NoErr;
        }
        match self.step(selector, record, host) {
            Ok(()) => ResultCode::NoErr,
            Err(e) => {
                warn!(?selector, "import step failed: {e}");
                if let Some(session) = self.session.take() {
                    session.close();
                }
                record.data = None;
                self.state = SessionState::Failed;
                e.result_code()
            }
        }
    }

    fn step(
        &mut self,
        selector: Selector,
        record: &mut HostRecord,
        host: &mut dyn HostCallbacks,
    ) -> ImportResult<()> {
        if !host.has_resource_procs() {
            return Err(ImportError::HostInsufficientCapability(
                "resource callbacks missing".into(),
            ));
        }
        match (selector, self.state) {
            (Selector::About, _) => Ok(()),
            (Selector::ReadPrepare, _) => {
                if let Some(stale) = self.session.take() {
                    stale.close();
                }
                self.prepare(record);
                self.state = SessionState::Prepared;
                Ok(())
            }
            (Selector::ReadStart, SessionState::Prepared) => {
                let session = self.start(record, host)?;
                self.session = Some(session);
                self.state = SessionState::Started;
                Ok(())
            }
            (Selector::ReadContinue, SessionState::Started | SessionState::Continued) => {
                let session = self.session.as_ref().ok_or_else(no_session)?;
                Self::read_continue(session, record, host)?;
                self.state = SessionState::Continued;
                Ok(())
            }
            (Selector::ReadFinish, SessionState::Started | SessionState::Continued) => {
                let session = self.session.take().ok_or_else(no_session)?;
                session.close();
                self.state = SessionState::Finished;
                Ok(())
            }
            (selector, state) => Err(ImportError::BadParameters(format!(
                "{selector:?} is not valid in state {state:?}"
            ))),
        }
    }

    /// The whole file is read in start; the host need not pre-buffer.
    fn prepare(&self, record: &mut HostRecord) {
        record.max_data = 0;
    }

    fn start(
        &mut self,
        record: &mut HostRecord,
        host: &mut dyn HostCallbacks,
    ) -> ImportResult<ImportSession> {
        let (mut handle, metadata) = self.registry.open_for_read(&record.file)?;
        metadata
            .validate()
            .map_err(|e| ImportError::CannotRead(e.to_string()))?;
        let rect = Rect::full(metadata.width, metadata.height).ok_or_else(|| {
            ImportError::UnsupportedFormat(format!(
                "{}x{} exceeds the host coordinate range",
                metadata.width, metadata.height
            ))
        })?;

        record.the_rect = rect;
        record.width = metadata.width;
        record.height = metadata.height;
        record.planes = metadata.channels;
        record.transparency_plane = metadata.alpha_channel.map_or(-1, |a| a as i32);
        record.image_mode = if metadata.channels == 1 {
            ImageMode::Grayscale
        } else {
            ImageMode::RgbColor
        };

        // cancellation is not supported; the callback always continues
        let mut pixels = handle.decode_full(&mut |done: f32| {
            host.progress(f64::from(done), PROGRESS_TOTAL);
            true
        })?;
        info!(file = %record.file.display(), %metadata, "decoded");

        let config = self.resolver.config();
        let request = RoleRequest {
            input: infer_input_role(&metadata),
            output: infer_output_role(config, &self.settings.output_role_priority),
            input_roles: role::available_roles(config),
            output_roles: role::output_roles(config),
            metadata: &metadata,
            pixels: &pixels,
        };
        debug!(input = %request.input, output = %request.output, "inferred roles");
        let (input, output) = self.selector.select(&request).into_roles()?;

        let processor = self.resolver.resolve(input, output)?;
        let transformed = pipeline::apply(
            &processor,
            &mut pixels,
            metadata.width,
            metadata.height,
            metadata.channels,
        )?;
        record.depth = self.settings.host_depth;
        info!(%input, %output, transformed, depth = record.depth, "started");

        Ok(ImportSession {
            metadata,
            pixels,
            handle: Some(handle),
            input,
            output,
            processor,
            transformed,
            subimage: 0,
            mipmap: 0,
        })
    }

    fn read_continue(
        session: &ImportSession,
        record: &mut HostRecord,
        host: &mut dyn HostCallbacks,
    ) -> ImportResult<()> {
        let meta = &session.metadata;
        let layout = HostLayout::new(meta, record.depth)?;
        record.lo_plane = 0;
        record.hi_plane = meta.channels.saturating_sub(1);
        record.col_bytes = layout.col_bytes;
        record.row_bytes = layout.row_bytes;
        record.plane_bytes = layout.plane_bytes;

        if !host.allocate_buffer(layout.image_bytes) {
            return Err(ImportError::OutOfMemory(format!(
                "host buffer of {} bytes",
                layout.image_bytes
            )));
        }
        let data = pipeline::to_host(&session.pixels, meta, &layout)?;
        host.progress(PROGRESS_CONVERTED, PROGRESS_TOTAL);

        record.the_rect = Rect::full(meta.width, meta.height).ok_or_else(|| {
            ImportError::BadParameters(format!("{}x{} has no host rect", meta.width, meta.height))
        })?;
        record.data = Some(data);
        let code = host.advance_state(record);
        host.progress(PROGRESS_TOTAL, PROGRESS_TOTAL);
        // the conversion buffer is transient
        record.data = None;

        if code.is_ok() {
            debug!(bytes = layout.image_bytes, row_bytes = layout.row_bytes, "handed off");
            Ok(())
        } else {
            Err(host_refused(code))
        }
    }
}

impl<S: RoleSelector> Drop for Plugin<S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}

impl<S: RoleSelector> std::fmt::Debug for Plugin<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn no_session() -> ImportError {
    ImportError::BadParameters("no import session".into())
}

fn host_refused(code: ResultCode) -> ImportError {
    let msg = format!("advanceState returned {code}");
    match code {
        ResultCode::MemFull => ImportError::OutOfMemory(msg),
        ResultCode::HostInsufficient => ImportError::HostInsufficientCapability(msg),
        ResultCode::CannotRead => ImportError::CannotRead(msg),
        ResultCode::BadParameters | ResultCode::NoErr => ImportError::BadParameters(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::AcceptDefaults;

    #[derive(Default)]
    struct NullHost {
        resources: bool,
    }

    impl HostCallbacks for NullHost {
        fn progress(&mut self, _done: f64, _total: f64) {}

        fn advance_state(&mut self, _record: &HostRecord) -> ResultCode {
            ResultCode::NoErr
        }

        fn has_resource_procs(&self) -> bool {
            self.resources
        }
    }

    fn plugin() -> Plugin<AcceptDefaults> {
        Plugin::new(
            Arc::new(Config::builtin()),
            DecoderRegistry::with_builtin(),
            PluginSettings::default(),
            AcceptDefaults,
        )
    }

    #[test]
    fn about_touches_nothing() {
        let mut p = plugin();
        let mut record = HostRecord::new("none");
        let mut host = NullHost::default();
        assert_eq!(p.dispatch(Selector::About, &mut record, &mut host), ResultCode::NoErr);
        assert_eq!(p.state(), SessionState::Idle);
    }

    #[test]
    fn host_without_resources_is_insufficient() {
        let mut p = plugin();
        let mut record = HostRecord::new("none");
        let mut host = NullHost { resources: false };
        assert_eq!(
            p.dispatch(Selector::ReadPrepare, &mut record, &mut host),
            ResultCode::HostInsufficient
        );
        assert_eq!(p.state(), SessionState::Failed);
    }

    #[test]
    fn steps_out_of_order() {
        let mut p = plugin();
        let mut record = HostRecord::new("none");
        let mut host = NullHost { resources: true };
        assert_eq!(
            p.dispatch(Selector::ReadContinue, &mut record, &mut host),
            ResultCode::BadParameters
        );
        assert_eq!(
            p.dispatch(Selector::ReadStart, &mut record, &mut host),
            ResultCode::BadParameters
        );

        record.max_data = 4096;
        assert_eq!(p.dispatch(Selector::ReadPrepare, &mut record, &mut host), ResultCode::NoErr);
        assert_eq!(record.max_data, 0);
        assert_eq!(p.state(), SessionState::Prepared);
        assert_eq!(
            p.dispatch(Selector::ReadFinish, &mut record, &mut host),
            ResultCode::BadParameters
        );
    }

    #[test]
    fn refused_handoff_codes() {
        assert!(matches!(host_refused(ResultCode::MemFull), ImportError::OutOfMemory(_)));
        assert_eq!(
            host_refused(ResultCode::CannotRead).result_code(),
            ResultCode::CannotRead
        );
    }
}
