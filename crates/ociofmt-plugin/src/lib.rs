//! # ociofmt-plugin
//!
//! Core of an image import plugin with color-management roles.
//!
//! A host calls [`Plugin::dispatch`] for each step of its read protocol.
//! At start the file is decoded to floats, default roles are inferred from
//! the metadata, a [`RoleSelector`] confirms them, and the resolved
//! transform is applied once. Continue converts to the host sample width
//! and hands the buffer over.
//!
//! # Example
//!
//! ```ignore
//! use ociofmt_plugin::{AcceptDefaults, HostRecord, Plugin, PluginSettings, Selector};
//!
//! let mut plugin = Plugin::from_settings(PluginSettings::default(), AcceptDefaults)?;
//! let mut record = HostRecord::new("scan.dpx");
//! for step in [Selector::ReadPrepare, Selector::ReadStart, Selector::ReadContinue, Selector::ReadFinish] {
//!     let code = plugin.dispatch(step, &mut record, &mut host);
//!     if !code.is_ok() {
//!         break;
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! - [`role`] - role enum and registry
//! - [`resolve`] - role pair to processor, default-role inference
//! - [`pipeline`] - transform application and host buffer layout
//! - [`host`] - host record, selectors and result codes
//! - [`session`] - the state machine
//! - [`selector`] - role selection and the dialog model
//! - [`settings`] - plugin settings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod host;
pub mod pipeline;
pub mod resolve;
pub mod role;
pub mod selector;
pub mod session;
pub mod settings;

pub use error::{ImportError, ImportResult};
pub use host::{HostCallbacks, HostRecord, ImageMode, Rect, ResultCode, Selector};
pub use pipeline::{apply, to_host, HostLayout};
pub use resolve::{
    endpoints, infer_input_role, infer_output_role, resolve, TransformResolver,
    DEFAULT_OUTPUT_PRIORITY,
};
pub use role::{available_roles, is_available, output_roles, Role};
pub use selector::{
    AcceptDefaults, Cancel, FixedRoles, RoleDialog, RoleRequest, RoleSelection, RoleSelector,
};
pub use session::{ImportSession, Plugin, SessionState, PROGRESS_TOTAL};
pub use settings::{PluginSettings, SettingsError};
