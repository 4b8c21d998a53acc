//! Role selection.
//!
//! At start the session asks a [`RoleSelector`] to confirm or override the
//! inferred roles. [`RoleDialog`] is the state behind an interactive
//! dialog: two role menus and a live preview that follows them.

use ociofmt_color::ShaderMode;
use ociofmt_core::ImageMetadata;
use ociofmt_preview::{GpuDevice, PreviewSurface, SyncOutcome};
use tracing::{debug, warn};

use crate::error::{ImportError, ImportResult};
use crate::resolve::TransformResolver;
use crate::role::Role;

/// What the selector is asked to confirm.
#[derive(Debug, Clone)]
pub struct RoleRequest<'a> {
    /// Inferred input role.
    pub input: Role,
    /// Inferred output role.
    pub output: Role,
    /// Input menu entries.
    pub input_roles: Vec<Role>,
    /// Output menu entries, ending with [`Role::Display`].
    pub output_roles: Vec<Role>,
    /// Decoded image description.
    pub metadata: &'a ImageMetadata,
    /// Decoded float pixels, for preview.
    pub pixels: &'a [f32],
}

/// Answer of a [`RoleSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSelection {
    /// Import with these roles.
    Confirmed {
        /// Input role.
        input: Role,
        /// Output role.
        output: Role,
    },
    /// The user backed out.
    Cancelled,
}

impl RoleSelection {
    /// Confirmed roles; a cancelled selection is a read failure.
    pub fn into_roles(self) -> ImportResult<(Role, Role)> {
        match self {
            Self::Confirmed { input, output } => Ok((input, output)),
            Self::Cancelled => Err(ImportError::CannotRead("role selection cancelled".into())),
        }
    }
}

/// Confirms or overrides the inferred roles.
pub trait RoleSelector {
    /// Picks the roles for an import.
    fn select(&mut self, request: &RoleRequest<'_>) -> RoleSelection;
}

/// Takes the inferred roles as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefaults;

impl RoleSelector for AcceptDefaults {
    fn select(&mut self, request: &RoleRequest<'_>) -> RoleSelection {
        RoleSelection::Confirmed {
            input: request.input,
            output: request.output,
        }
    }
}

/// Replaces either inferred role with a fixed one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRoles {
    /// Input override.
    pub input: Option<Role>,
    /// Output override.
    pub output: Option<Role>,
}

impl RoleSelector for FixedRoles {
    fn select(&mut self, request: &RoleRequest<'_>) -> RoleSelection {
        RoleSelection::Confirmed {
            input: self.input.unwrap_or(request.input),
            output: self.output.unwrap_or(request.output),
        }
    }
}

/// Always cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cancel;

impl RoleSelector for Cancel {
    fn select(&mut self, _request: &RoleRequest<'_>) -> RoleSelection {
        RoleSelection::Cancelled
    }
}

impl<S: RoleSelector + ?Sized> RoleSelector for Box<S> {
    fn select(&mut self, request: &RoleRequest<'_>) -> RoleSelection {
        (**self).select(request)
    }
}

/// Which menu changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Input,
    Output,
}

/// Dialog model: role menus plus a preview surface kept in sync with them.
pub struct RoleDialog<'r, D: GpuDevice> {
    resolver: &'r TransformResolver,
    surface: PreviewSurface<D>,
    input: Role,
    output: Role,
    input_roles: Vec<Role>,
    output_roles: Vec<Role>,
}

impl<'r, D: GpuDevice> RoleDialog<'r, D> {
    /// Builds the preview for `request` and selects its roles.
    ///
    /// A role pair that cannot be previewed is logged; the dialog still
    /// opens so the user can pick another.
    pub fn open(
        device: D,
        resolver: &'r TransformResolver,
        request: &RoleRequest<'_>,
        edge: usize,
        mode: ShaderMode,
    ) -> ImportResult<Self> {
        let surface = PreviewSurface::new(device, request.metadata, request.pixels, edge, mode)?;
        let mut dialog = Self {
            resolver,
            surface,
            input: request.input,
            output: request.output,
            input_roles: request.input_roles.clone(),
            output_roles: request.output_roles.clone(),
        };
        if let Err(e) = dialog.refresh(dialog.input, dialog.output) {
            warn!(input = %dialog.input, output = %dialog.output, "initial preview failed: {e}");
        }
        Ok(dialog)
    }

    /// Current input role.
    pub fn input_role(&self) -> Role {
        self.input
    }

    /// Current output role.
    pub fn output_role(&self) -> Role {
        self.output
    }

    /// Input menu labels.
    pub fn input_labels(&self) -> Vec<&'static str> {
        self.input_roles.iter().map(|r| r.label()).collect()
    }

    /// Output menu labels.
    pub fn output_labels(&self) -> Vec<&'static str> {
        self.output_roles.iter().map(|r| r.label()).collect()
    }

    /// The preview surface.
    pub fn surface(&self) -> &PreviewSurface<D> {
        &self.surface
    }

    /// Selects an input role.
    ///
    /// # Errors
    ///
    /// When the preview cannot follow; the previous role stays selected.
    pub fn set_input_role(&mut self, role: Role) -> ImportResult<()> {
        self.change(Side::Input, role)
    }

    /// Selects an output role. Same rules as [`set_input_role`](Self::set_input_role).
    pub fn set_output_role(&mut self, role: Role) -> ImportResult<()> {
        self.change(Side::Output, role)
    }

    /// Selects a role by menu label.
    pub fn set_input_label(&mut self, label: &str) -> ImportResult<()> {
        self.set_input_role(Role::from_label(label))
    }

    /// Selects an output role by menu label.
    pub fn set_output_label(&mut self, label: &str) -> ImportResult<()> {
        self.set_output_role(Role::from_label(label))
    }

    fn change(&mut self, side: Side, role: Role) -> ImportResult<()> {
        let (input, output) = match side {
            Side::Input => (role, self.output),
            Side::Output => (self.input, role),
        };
        match self.refresh(input, output) {
            Ok(_) => {
                self.input = input;
                self.output = output;
                Ok(())
            }
            Err(e) => {
                let kept = match side {
                    Side::Input => self.input,
                    Side::Output => self.output,
                };
                warn!(?side, rejected = %role, %kept, "role change reverted: {e}");
                Err(e)
            }
        }
    }

    fn refresh(&mut self, input: Role, output: Role) -> ImportResult<SyncOutcome> {
        let processor = self.resolver.resolve(input, output)?;
        let outcome = self.surface.sync(&processor)?;
        debug!(%input, %output, ?outcome, "preview synced");
        Ok(outcome)
    }

    /// Accepts the dialog.
    pub fn accept(self) -> RoleSelection {
        RoleSelection::Confirmed {
            input: self.input,
            output: self.output,
        }
    }

    /// Dismisses the dialog.
    pub fn reject(self) -> RoleSelection {
        RoleSelection::Cancelled
    }
}

impl<D: GpuDevice> std::fmt::Debug for RoleDialog<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleDialog")
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
