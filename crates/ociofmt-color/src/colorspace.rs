//! Color space definition.
//!
//! A color space knows how to reach the config's reference space. Either
//! direction may be omitted; the missing one is derived by inverting the
//! other, and a space with neither is the reference itself.
//!
//! ```
//! use ociofmt_color::{ColorSpace, Transform, TransferStyle, TransformDirection};
//!
//! let cs = ColorSpace::builder("sRGB")
//!     .family("display")
//!     .from_reference(Transform::builtin(TransferStyle::Srgb, TransformDirection::Forward))
//!     .build();
//!
//! assert!(cs.matches_name("srgb"));
//! assert!(cs.to_reference().is_none());
//! ```

use crate::transform::Transform;

/// Color space definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpace {
    name: String,
    aliases: Vec<String>,
    family: String,
    description: String,
    is_data: bool,
    to_reference: Option<Transform>,
    from_reference: Option<Transform>,
}

impl ColorSpace {
    /// Creates a reference color space with no transforms.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            family: String::new(),
            description: String::new(),
            is_data: false,
            to_reference: None,
            from_reference: None,
        }
    }

    /// Starts a builder.
    #[inline]
    pub fn builder(name: impl Into<String>) -> ColorSpaceBuilder {
        ColorSpaceBuilder { cs: Self::new(name) }
    }

    /// Name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aliases.
    #[inline]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Family, free-form.
    #[inline]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Non-color data; conversions to or from it are identities.
    #[inline]
    pub fn is_data(&self) -> bool {
        self.is_data
    }

    /// Transform to the reference space, if given.
    #[inline]
    pub fn to_reference(&self) -> Option<&Transform> {
        self.to_reference.as_ref()
    }

    /// Transform from the reference space, if given.
    #[inline]
    pub fn from_reference(&self) -> Option<&Transform> {
        self.from_reference.as_ref()
    }

    /// Transform to reference, inverting `from_reference` when only that is given.
    pub fn to_reference_or_inverse(&self) -> Option<Transform> {
        self.to_reference
            .clone()
            .or_else(|| self.from_reference.clone().map(Transform::inverse))
    }

    /// Transform from reference, inverting `to_reference` when only that is given.
    pub fn from_reference_or_inverse(&self) -> Option<Transform> {
        self.from_reference
            .clone()
            .or_else(|| self.to_reference.clone().map(Transform::inverse))
    }

    /// Case-insensitive match against the name and aliases.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Builder for [`ColorSpace`].
#[derive(Debug)]
pub struct ColorSpaceBuilder {
    cs: ColorSpace,
}

impl ColorSpaceBuilder {
    /// Adds an alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.cs.aliases.push(alias.into());
        self
    }

    /// Sets the family.
    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.cs.family = family.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.cs.description = desc.into();
        self
    }

    /// Marks the space as non-color data.
    pub fn is_data(mut self, is_data: bool) -> Self {
        self.cs.is_data = is_data;
        self
    }

    /// Sets the to-reference transform.
    pub fn to_reference(mut self, transform: Transform) -> Self {
        self.cs.to_reference = Some(transform);
        self
    }

    /// Sets the from-reference transform.
    pub fn from_reference(mut self, transform: Transform) -> Self {
        self.cs.from_reference = Some(transform);
        self
    }

    /// Finishes the color space.
    pub fn build(self) -> ColorSpace {
        self.cs
    }
}
