//! Displays and their views.
//!
//! A display is an output device; each view on it names the color space
//! an image must be converted to for that viewing intent. Views keep file
//! order, so the first one is the fallback default.

/// A named view on a display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    name: String,
    colorspace: String,
}

impl View {
    /// Creates a view.
    pub fn new(name: impl Into<String>, colorspace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colorspace: colorspace.into(),
        }
    }

    /// View name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color space the view converts to.
    #[inline]
    pub fn colorspace(&self) -> &str {
        &self.colorspace
    }
}

/// Display device with ordered views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    name: String,
    views: Vec<View>,
}

impl Display {
    /// Creates a display with no views.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            views: Vec::new(),
        }
    }

    /// Display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a view, replacing one with the same name.
    pub fn add_view(&mut self, view: View) {
        match self.views.iter_mut().find(|v| v.name == view.name) {
            Some(existing) => *existing = view,
            None => self.views.push(view),
        }
    }

    /// Views in file order.
    #[inline]
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Looks up a view by name.
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    /// Default view: the first entry of `active_views` this display defines,
    /// else its first view.
    pub fn default_view(&self, active_views: &[String]) -> Option<&str> {
        active_views
            .iter()
            .find_map(|a| self.view(a))
            .or_else(|| self.views.first())
            .map(View::name)
    }
}

/// Ordered collection of displays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayManager {
    displays: Vec<Display>,
}

impl DisplayManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a display, replacing one with the same name.
    pub fn add_display(&mut self, display: Display) {
        match self.displays.iter_mut().find(|d| d.name == display.name) {
            Some(existing) => *existing = display,
            None => self.displays.push(display),
        }
    }

    /// Displays in file order.
    #[inline]
    pub fn displays(&self) -> &[Display] {
        &self.displays
    }

    /// Looks up a display by name.
    pub fn display(&self, name: &str) -> Option<&Display> {
        self.displays.iter().find(|d| d.name == name)
    }

    /// Default display: the first entry of `active_displays` that exists,
    /// else the first display in file order.
    pub fn default_display(&self, active_displays: &[String]) -> Option<&str> {
        active_displays
            .iter()
            .find_map(|a| self.display(a))
            .or_else(|| self.displays.first())
            .map(Display::name)
    }

    /// Display names in file order.
    pub fn display_names(&self) -> impl Iterator<Item = &str> {
        self.displays.iter().map(Display::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> DisplayManager {
        let mut m = DisplayManager::new();
        let mut srgb = Display::new("sRGB");
        srgb.add_view(View::new("Film", "film_srgb"));
        srgb.add_view(View::new("Raw", "raw"));
        m.add_display(srgb);
        let mut p3 = Display::new("P3");
        p3.add_view(View::new("Raw", "raw"));
        m.add_display(p3);
        m
    }

    #[test]
    fn defaults_follow_file_order() {
        let m = manager();
        assert_eq!(m.default_display(&[]), Some("sRGB"));
        assert_eq!(m.display("sRGB").unwrap().default_view(&[]), Some("Film"));
    }

    #[test]
    fn active_lists_take_precedence() {
        let m = manager();
        let active = vec!["Missing".to_string(), "P3".to_string()];
        assert_eq!(m.default_display(&active), Some("P3"));
        let views = vec!["Raw".to_string()];
        assert_eq!(m.display("sRGB").unwrap().default_view(&views), Some("Raw"));
    }

    #[test]
    fn empty_manager_has_no_default() {
        assert_eq!(DisplayManager::new().default_display(&[]), None);
    }
}
