//! Window settings
//!
//! Configuration for window creation.

/// Settings for creating a window.
#[derive(Debug, Clone)]
pub struct WindowSettings {
    /// Window title.
    pub title: String,
    /// Initial window size (width, height) in logical pixels.
    pub size: (u32, u32),
    /// Whether the window is resizable.
    pub resizable: bool,
    /// Whether to enable vsync.
    pub vsync: bool,
    /// Color the frame is cleared to before drawing.
    pub clear_color: wgpu::Color,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "ballistic".to_string(),
            size: (800, 600),
            resizable: true,
            vsync: true,
            clear_color: wgpu::Color {
                r: 0.196,
                g: 0.6,
                b: 0.8,
                a: 1.0,
            },
        }
    }
}

impl WindowSettings {
    /// Create new window settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the initial window size.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Set the clear color from RGB components.
    pub fn clear_color(mut self, r: f64, g: f64, b: f64) -> Self {
        self.clear_color = wgpu::Color { r, g, b, a: 1.0 };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let settings = WindowSettings::new()
            .title("range")
            .size(1024, 768)
            .vsync(false)
            .clear_color(0.0, 0.0, 0.0);

        assert_eq!(settings.title, "range");
        assert_eq!(settings.size, (1024, 768));
        assert!(settings.resizable);
        assert!(!settings.vsync);
        assert_eq!(settings.clear_color.b, 0.0, "clear color was {:?}", settings.clear_color);
    }
}
