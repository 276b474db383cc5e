use crate::config::Settings;

/// Panel styling and the animated `background_alpha` property.
pub trait Theming {
    fn maximized_opacity(&self) -> u8;
    fn unmaximized_opacity(&self) -> u8;
    fn background_alpha(&self) -> f64;
    fn set_background_alpha(&mut self, alpha: f64);
    fn set_panel_color(&mut self);
    fn set_corner_color(&mut self, alpha: u8);
    fn strip_panel_styling(&mut self);
    fn reapply_panel_styling(&mut self);
}

/// The bits of shell UI state that gate fades.
pub trait Shell {
    fn overview_shown(&self) -> bool;
}

/// In-process panel model driven by the daemon. It stands in for the
/// compositor-side actor: every write is recorded and logged.
#[derive(Clone, Debug)]
pub struct PanelBackend {
    maximized_opacity: u8,
    unmaximized_opacity: u8,
    background_alpha: f64,
    corner_alpha: u8,
    styled: bool,
    overview_shown: bool,
}

impl PanelBackend {
    pub fn new(settings: &Settings) -> Self {
        Self {
            maximized_opacity: settings.maximized_opacity,
            unmaximized_opacity: settings.unmaximized_opacity,
            background_alpha: f64::from(settings.maximized_opacity),
            corner_alpha: settings.maximized_opacity,
            styled: true,
            overview_shown: false,
        }
    }

    pub fn update_opacities(&mut self, settings: &Settings) {
        self.maximized_opacity = settings.maximized_opacity;
        self.unmaximized_opacity = settings.unmaximized_opacity;
    }

    pub fn set_overview_shown(&mut self, shown: bool) {
        tracing::debug!(shown, "overview visibility changed");
        self.overview_shown = shown;
    }

    pub fn corner_alpha(&self) -> u8 {
        self.corner_alpha
    }

    pub fn is_styled(&self) -> bool {
        self.styled
    }
}

impl Theming for PanelBackend {
    fn maximized_opacity(&self) -> u8 {
        self.maximized_opacity
    }

    fn unmaximized_opacity(&self) -> u8 {
        self.unmaximized_opacity
    }

    fn background_alpha(&self) -> f64 {
        self.background_alpha
    }

    fn set_background_alpha(&mut self, alpha: f64) {
        // Back and elastic curves overshoot the target.
        self.background_alpha = alpha.clamp(0.0, 255.0);
        tracing::trace!(alpha = self.background_alpha, "panel background alpha");
    }

    fn set_panel_color(&mut self) {
        tracing::debug!(alpha = self.background_alpha, "panel color applied");
    }

    fn set_corner_color(&mut self, alpha: u8) {
        tracing::debug!(alpha, "corner color applied");
        self.corner_alpha = alpha;
    }

    fn strip_panel_styling(&mut self) {
        if self.styled {
            tracing::debug!("panel styling stripped");
        }
        self.styled = false;
    }

    fn reapply_panel_styling(&mut self) {
        if !self.styled {
            tracing::debug!("panel styling reapplied");
        }
        self.styled = true;
    }
}

impl Shell for PanelBackend {
    fn overview_shown(&self) -> bool {
        self.overview_shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_opaque_and_styled() {
        let backend = PanelBackend::new(&Settings::default());
        assert_eq!(backend.background_alpha(), 255.0);
        assert!(backend.is_styled());
        assert!(!backend.overview_shown());
    }

    #[test]
    fn background_alpha_is_clamped() {
        let mut backend = PanelBackend::new(&Settings::default());
        backend.set_background_alpha(270.5);
        assert_eq!(backend.background_alpha(), 255.0);
        backend.set_background_alpha(-3.0);
        assert_eq!(backend.background_alpha(), 0.0);
    }

    #[test]
    fn opacities_follow_settings_reload() {
        let mut backend = PanelBackend::new(&Settings::default());
        let settings = Settings {
            unmaximized_opacity: 90,
            maximized_opacity: 200,
            ..Settings::default()
        };
        backend.update_opacities(&settings);
        assert_eq!(backend.unmaximized_opacity(), 90);
        assert_eq!(backend.maximized_opacity(), 200);
    }
}
