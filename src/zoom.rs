//! Zoom state for the page viewer
//!
//! Tracks the requested zoom (preset or ratio) alongside the numeric scale
//! last reported by the renderer, and implements toolbar zoom stepping.

use crate::view_state::ZoomSpec;

/// Requested zoom and effective scale factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    /// What the user or the initial view asked for
    pub spec: ZoomSpec,

    /// Effective scale (1.0 = 100%). For presets this is whatever the
    /// renderer last reported.
    pub factor: f64,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            spec: ZoomSpec::Auto,
            factor: 1.0,
        }
    }
}

impl Zoom {
    /// Multiplier per zoom step
    pub const SCALE_DELTA: f64 = 1.1;
    /// Smallest allowed scale
    pub const MIN_SCALE: f64 = 0.25;
    /// Largest allowed scale
    pub const MAX_SCALE: f64 = 10.0;

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Request a zoom. Ratios take effect immediately; presets keep the
    /// current factor until the renderer reports the fitted scale.
    pub fn set_spec(&mut self, spec: ZoomSpec) {
        self.spec = match spec {
            ZoomSpec::Ratio(r) => {
                self.factor = Self::clamp_factor(r);
                ZoomSpec::Ratio(self.factor)
            }
            preset => preset,
        };
    }

    /// Record the scale the renderer settled on.
    pub fn report_factor(&mut self, factor: f64) {
        self.factor = Self::clamp_factor(factor);
        if !self.spec.is_preset() {
            self.spec = ZoomSpec::Ratio(self.factor);
        }
    }

    /// Zoom in by `ticks` steps, rounding up to one decimal per step
    pub fn step_in(&mut self, ticks: u32) {
        let mut scale = self.factor;
        for _ in 0..ticks.max(1) {
            scale = round_to(scale * Self::SCALE_DELTA, 2);
            scale = ((scale * 10.0) - 1e-9).ceil() / 10.0;
            scale = scale.min(Self::MAX_SCALE);
            if scale >= Self::MAX_SCALE {
                break;
            }
        }
        self.set_spec(ZoomSpec::Ratio(scale));
    }

    /// Zoom out by `ticks` steps, rounding down to one decimal per step
    pub fn step_out(&mut self, ticks: u32) {
        let mut scale = self.factor;
        for _ in 0..ticks.max(1) {
            scale = round_to(scale / Self::SCALE_DELTA, 2);
            scale = ((scale * 10.0) + 1e-9).floor() / 10.0;
            scale = scale.max(Self::MIN_SCALE);
            if scale <= Self::MIN_SCALE {
                break;
            }
        }
        self.set_spec(ZoomSpec::Ratio(scale));
    }

    pub fn can_zoom_in(&self) -> bool {
        self.factor < Self::MAX_SCALE
    }

    pub fn can_zoom_out(&self) -> bool {
        self.factor > Self::MIN_SCALE
    }

    /// Clamp factor to valid range, handling NaN/Inf
    pub fn clamp_factor(factor: f64) -> f64 {
        if !factor.is_finite() {
            1.0
        } else {
            factor.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let m = 10f64.powi(decimals);
    (value * m).round() / m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(factor: f64) -> Zoom {
        let mut zoom = Zoom::default();
        zoom.set_spec(ZoomSpec::Ratio(factor));
        zoom
    }

    #[test]
    fn step_in_rounds_up_to_one_decimal() {
        let mut zoom = at(1.0);
        zoom.step_in(1);
        assert!((zoom.factor() - 1.1).abs() < 1e-9);
        zoom.step_in(1);
        assert!((zoom.factor() - 1.3).abs() < 1e-9);
    }

    #[test]
    fn step_out_rounds_down_to_one_decimal() {
        let mut zoom = at(1.0);
        zoom.step_out(1);
        assert!((zoom.factor() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn stepping_respects_bounds() {
        let mut zoom = at(9.8);
        zoom.step_in(5);
        assert_eq!(zoom.factor(), Zoom::MAX_SCALE);
        assert!(!zoom.can_zoom_in());

        let mut zoom = at(0.3);
        zoom.step_out(3);
        assert_eq!(zoom.factor(), Zoom::MIN_SCALE);
        assert!(!zoom.can_zoom_out());
    }

    #[test]
    fn presets_keep_reported_factor() {
        let mut zoom = Zoom::default();
        zoom.set_spec(ZoomSpec::PageWidth);
        zoom.report_factor(1.37);
        assert_eq!(zoom.spec, ZoomSpec::PageWidth);
        assert!((zoom.factor() - 1.37).abs() < 1e-9);

        zoom.step_in(1);
        assert_eq!(zoom.spec, ZoomSpec::Ratio(1.6));
    }

    #[test]
    fn clamp_factor_handles_non_finite() {
        assert_eq!(Zoom::clamp_factor(f64::NAN), 1.0);
        assert_eq!(Zoom::clamp_factor(f64::INFINITY), 1.0);
        assert_eq!(Zoom::clamp_factor(50.0), Zoom::MAX_SCALE);
    }
}
