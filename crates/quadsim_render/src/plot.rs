//! Telemetry plots for the overlay
//!
//! Converts the telemetry buffer into line strips inside screen-space
//! panels: one panel for joint speed, one for joint torque, one line per
//! joint. Coordinates are normalised device coordinates, y up.

use quadsim_core::{SeriesKind, TelemetryBuffer};

use crate::pipeline::OverlayGeometry;

/// Line colors, cycled per joint
pub const PALETTE: [[f32; 4]; 12] = [
    [0.94, 0.33, 0.31, 1.0],
    [0.98, 0.62, 0.24, 1.0],
    [0.98, 0.86, 0.30, 1.0],
    [0.62, 0.85, 0.33, 1.0],
    [0.30, 0.76, 0.47, 1.0],
    [0.27, 0.78, 0.76, 1.0],
    [0.32, 0.64, 0.93, 1.0],
    [0.40, 0.45, 0.92, 1.0],
    [0.63, 0.42, 0.90, 1.0],
    [0.86, 0.42, 0.82, 1.0],
    [0.93, 0.45, 0.60, 1.0],
    [0.80, 0.80, 0.80, 1.0],
];

const PANEL_COLOR: [f32; 4] = [0.05, 0.06, 0.08, 0.6];
const ZERO_LINE_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.25];

/// A screen-space rectangle in NDC
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelRect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl PanelRect {
    pub fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f32 {
        self.max[1] - self.min[1]
    }

    /// Map unit coordinates (0..1 on both axes) into the panel
    pub fn point(&self, u: f32, v: f32) -> [f32; 2] {
        [self.min[0] + u * self.width(), self.min[1] + v * self.height()]
    }
}

/// Where each plot goes on screen
#[derive(Clone, Debug, PartialEq)]
pub struct PlotLayout {
    pub speed: PanelRect,
    pub torque: PanelRect,
    /// Fraction of the value range added above and below the data
    pub padding: f32,
}

impl Default for PlotLayout {
    /// Two stacked panels in the upper left of the window
    fn default() -> Self {
        Self {
            speed: PanelRect::new([-0.98, 0.40], [-0.38, 0.96]),
            torque: PanelRect::new([-0.98, -0.20], [-0.38, 0.36]),
            padding: 0.1,
        }
    }
}

impl PlotLayout {
    pub fn panel(&self, kind: SeriesKind) -> PanelRect {
        match kind {
            SeriesKind::JointSpeed => self.speed,
            SeriesKind::JointTorque => self.torque,
        }
    }
}

/// Widen `(lo, hi)` by `padding` of its span; flat ranges get a unit span
pub fn padded_range(lo: f64, hi: f64, padding: f64) -> (f64, f64) {
    let span = hi - lo;
    if span.abs() < 1e-9 {
        return (lo - 0.5, hi + 0.5);
    }
    (lo - span * padding, hi + span * padding)
}

/// Position of `value` within `(lo, hi)` as 0..1
pub fn normalize(value: f64, lo: f64, hi: f64) -> f32 {
    if hi - lo <= 0.0 {
        return 0.5;
    }
    ((value - lo) / (hi - lo)).clamp(0.0, 1.0) as f32
}

/// Panel-space points for one series
pub fn series_strip(
    series: &[(f64, f64)],
    time_span: (f64, f64),
    value_range: (f64, f64),
    panel: &PanelRect,
) -> Vec<[f32; 2]> {
    series
        .iter()
        .map(|&(t, v)| {
            panel.point(
                normalize(t, time_span.0, time_span.1),
                normalize(v, value_range.0, value_range.1),
            )
        })
        .collect()
}

/// Build the full telemetry overlay
///
/// Panels are always drawn; lines need at least two samples.
pub fn build_overlay(telemetry: &TelemetryBuffer, layout: &PlotLayout) -> OverlayGeometry {
    let mut overlay = OverlayGeometry::default();

    for kind in SeriesKind::ALL {
        let panel = layout.panel(kind);
        overlay.add_rect(panel.min, panel.max, PANEL_COLOR);

        if telemetry.len() < 2 {
            continue;
        }
        let (Some(time_span), Some((lo, hi))) =
            (telemetry.time_span(), telemetry.value_range(kind))
        else {
            continue;
        };
        let range = padded_range(lo, hi, layout.padding as f64);

        if range.0 < 0.0 && range.1 > 0.0 {
            let v = normalize(0.0, range.0, range.1);
            overlay.add_line(panel.point(0.0, v), panel.point(1.0, v), ZERO_LINE_COLOR);
        }

        for joint in 0..telemetry.joint_count() {
            let strip = series_strip(&telemetry.series(kind, joint), time_span, range, &panel);
            overlay.add_strip(&strip, PALETTE[joint % PALETTE.len()]);
        }
    }

    log::trace!(
        "Telemetry overlay: {} panel vertices, {} line vertices",
        overlay.panels.len(),
        overlay.lines.len()
    );
    overlay
}
