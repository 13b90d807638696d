//! SVG line charts
//!
//! Each chart is drawn server-side into an inline `<svg>`. Series share one
//! y-axis; undefined points (e.g. the warm-up of a rolling mean) break the
//! line instead of dropping to zero.

use std::fmt::Write;

pub const WIDTH: f64 = 800.0;
pub const HEIGHT: f64 = 600.0;
const PADDING: f64 = 48.0;

/// Line colours used by the prediction screen
pub const RED: &str = "#f85149";
pub const GREEN: &str = "#3fb950";
pub const BLUE: &str = "#58a6ff";

/// One named line
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub color: &'static str,
    pub values: Vec<Option<f64>>,
}

impl Series {
    pub fn new(label: impl Into<String>, color: &'static str, values: Vec<Option<f64>>) -> Self {
        Self {
            label: label.into(),
            color,
            values,
        }
    }

    /// Series with every point defined
    pub fn dense(label: impl Into<String>, color: &'static str, values: &[f64]) -> Self {
        Self::new(label, color, values.iter().copied().map(Some).collect())
    }
}

/// A titled chart with axis labels
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

/// Maps data coordinates onto the plot area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    len: usize,
    min: f64,
    max: f64,
}

impl Viewport {
    /// Fit the longest series and the extremes of every defined value
    pub fn fit(series: &[Series]) -> Option<Self> {
        let len = series.iter().map(|s| s.values.len()).max()?;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in series.iter().flat_map(|s| s.values.iter().flatten()) {
            min = min.min(*value);
            max = max.max(*value);
        }
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        if (max - min).abs() < f64::EPSILON {
            min -= 1.0;
            max += 1.0;
        }
        Some(Self { len, min, max })
    }

    pub fn x(&self, index: usize) -> f64 {
        let span = WIDTH - 2.0 * PADDING;
        if self.len <= 1 {
            return PADDING + span / 2.0;
        }
        PADDING + index as f64 * span / (self.len - 1) as f64
    }

    pub fn y(&self, value: f64) -> f64 {
        let span = HEIGHT - 2.0 * PADDING;
        PADDING + (self.max - value) / (self.max - self.min) * span
    }
}

impl LineChart {
    pub fn new(title: impl Into<String>, series: Vec<Series>) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            series,
        }
    }

    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    /// Polyline point lists per series, split at undefined values
    pub fn segments(&self, viewport: &Viewport) -> Vec<Vec<Vec<(f64, f64)>>> {
        self.series
            .iter()
            .map(|series| {
                let mut runs = Vec::new();
                let mut current = Vec::new();
                for (i, value) in series.values.iter().enumerate() {
                    match value {
                        Some(v) => current.push((viewport.x(i), viewport.y(*v))),
                        None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
                        None => {}
                    }
                }
                if !current.is_empty() {
                    runs.push(current);
                }
                runs
            })
            .collect()
    }

    /// Render as a standalone inline SVG element
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg class="chart" viewBox="0 0 {WIDTH} {HEIGHT}" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="{title}">"#,
            title = escape(&self.title)
        );
        let _ = write!(
            svg,
            r#"<rect x="{PADDING}" y="{PADDING}" width="{w}" height="{h}" class="plot-area"/>"#,
            w = WIDTH - 2.0 * PADDING,
            h = HEIGHT - 2.0 * PADDING
        );

        let Some(viewport) = Viewport::fit(&self.series) else {
            svg.push_str(r#"<text x="50%" y="50%" text-anchor="middle" class="axis-label">No data</text></svg>"#);
            return svg;
        };

        for (label, value) in [("max", viewport.max), ("min", viewport.min)] {
            let _ = write!(
                svg,
                r#"<text x="{x}" y="{y:.1}" text-anchor="end" class="tick" data-tick="{label}">{value:.2}</text>"#,
                x = PADDING - 6.0,
                y = viewport.y(value) + 4.0
            );
        }

        for (series, runs) in self.series.iter().zip(self.segments(&viewport)) {
            for run in runs {
                let points: Vec<String> = run.iter().map(|(x, y)| format!("{x:.1},{y:.1}")).collect();
                let _ = write!(
                    svg,
                    r#"<polyline fill="none" stroke="{color}" stroke-width="1.5" points="{points}"/>"#,
                    color = series.color,
                    points = points.join(" ")
                );
            }
        }

        for (i, series) in self.series.iter().enumerate() {
            let y = PADDING + 16.0 + i as f64 * 18.0;
            let _ = write!(
                svg,
                r#"<rect x="{x}" y="{ry:.1}" width="12" height="3" fill="{color}"/><text x="{tx}" y="{y:.1}" class="legend">{label}</text>"#,
                x = PADDING + 12.0,
                ry = y - 4.0,
                tx = PADDING + 30.0,
                color = series.color,
                label = escape(&series.label)
            );
        }

        if !self.x_label.is_empty() {
            let _ = write!(
                svg,
                r#"<text x="{x}" y="{y}" text-anchor="middle" class="axis-label">{label}</text>"#,
                x = WIDTH / 2.0,
                y = HEIGHT - 12.0,
                label = escape(&self.x_label)
            );
        }
        if !self.y_label.is_empty() {
            let _ = write!(
                svg,
                r#"<text x="14" y="{y}" text-anchor="middle" transform="rotate(-90 14 {y})" class="axis-label">{label}</text>"#,
                y = HEIGHT / 2.0,
                label = escape(&self.y_label)
            );
        }

        svg.push_str("</svg>");
        svg
    }
}

fn escape(text: &str) -> String {
    crate::dashboard::escape_html(text)
}
