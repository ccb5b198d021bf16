//! Scatter plot of weight against duration.
//!
//! Raw points only: no fitting, binning or regression.

use crate::error::Error;
use crate::harness::ResultSet;
use hwprobe_util::fs::atomic_write;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Consumes a finished result set.
pub trait Visualizer {
    fn render(&self, results: &ResultSet) -> Result<(), Error>;
}

/// Writes an SVG scatter plot: Hamming weight on X, seconds on Y.
#[derive(Debug, Clone)]
pub struct ScatterPlot {
    path: PathBuf,
    size: (u32, u32),
    title: String,
}

impl ScatterPlot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: (1200, 800),
            title: "Subject duration vs input Hamming weight".to_string(),
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw(&self, results: &ResultSet, svg: &mut String) -> Result<(), String> {
        let (x_range, y_range) = axis_ranges(results);

        let root = SVGBackend::with_string(svg, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(x_range, y_range)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_desc("Hamming weight")
            .y_desc("duration (s)")
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(results.records().map(|r| {
                Circle::new(
                    (r.weight as f64, r.duration.as_secs_f64()),
                    2,
                    RED.filled(),
                )
            }))
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl Visualizer for ScatterPlot {
    fn render(&self, results: &ResultSet) -> Result<(), Error> {
        let mut svg = String::new();
        self.draw(results, &mut svg).map_err(|reason| Error::Render {
            path: self.path.clone(),
            reason,
        })?;
        atomic_write(&self.path, svg.as_bytes()).map_err(|e| Error::Render {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

/// Padded axis ranges covering every point. Degenerate data gets a unit span.
#[allow(clippy::cast_precision_loss)]
fn axis_ranges(results: &ResultSet) -> (Range<f64>, Range<f64>) {
    let weights = results.weights();
    let (x_min, x_max) = match (weights.iter().min(), weights.iter().max()) {
        (Some(&lo), Some(&hi)) => (lo as f64, hi as f64),
        _ => (0.0, 1.0),
    };
    let x_pad = ((x_max - x_min) * 0.05).max(1.0);

    let y_max = results
        .durations()
        .iter()
        .map(std::time::Duration::as_secs_f64)
        .fold(0.0_f64, f64::max);
    let y_top = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };

    ((x_min - x_pad)..(x_max + x_pad), 0.0..y_top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TrialRecord;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_render_writes_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scatter.svg");

        let mut results = ResultSet::new();
        for (weight, micros) in [(31_000, 900), (31_100, 950), (30_950, 1_020)] {
            results.push(TrialRecord {
                weight,
                duration: Duration::from_micros(micros),
            });
        }

        ScatterPlot::new(&path).with_size(640, 480).render(&results).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn test_render_empty_result_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.svg");

        ScatterPlot::new(&path).render(&ResultSet::new()).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("<svg"));
    }

    #[test]
    fn test_axis_ranges_cover_points() {
        let mut results = ResultSet::new();
        results.push(TrialRecord {
            weight: 500,
            duration: Duration::from_millis(20),
        });

        let (x, y) = axis_ranges(&results);
        assert!(x.start < 500.0 && x.end > 500.0);
        assert!(y.start <= 0.0 && y.end > 0.02);
    }

    #[test]
    fn test_axis_ranges_empty() {
        let (x, y) = axis_ranges(&ResultSet::new());
        assert!(x.start < x.end);
        assert_eq!(y, 0.0..1.0);
    }
}
