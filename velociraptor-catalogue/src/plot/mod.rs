//! SVG charts of catalogue quantities.
//!
//! Three chart types cover the autoplotter: [`scatter`] of one quantity
//! against another, a [`histogram_2d`] of the same, and a binned
//! [`mass_function`]. Logarithmic axes plot `log10` of the values on a
//! linear scale; non-positive values are dropped from them.

mod decorate;
mod render;

pub use decorate::{redshift_text, Decoration, Horizontal, TextLocation, Vertical};

use crate::error::{Error, Result};
use crate::labels;
use crate::tools::{histogram_2d as bin_2d, linear_edges, MassFunction};
use plotters::prelude::{IntoDrawingArea, SVGBackend};
use render::{Chart, Series, SIZE};
use std::path::Path;
use velociraptor_units::UnitAwareArray;

/// Output file extensions the chart writers accept.
pub const SUPPORTED_FILE_TYPES: &[&str] = &["svg"];

/// Fails with [`Error::Plot`] naming the supported types if `file_type` is
/// not one of [`SUPPORTED_FILE_TYPES`]. Case is ignored.
pub fn check_file_type(file_type: &str) -> Result<()> {
    if SUPPORTED_FILE_TYPES.iter().any(|t| t.eq_ignore_ascii_case(file_type)) {
        return Ok(());
    }
    Err(Error::Plot(format!(
        "unsupported file type '{}' (supported: {})",
        file_type,
        SUPPORTED_FILE_TYPES.join(", ")
    )))
}

/// One chart axis: the data plus optional limits and scaling.
#[derive(Debug, Clone, Copy)]
pub struct Axis<'a> {
    pub array: &'a UnitAwareArray,
    /// Limits in the array's unit, before any log transform.
    pub range: Option<(f64, f64)>,
    pub log: bool,
}

impl<'a> Axis<'a> {
    pub fn new(array: &'a UnitAwareArray) -> Self {
        Self {
            array,
            range: None,
            log: false,
        }
    }

    pub fn with_range(mut self, start: f64, end: f64) -> Self {
        self.range = Some((start, end));
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn label(&self) -> String {
        log_label(&labels::label(self.array), self.log)
    }

    fn project(&self, v: f64) -> Option<f64> {
        project(v, self.log)
    }

    /// Plot-space limits: the configured range, or the padded data extent.
    fn limits(&self, projected: impl Iterator<Item = f64>) -> (f64, f64) {
        match self.range {
            Some((lo, hi)) => match (self.project(lo), self.project(hi)) {
                (Some(lo), Some(hi)) if hi > lo => (lo, hi),
                _ => padded_extent(projected),
            },
            None => padded_extent(projected),
        }
    }
}

fn project(v: f64, log: bool) -> Option<f64> {
    let p = if log {
        if v > 0.0 {
            v.log10()
        } else {
            return None;
        }
    } else {
        v
    };
    p.is_finite().then_some(p)
}

fn log_label(label: &str, log: bool) -> String {
    if log {
        format!(r"$\log_{{10}}$ {}", label).trim_end().to_string()
    } else {
        label.to_string()
    }
}

fn padded_extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = (hi - lo).abs() * 0.1 + 1e-6;
    (lo - pad, hi + pad)
}

fn paired(x: &Axis, y: &Axis) -> Vec<(f64, f64)> {
    x.array
        .iter()
        .zip(y.array.iter())
        .filter_map(|(&xv, &yv)| Some((x.project(xv)?, y.project(yv)?)))
        .collect()
}

fn write_svg(path: &Path, chart: &Chart) -> Result<()> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if let Err(Error::Plot(message)) = check_file_type(extension) {
        return Err(Error::Plot(format!("{}: {}", path.display(), message)));
    }
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    render::draw(root, chart).map_err(|e| Error::Plot(format!("{}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "wrote chart");
    Ok(())
}

/// Scatter of `y` against `x`.
pub fn scatter(path: &Path, x: &Axis, y: &Axis, decoration: &Decoration) -> Result<()> {
    let points = paired(x, y);
    let chart = Chart {
        x_label: x.label(),
        y_label: y.label(),
        x_range: x.limits(points.iter().map(|p| p.0)),
        y_range: y.limits(points.iter().map(|p| p.1)),
        series: Series::Points(points),
        decoration: decoration.clone(),
    };
    write_svg(path, &chart)
}

/// Shaded 2-D histogram of `y` against `x` with `n_bins` per axis.
pub fn histogram_2d(
    path: &Path,
    x: &Axis,
    y: &Axis,
    n_bins: usize,
    decoration: &Decoration,
) -> Result<()> {
    if n_bins == 0 {
        return Err(Error::Plot("2-D histogram needs at least one bin".to_string()));
    }
    let points = paired(x, y);
    let x_range = x.limits(points.iter().map(|p| p.0));
    let y_range = y.limits(points.iter().map(|p| p.1));
    let x_edges = linear_edges(x_range.0, x_range.1, n_bins);
    let y_edges = linear_edges(y_range.0, y_range.1, n_bins);
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
    let counts = bin_2d(&xs, &ys, &x_edges, &y_edges);
    let chart = Chart {
        x_label: x.label(),
        y_label: y.label(),
        x_range,
        y_range,
        series: Series::Cells {
            x_edges,
            y_edges,
            counts,
        },
        decoration: decoration.clone(),
    };
    write_svg(path, &chart)
}

/// Mass function on log-log axes with Poisson error bars.
///
/// `mass_label` names the binned quantity; `sub_label` subscripts `M` in the
/// y-axis label.
pub fn mass_function(
    path: &Path,
    mf: &MassFunction,
    mass_label: &str,
    sub_label: &str,
    decoration: &Decoration,
) -> Result<()> {
    let points: Vec<(f64, f64, f64, f64)> = mf
        .centers
        .iter()
        .zip(mf.values.iter())
        .zip(mf.errors.iter())
        .filter_map(|((&m, &v), &e)| {
            let x = project(m, true)?;
            let y = project(v, true)?;
            let low = project(v - e, true).unwrap_or(y - 1.0);
            let high = project(v + e, true)?;
            Some((x, y, low, high))
        })
        .collect();
    let x_range = padded_extent(points.iter().map(|p| p.0));
    let y_range = padded_extent(points.iter().flat_map(|p| [p.2, p.3]));
    let chart = Chart {
        x_label: log_label(mass_label, true),
        y_label: log_label(
            &labels::mass_function_label(sub_label, mf.values.unit()),
            true,
        ),
        x_range,
        y_range,
        series: Series::ErrorBars {
            label: "Mass function".to_string(),
            points,
        },
        decoration: decoration.clone(),
    };
    write_svg(path, &chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use velociraptor_units::Unit;

    fn msun(values: Vec<f64>) -> UnitAwareArray {
        UnitAwareArray::new(values, Unit::named("Msun").unwrap()).with_name("Mass_200crit")
    }

    #[test]
    fn log_axes_drop_non_positive_values() {
        let x = msun(vec![1e10, 0.0, 1e12]);
        let y = msun(vec![1.0, 2.0, -3.0]);
        let points = paired(&Axis::new(&x).with_log(true), &Axis::new(&y).with_log(true));
        assert_eq!(points, vec![(10.0, 0.0)]);
    }

    #[test]
    fn configured_range_is_projected() {
        let x = msun(vec![1e11]);
        let axis = Axis::new(&x).with_log(true).with_range(1e10, 1e14);
        let (lo, hi) = axis.limits(std::iter::empty());
        assert!((lo - 10.0).abs() < 1e-12 && (hi - 14.0).abs() < 1e-12);
        assert!(axis.label().starts_with(r"$\log_{10}$ Mass"));
    }

    #[test]
    fn empty_data_gets_unit_range() {
        assert_eq!(padded_extent(std::iter::empty()), (-1.0, 1.0));
    }

    #[test]
    fn writes_svg_files() {
        let dir = tempfile::tempdir().unwrap();
        let x = msun(vec![1e10, 1e11, 1e12]);
        let y = msun(vec![2e10, 3e11, 4e12]);
        let (ax, ay) = (Axis::new(&x).with_log(true), Axis::new(&y).with_log(true));
        let deco = Decoration::default().with_redshift(0.0, 1.0, TextLocation::LOWER_RIGHT);

        let scatter_path = dir.path().join("scatter.svg");
        scatter(&scatter_path, &ax, &ay, &deco).unwrap();
        let svg = std::fs::read_to_string(&scatter_path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("z=0.000, a=1.000"));

        let hist_path = dir.path().join("hist.svg");
        histogram_2d(&hist_path, &ax, &ay, 4, &deco).unwrap();
        assert!(hist_path.exists());
    }

    #[test]
    fn rejects_raster_output() {
        let dir = tempfile::tempdir().unwrap();
        let x = msun(vec![1.0]);
        let err = scatter(&dir.path().join("a.png"), &Axis::new(&x), &Axis::new(&x), &Decoration::default())
            .unwrap_err();
        assert!(matches!(err, Error::Plot(_)));
        assert!(err.to_string().contains("supported: svg"), "{}", err);
    }

    #[test]
    fn file_types_are_checked_case_insensitively() {
        assert!(check_file_type("svg").is_ok());
        assert!(check_file_type("SVG").is_ok());
        let err = check_file_type("pdf").unwrap_err();
        assert!(err.to_string().contains("'pdf'"), "{}", err);
        assert!(err.to_string().contains("svg"), "{}", err);
    }
}
