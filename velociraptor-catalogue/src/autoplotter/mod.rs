//! Batch plotting from a configuration file.
//!
//! [`AutoPlotterConfig`] describes a set of named plots; [`render_plot`] and
//! [`render_all`] draw them against an open [`Catalogue`].

mod config;

pub use config::{AutoPlotterConfig, AxisConfig, PlotConfig, PlotKind, DEFAULT_NUMBER_OF_BINS};

#[cfg(feature = "plot")]
use crate::catalogue::Catalogue;
#[cfg(feature = "plot")]
use crate::error::{Error, Result};
#[cfg(feature = "plot")]
use crate::labels;
#[cfg(feature = "plot")]
use crate::plot::{self, Axis, Decoration, TextLocation};
#[cfg(feature = "plot")]
use crate::tools::create_mass_function;
#[cfg(feature = "plot")]
use std::path::{Path, PathBuf};
#[cfg(feature = "plot")]
use velociraptor_units::{Quantity, UnitAwareArray};

/// Resolves an axis quantity, converted to the configured units.
#[cfg(feature = "plot")]
fn resolve(catalogue: &Catalogue, axis: &AxisConfig) -> Result<UnitAwareArray> {
    let array = catalogue.get(&axis.quantity)?;
    Ok(match &axis.units {
        Some(units) => array.to(units)?,
        None => array.clone(),
    })
}

#[cfg(feature = "plot")]
fn axis<'a>(array: &'a UnitAwareArray, config: &AxisConfig) -> Axis<'a> {
    let axis = Axis::new(array).with_log(config.log);
    match (config.start, config.end) {
        (Some(start), Some(end)) => axis.with_range(start, end),
        _ => axis,
    }
}

#[cfg(feature = "plot")]
fn decoration(catalogue: &Catalogue, plot: &PlotConfig) -> Result<Decoration> {
    let mut decoration = Decoration::default()
        .with_legend(TextLocation::parse(&plot.legend_loc)?)
        .with_redshift(
            catalogue.redshift(),
            catalogue.scale_factor(),
            TextLocation::parse(&plot.redshift_loc)?,
        );
    if let Some(comment) = &plot.comment {
        decoration = decoration.with_comment(comment, TextLocation::parse(&plot.comment_loc)?);
    }
    Ok(decoration)
}

/// Subscript for the mass-function label: the field name without its stem,
/// so `masses.mass_200crit` gives `200crit`.
#[cfg(feature = "plot")]
fn mass_subscript(quantity: &str) -> String {
    let name = quantity.rsplit_once('.').map_or(quantity, |(_, n)| n);
    name.split('_').skip(1).collect::<Vec<_>>().join(" ")
}

#[cfg(feature = "plot")]
fn draw_mass_function(catalogue: &Catalogue, plot: &PlotConfig, path: &Path, decoration: &Decoration) -> Result<()> {
    let masses = resolve(catalogue, &plot.x)?;
    let unit = masses.unit().clone();
    let (lo, hi) = match (plot.x.start, plot.x.end) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => {
            let positive = masses.iter().copied().filter(|&m| m > 0.0 && m.is_finite());
            let (lo, hi) = positive.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| {
                (lo.min(m), hi.max(m))
            });
            // Widen slightly so the largest halo lands inside the last bin.
            (plot.x.start.unwrap_or(lo), plot.x.end.unwrap_or(hi * 1.001))
        }
    };
    let mf = create_mass_function(
        &masses,
        &Quantity::new(lo, unit.clone()),
        &Quantity::new(hi, unit),
        &catalogue.box_volume(),
        plot.number_of_bins,
    )?;
    let centers = mf.centers.clone().with_name(masses.name().unwrap_or_default());
    plot::mass_function(
        path,
        &mf,
        &labels::label(&centers),
        &mass_subscript(&plot.x.quantity),
        decoration,
    )
}

/// Draws one configured plot into `output_dir/<name>.<file_type>`.
///
/// # Errors
/// Missing catalogue fields, unit mismatches, bad text locations and
/// rendering failures are all returned; nothing is written in that case.
#[cfg(feature = "plot")]
pub fn render_plot(
    catalogue: &Catalogue,
    name: &str,
    plot: &PlotConfig,
    output_dir: &Path,
    file_type: &str,
) -> Result<PathBuf> {
    plot::check_file_type(file_type)?;
    let path = output_dir.join(format!("{}.{}", name, file_type));
    let decoration = decoration(catalogue, plot)?;
    match plot.kind {
        PlotKind::MassFunction => draw_mass_function(catalogue, plot, &path, &decoration)?,
        PlotKind::Scatter | PlotKind::Histogram2d => {
            let y_config = plot
                .y
                .as_ref()
                .ok_or_else(|| Error::Config(format!("plot '{}' has no y axis", name)))?;
            let x = resolve(catalogue, &plot.x)?;
            let y = resolve(catalogue, y_config)?;
            let (x_axis, y_axis) = (axis(&x, &plot.x), axis(&y, y_config));
            if plot.kind == PlotKind::Scatter {
                plot::scatter(&path, &x_axis, &y_axis, &decoration)?;
            } else {
                plot::histogram_2d(&path, &x_axis, &y_axis, plot.number_of_bins, &decoration)?;
            }
        }
    }
    tracing::info!(plot = name, path = %path.display(), "rendered plot");
    Ok(path)
}

/// Draws every configured plot, continuing past failures.
///
/// Returns one result per plot, in name order.
#[cfg(feature = "plot")]
pub fn render_all(
    config: &AutoPlotterConfig,
    catalogue: &Catalogue,
    output_dir: &Path,
    file_type: &str,
) -> Vec<(String, Result<PathBuf>)> {
    config
        .plots
        .iter()
        .map(|(name, plot)| {
            let result = render_plot(catalogue, name, plot, output_dir, file_type);
            if let Err(e) = &result {
                tracing::warn!(plot = %name, error = %e, "plot failed");
            }
            (name.clone(), result)
        })
        .collect()
}
