//! Plot configuration files.
//!
//! A configuration is a TOML document with one table per plot:
//!
//! ```toml
//! [stellar_mass_halo_mass]
//! type = "scatter"
//! comment = "Central galaxies"
//!
//! [stellar_mass_halo_mass.x]
//! quantity = "masses.mass_200crit"
//! units = "Msun"
//! start = 1e10
//! end = 1e15
//! log = true
//!
//! [stellar_mass_halo_mass.y]
//! quantity = "apertures.mass_star_30_kpc"
//! units = "Msun"
//! log = true
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use velociraptor_units::parse_unit;

pub const DEFAULT_NUMBER_OF_BINS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PlotKind {
    #[serde(rename = "scatter")]
    Scatter,
    #[serde(rename = "2dhistogram")]
    Histogram2d,
    #[serde(rename = "massfunction")]
    MassFunction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// Dotted path into the catalogue, e.g. `masses.mass_200crit`.
    pub quantity: String,
    /// Unit to plot in; the catalogue's unit when absent.
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub log: bool,
}

fn default_bins() -> usize {
    DEFAULT_NUMBER_OF_BINS
}

fn upper_left() -> String {
    "upper left".to_string()
}

fn lower_right() -> String {
    "lower right".to_string()
}

fn lower_left() -> String {
    "lower left".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlotConfig {
    #[serde(rename = "type")]
    pub kind: PlotKind,
    pub x: AxisConfig,
    #[serde(default)]
    pub y: Option<AxisConfig>,
    #[serde(default = "default_bins")]
    pub number_of_bins: usize,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "upper_left")]
    pub legend_loc: String,
    #[serde(default = "lower_right")]
    pub redshift_loc: String,
    #[serde(default = "lower_left")]
    pub comment_loc: String,
}

impl PlotConfig {
    fn validate(&self, name: &str) -> Result<()> {
        let fail = |message: String| Err(Error::Config(format!("plot '{}': {}", name, message)));
        match (self.kind, &self.y) {
            (PlotKind::Scatter | PlotKind::Histogram2d, None) => {
                return fail("a y axis is required".to_string())
            }
            (PlotKind::MassFunction, Some(_)) => {
                return fail("mass functions take only an x axis".to_string())
            }
            _ => {}
        }
        if self.number_of_bins == 0 {
            return fail("number_of_bins must be positive".to_string());
        }
        for axis in std::iter::once(&self.x).chain(self.y.as_ref()) {
            if !axis.quantity.contains('.') {
                return fail(format!(
                    "quantity '{}' must be a dotted path such as masses.mass_200crit",
                    axis.quantity
                ));
            }
            if let Some(units) = &axis.units {
                if let Err(e) = parse_unit(units) {
                    return fail(format!("units '{}': {}", units, e));
                }
            }
            if let (Some(start), Some(end)) = (axis.start, axis.end) {
                if start >= end {
                    return fail(format!("{} axis start {} is not below end {}", axis.quantity, start, end));
                }
            }
        }
        Ok(())
    }
}

/// Named plots, in name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoPlotterConfig {
    pub plots: BTreeMap<String, PlotConfig>,
}

impl AutoPlotterConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let plots: BTreeMap<String, PlotConfig> =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        for (name, plot) in &plots {
            plot.validate(name)?;
        }
        Ok(Self { plots })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|e| match e {
            Error::Config(message) => Error::Config(format!("{}: {}", path.display(), message)),
            other => other,
        })
    }

    pub fn len(&self) -> usize {
        self.plots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"
[halo_mass_function]
type = "massfunction"
number_of_bins = 30

[halo_mass_function.x]
quantity = "masses.mass_200crit"
units = "Msun"
start = 1e10
end = 1e15

[size_mass]
type = "2dhistogram"
comment = "All haloes"
redshift_loc = "upper right"

[size_mass.x]
quantity = "masses.mass_200crit"
log = true

[size_mass.y]
quantity = "radii.r_200crit"
units = "kpc"
"#;

    #[test]
    fn parses_plots_with_defaults() {
        let config = AutoPlotterConfig::from_toml(CONFIG).unwrap();
        assert_eq!(config.len(), 2);

        let mf = &config.plots["halo_mass_function"];
        assert_eq!(mf.kind, PlotKind::MassFunction);
        assert_eq!(mf.number_of_bins, 30);
        assert_eq!(mf.x.start, Some(1e10));
        assert_eq!(mf.legend_loc, "upper left");

        let hist = &config.plots["size_mass"];
        assert_eq!(hist.kind, PlotKind::Histogram2d);
        assert_eq!(hist.number_of_bins, DEFAULT_NUMBER_OF_BINS);
        assert_eq!(hist.redshift_loc, "upper right");
        assert_eq!(hist.comment.as_deref(), Some("All haloes"));
        assert!(hist.x.log);
        assert_eq!(hist.y.as_ref().unwrap().units.as_deref(), Some("kpc"));
    }

    #[test]
    fn rejects_scatter_without_y() {
        let err = AutoPlotterConfig::from_toml(
            "[a]\ntype = \"scatter\"\n[a.x]\nquantity = \"masses.mass_200crit\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("y axis"), "{}", err);
    }

    #[test]
    fn rejects_unknown_units_and_types() {
        let bad_units = "[a]\ntype = \"massfunction\"\n[a.x]\nquantity = \"masses.m\"\nunits = \"furlong\"\n";
        assert!(matches!(AutoPlotterConfig::from_toml(bad_units), Err(Error::Config(_))));
        let bad_type = "[a]\ntype = \"pie\"\n[a.x]\nquantity = \"masses.m\"\n";
        assert!(matches!(AutoPlotterConfig::from_toml(bad_type), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_inverted_range() {
        let text = "[a]\ntype = \"massfunction\"\n[a.x]\nquantity = \"masses.m\"\nstart = 5.0\nend = 1.0\n";
        assert!(AutoPlotterConfig::from_toml(text).is_err());
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let config = AutoPlotterConfig::from_path(file.path()).unwrap();
        assert!(config.plots.contains_key("size_mass"));
        assert!(matches!(
            AutoPlotterConfig::from_path("/nonexistent/plots.toml"),
            Err(Error::Io(_))
        ));
    }
}
