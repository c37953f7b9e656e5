use super::{histogram, log_edges};
use crate::error::{Error, Result};
use velociraptor_units::{Quantity, Unit, UnitAwareArray};

/// A binned halo mass function.
#[derive(Debug, Clone, PartialEq)]
pub struct MassFunction {
    /// Logarithmic bin centres, in Msun.
    pub centers: UnitAwareArray,
    /// `dn / dlog10 M`, in 1/Mpc**3.
    pub values: UnitAwareArray,
    /// Poisson errors on `values`.
    pub errors: UnitAwareArray,
}

/// Bins `masses` into `n_bins` logarithmic bins between `lowest` and
/// `highest` and normalizes by bin width in `log10 M` and `box_volume`.
///
/// # Errors
/// [`Error::Config`] for an empty or inverted mass range or zero bins;
/// [`Error::Units`] if the inputs are not masses and a volume.
pub fn create_mass_function(
    masses: &UnitAwareArray,
    lowest: &Quantity,
    highest: &Quantity,
    box_volume: &Quantity,
    n_bins: usize,
) -> Result<MassFunction> {
    let msun: Unit = "Msun".parse()?;
    let lo = lowest.to_unit(&msun)?.value;
    let hi = highest.to_unit(&msun)?.value;
    let volume = box_volume.to("Mpc**3")?.value;
    if n_bins == 0 || !(lo > 0.0 && hi > lo) {
        return Err(Error::Config(format!(
            "invalid mass-function binning: {} bins over [{}, {}] Msun",
            n_bins, lo, hi
        )));
    }
    if !(volume > 0.0) {
        return Err(Error::Config(format!("box volume must be positive, got {}", volume)));
    }

    let values = masses.to_unit(&msun)?;
    let edges = log_edges(lo, hi, n_bins);
    let counts = histogram(values.values(), &edges);
    let dlog = (hi.log10() - lo.log10()) / n_bins as f64;
    let norm = 1.0 / (dlog * volume);

    let centers = edges
        .windows(2)
        .map(|w| 10f64.powf(0.5 * (w[0].log10() + w[1].log10())))
        .collect();
    let inverse_volume: Unit = "1/Mpc**3".parse()?;
    Ok(MassFunction {
        centers: UnitAwareArray::new(centers, msun),
        values: UnitAwareArray::new(
            counts.iter().map(|&c| c as f64 * norm).collect(),
            inverse_volume.clone(),
        ),
        errors: UnitAwareArray::new(
            counts.iter().map(|&c| (c as f64).sqrt() * norm).collect(),
            inverse_volume,
        ),
    })
}
