//! Mapping halo selections onto a simulation snapshot.
//!
//! Snapshot formats are not read here. A caller supplies a
//! [`SnapshotReader`] that can load the particles inside a box; this module
//! builds that box around a halo and marks which of the loaded particles
//! belong to the halo.

use crate::error::{Error, Result};
use crate::particles::ParticleSelection;
use std::collections::{BTreeMap, HashSet};
use velociraptor_units::{Quantity, Unit};

const REGION_UNIT: &str = "Mpc";

/// Axis-aligned box in physical Mpc.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRegion {
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl SpatialRegion {
    /// Cube of half-width `radius` centred on `centre`.
    pub fn around(centre: [f64; 3], radius: f64) -> Self {
        Self {
            lower: centre.map(|c| c - radius),
            upper: centre.map(|c| c + radius),
        }
    }

    pub fn contains(&self, point: [f64; 3]) -> bool {
        (0..3).all(|i| point[i] >= self.lower[i] && point[i] <= self.upper[i])
    }

    pub fn unit(&self) -> Unit {
        Unit::from_named(&[(&velociraptor_units::unit::MPC, 1)])
    }
}

/// Particles a reader returned for a region, by particle type name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotRegion {
    pub particle_ids: BTreeMap<String, Vec<u64>>,
}

impl SnapshotRegion {
    pub fn with_type(mut self, particle_type: &str, ids: Vec<u64>) -> Self {
        self.particle_ids.insert(particle_type.to_string(), ids);
        self
    }
}

pub trait SnapshotReader {
    fn load_region(&mut self, region: &SpatialRegion) -> Result<SnapshotRegion>;
}

/// Membership of a halo's particles within a loaded snapshot region.
///
/// `masks[type][i]` is true when the `i`-th particle of that type in the
/// [`SnapshotRegion`] belongs to the halo.
#[derive(Debug, Clone, PartialEq)]
pub struct HaloMask {
    pub halo_id: u64,
    pub region: SpatialRegion,
    pub masks: BTreeMap<String, Vec<bool>>,
}

impl HaloMask {
    pub fn count(&self, particle_type: &str) -> usize {
        self.masks
            .get(particle_type)
            .map_or(0, |m| m.iter().filter(|&&b| b).count())
    }

    pub fn total(&self) -> usize {
        self.masks.keys().map(|k| self.count(k)).sum()
    }
}

fn in_region_units(q: &Quantity) -> Result<f64> {
    Ok(q.to_value(REGION_UNIT)?)
}

/// Box `[x - r, x + r]` around the halo centre, with `r` the halo's
/// `r_size`, or `r_200crit` when `r_size` is missing.
///
/// # Errors
/// [`Error::MissingHaloProperty`] if the selection was not joined to a
/// catalogue or lacks a position or radius.
pub fn region_for_halo(selection: &ParticleSelection) -> Result<SpatialRegion> {
    let missing = |property: &str| Error::MissingHaloProperty {
        halo_id: selection.halo_id,
        property: property.to_string(),
    };
    let properties = selection
        .properties
        .as_ref()
        .ok_or_else(|| missing("position"))?;
    let position = properties.position.as_ref().ok_or_else(|| missing("position"))?;
    let radius = properties
        .r_size
        .as_ref()
        .or(properties.r_200crit.as_ref())
        .ok_or_else(|| missing("r_size"))?;

    let centre = [
        in_region_units(&position[0])?,
        in_region_units(&position[1])?,
        in_region_units(&position[2])?,
    ];
    Ok(SpatialRegion::around(centre, in_region_units(radius)?))
}

/// Loads the halo's region from `reader` and flags the halo's particles.
pub fn to_snapshot_mask<R: SnapshotReader + ?Sized>(
    selection: &ParticleSelection,
    reader: &mut R,
) -> Result<HaloMask> {
    let region = region_for_halo(selection)?;
    let loaded = reader.load_region(&region)?;
    let members: HashSet<u64> = selection.particle_ids.iter().copied().collect();
    let masks: BTreeMap<String, Vec<bool>> = loaded
        .particle_ids
        .into_iter()
        .map(|(ptype, ids)| (ptype, ids.iter().map(|id| members.contains(id)).collect()))
        .collect();
    let mask = HaloMask {
        halo_id: selection.halo_id,
        region,
        masks,
    };
    tracing::debug!(
        halo_id = selection.halo_id,
        members = mask.total(),
        "built snapshot mask"
    );
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{Binding, HaloProperties};

    struct FixedReader {
        region: SnapshotRegion,
        requested: Vec<SpatialRegion>,
    }

    impl SnapshotReader for FixedReader {
        fn load_region(&mut self, region: &SpatialRegion) -> Result<SnapshotRegion> {
            self.requested.push(region.clone());
            Ok(self.region.clone())
        }
    }

    fn q(value: f64, unit: &str) -> Quantity {
        Quantity::new(value, unit.parse().unwrap())
    }

    fn selection(properties: Option<HaloProperties>) -> ParticleSelection {
        ParticleSelection {
            halo_id: 7,
            binding: Binding::Bound,
            particle_ids: vec![1, 3, 5],
            properties,
        }
    }

    fn located(r_size: Option<Quantity>) -> HaloProperties {
        HaloProperties {
            position: Some([q(10.0, "Mpc"), q(20.0, "Mpc"), q(30.0, "Mpc")]),
            r_size,
            r_200crit: Some(q(500.0, "kpc")),
            ..HaloProperties::default()
        }
    }

    #[test]
    fn region_uses_r_size() {
        let region = region_for_halo(&selection(Some(located(Some(q(1.0, "Mpc")))))).unwrap();
        assert_eq!(region.lower, [9.0, 19.0, 29.0]);
        assert_eq!(region.upper, [11.0, 21.0, 31.0]);
        assert!(region.contains([10.5, 20.0, 30.9]));
        assert!(!region.contains([11.5, 20.0, 30.0]));
    }

    #[test]
    fn region_falls_back_to_r_200crit() {
        let region = region_for_halo(&selection(Some(located(None)))).unwrap();
        assert!((region.upper[0] - 10.5).abs() < 1e-12);
    }

    #[test]
    fn region_requires_catalogue_join() {
        match region_for_halo(&selection(None)) {
            Err(Error::MissingHaloProperty { halo_id, property }) => {
                assert_eq!(halo_id, 7);
                assert_eq!(property, "position");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn mask_flags_members_per_type() {
        let mut reader = FixedReader {
            region: SnapshotRegion::default()
                .with_type("PartType0", vec![1, 2, 3])
                .with_type("PartType1", vec![4, 5]),
            requested: Vec::new(),
        };
        let mask = to_snapshot_mask(&selection(Some(located(Some(q(1.0, "Mpc"))))), &mut reader)
            .unwrap();
        assert_eq!(mask.masks["PartType0"], vec![true, false, true]);
        assert_eq!(mask.masks["PartType1"], vec![false, true]);
        assert_eq!(mask.total(), 3);
        assert_eq!(mask.count("PartType4"), 0);
        assert_eq!(reader.requested, vec![mask.region.clone()]);
    }
}
