//! Per-halo particle membership from `catalog_groups` / `catalog_particles`.
//!
//! The groups file stores, per halo row, where the halo's particles start in
//! the particles file (`Offset`), where its unbound particles start
//! (`Offset_unbound`) and how many particles it has in total
//! (`Group_Size`). For a halo at row `i`:
//!
//! ```text
//! bound   = Particle_IDs[Offset[i] .. Offset_unbound[i]]
//! unbound = Particle_IDs[Offset_unbound[i] .. Offset[i] + Group_Size[i]]
//! ```
//!
//! Halo ids come from an optional `Halo_ID` dataset and default to `row + 1`,
//! matching the `ID` field of the properties file. Catalogue properties are
//! joined on that id, not on the row.

use crate::catalogue::Catalogue;
use crate::error::{Error, Result};
use crate::source::Source;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use velociraptor_units::Quantity;

#[cfg(feature = "hdf5")]
use crate::source::Hdf5Source;
#[cfg(feature = "hdf5")]
use std::path::{Path, PathBuf};

const PARTICLE_IDS: &str = "Particle_IDs";

/// One halo's block in the particles file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupEntry {
    pub halo_id: u64,
    /// Row in the groups (and properties) file.
    pub row: usize,
    pub offset: usize,
    pub num_bound: usize,
    pub num_unbound: usize,
}

impl GroupEntry {
    pub fn bound_range(&self) -> Range<usize> {
        self.offset..self.offset + self.num_bound
    }

    pub fn unbound_range(&self) -> Range<usize> {
        let start = self.offset + self.num_bound;
        start..start + self.num_unbound
    }

    pub fn size(&self) -> usize {
        self.num_bound + self.num_unbound
    }
}

/// Validated offset table, indexed by halo id.
#[derive(Debug, Clone, Default)]
pub struct GroupOffsetTable {
    entries: Vec<GroupEntry>,
    index: HashMap<u64, usize>,
}

impl GroupOffsetTable {
    /// Reads `Offset`, `Offset_unbound`, `Group_Size` and, if present,
    /// `Halo_ID` from a groups file.
    pub fn from_source(groups: &dyn Source, num_particles: usize) -> Result<Self> {
        let names = groups.dataset_names()?;
        let halo_ids = if names.iter().any(|n| n == "Halo_ID") {
            Some(groups.read_u64("Halo_ID")?)
        } else {
            None
        };
        Self::from_arrays(
            halo_ids,
            &groups.read_u64("Offset")?,
            &groups.read_u64("Offset_unbound")?,
            &groups.read_u64("Group_Size")?,
            num_particles,
        )
        .map_err(|e| match e {
            Error::Format { message, .. } => Error::format(&groups.describe(), message),
            other => other,
        })
    }

    /// Builds and validates the table.
    ///
    /// # Errors
    /// [`Error::Format`] if the arrays differ in length, a halo's unbound
    /// offset lies outside its block, blocks overlap or run backwards, a
    /// block extends past `num_particles`, or halo ids repeat.
    pub fn from_arrays(
        halo_ids: Option<Vec<u64>>,
        offsets: &[u64],
        offsets_unbound: &[u64],
        sizes: &[u64],
        num_particles: usize,
    ) -> Result<Self> {
        const CONTEXT: &str = "groups table";
        let n = offsets.len();
        if offsets_unbound.len() != n || sizes.len() != n {
            return Err(Error::format(
                CONTEXT,
                format!(
                    "length mismatch: Offset {}, Offset_unbound {}, Group_Size {}",
                    n,
                    offsets_unbound.len(),
                    sizes.len()
                ),
            ));
        }
        let halo_ids = halo_ids.unwrap_or_else(|| (1..=n as u64).collect());
        if halo_ids.len() != n {
            return Err(Error::format(
                CONTEXT,
                format!("Halo_ID has {} entries, expected {}", halo_ids.len(), n),
            ));
        }

        let mut entries = Vec::with_capacity(n);
        let mut index = HashMap::with_capacity(n);
        let mut previous_end = 0usize;
        for row in 0..n {
            let to_usize = |value: u64, dataset: &str| {
                usize::try_from(value).map_err(|_| {
                    Error::format(CONTEXT, format!("row {}: {} {} does not fit in memory", row, dataset, value))
                })
            };
            let offset = to_usize(offsets[row], "Offset")?;
            let unbound = to_usize(offsets_unbound[row], "Offset_unbound")?;
            let size = to_usize(sizes[row], "Group_Size")?;
            let end = offset.checked_add(size).ok_or_else(|| {
                Error::format(
                    CONTEXT,
                    format!("row {}: block of {} at {} overflows", row, size, offset),
                )
            })?;
            if unbound < offset || unbound > end {
                return Err(Error::format(
                    CONTEXT,
                    format!(
                        "row {}: Offset_unbound {} outside block {}..{}",
                        row, unbound, offset, end
                    ),
                ));
            }
            if offset < previous_end {
                return Err(Error::format(
                    CONTEXT,
                    format!(
                        "row {}: block starting at {} overlaps previous block ending at {}",
                        row, offset, previous_end
                    ),
                ));
            }
            if end > num_particles {
                return Err(Error::format(
                    CONTEXT,
                    format!(
                        "row {}: block {}..{} exceeds {} particle ids",
                        row, offset, end, num_particles
                    ),
                ));
            }
            let halo_id = halo_ids[row];
            if index.insert(halo_id, row).is_some() {
                return Err(Error::format(CONTEXT, format!("duplicate halo id {}", halo_id)));
            }
            entries.push(GroupEntry {
                halo_id,
                row,
                offset,
                num_bound: unbound - offset,
                num_unbound: end - unbound,
            });
            previous_end = end;
        }
        Ok(Self { entries, index })
    }

    pub fn get(&self, halo_id: u64) -> Option<&GroupEntry> {
        self.index.get(&halo_id).map(|&row| &self.entries[row])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupEntry> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Bound,
    Unbound,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Bound => write!(f, "bound"),
            Binding::Unbound => write!(f, "unbound"),
        }
    }
}

/// Halo properties copied from one catalogue row. Absent fields are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HaloProperties {
    pub mass_200crit: Option<Quantity>,
    pub mass_200mean: Option<Quantity>,
    pub mass_bn98: Option<Quantity>,
    pub r_200crit: Option<Quantity>,
    pub r_200mean: Option<Quantity>,
    pub r_bn98: Option<Quantity>,
    pub r_size: Option<Quantity>,
    pub position: Option<[Quantity; 3]>,
    pub velocity: Option<[Quantity; 3]>,
    pub vmax: Option<Quantity>,
    pub rmax: Option<Quantity>,
}

impl HaloProperties {
    /// Reads row `row` of the standard halo fields.
    ///
    /// # Errors
    /// Only [`Error::UseAfterClose`]; a missing field is `None`.
    pub fn from_catalogue(catalogue: &Catalogue, row: usize) -> Result<Self> {
        if !catalogue.is_open() {
            return Err(Error::UseAfterClose);
        }
        let value = |path: &str| -> Option<Quantity> {
            match catalogue.get(path) {
                Ok(array) => array.quantity(row),
                Err(e) => {
                    tracing::debug!(path, error = %e, "halo property unavailable");
                    None
                }
            }
        };
        let triple = |paths: [&str; 3]| -> Option<[Quantity; 3]> {
            Some([value(paths[0])?, value(paths[1])?, value(paths[2])?])
        };
        Ok(Self {
            mass_200crit: value("masses.mass_200crit"),
            mass_200mean: value("masses.mass_200mean"),
            mass_bn98: value("masses.mass_bn98"),
            r_200crit: value("radii.r_200crit"),
            r_200mean: value("radii.r_200mean"),
            r_bn98: value("radii.r_bn98"),
            r_size: value("radii.r_size"),
            position: triple(["positions.xc", "positions.yc", "positions.zc"]),
            velocity: triple(["velocities.vxc", "velocities.vyc", "velocities.vzc"]),
            vmax: value("velocities.vmax"),
            rmax: value("radii.rmax"),
        })
    }
}

/// The bound or unbound particles of one halo.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSelection {
    pub halo_id: u64,
    pub binding: Binding,
    pub particle_ids: Vec<u64>,
    pub properties: Option<HaloProperties>,
}

impl ParticleSelection {
    pub fn len(&self) -> usize {
        self.particle_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particle_ids.is_empty()
    }
}

/// An opened groups/particles pair, optionally joined to a catalogue.
pub struct GroupsHandle<'a> {
    table: GroupOffsetTable,
    particles: Box<dyn Source>,
    catalogue: Option<&'a Catalogue>,
}

impl<'a> GroupsHandle<'a> {
    /// Builds the offset table from `groups`; `particles` is kept open for
    /// per-halo reads.
    pub fn from_sources<P: Source + 'static>(
        groups: &dyn Source,
        particles: P,
        catalogue: Option<&'a Catalogue>,
    ) -> Result<Self> {
        let num_particles = particles.dataset_len(PARTICLE_IDS)?;
        let table = GroupOffsetTable::from_source(groups, num_particles)?;
        tracing::debug!(
            groups = %groups.describe(),
            particles = %particles.describe(),
            haloes = table.len(),
            num_particles,
            "built group offset table"
        );
        Ok(Self {
            table,
            particles: Box::new(particles),
            catalogue,
        })
    }

    pub fn table(&self) -> &GroupOffsetTable {
        &self.table
    }

    pub fn catalogue(&self) -> Option<&'a Catalogue> {
        self.catalogue
    }

    fn read_block(&self, range: Range<usize>) -> Result<Vec<u64>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        self.particles.read_u64_range(PARTICLE_IDS, range)
    }

    /// Catalogue properties of the halo in `entry`, matched on halo id.
    ///
    /// A catalogue without an `ID` dataset is assumed to share the groups
    /// file's row order.
    fn join(&self, catalogue: &Catalogue, entry: &GroupEntry) -> Result<Option<HaloProperties>> {
        let row = if catalogue.has_halo_ids() {
            catalogue.row_of_halo(entry.halo_id)?
        } else {
            Some(entry.row)
        };
        match row {
            Some(row) => HaloProperties::from_catalogue(catalogue, row).map(Some),
            None => {
                tracing::debug!(halo_id = entry.halo_id, "halo id not in catalogue");
                Ok(None)
            }
        }
    }

    /// Bound and unbound particles of `halo_id`.
    ///
    /// # Errors
    /// [`Error::HaloNotFound`] for an unknown id; read errors from the
    /// particles file; [`Error::UseAfterClose`] if the joined catalogue was
    /// closed.
    pub fn extract_halo(&self, halo_id: u64) -> Result<(ParticleSelection, ParticleSelection)> {
        let entry = *self.table.get(halo_id).ok_or(Error::HaloNotFound(halo_id))?;
        let properties = match self.catalogue {
            Some(catalogue) => self.join(catalogue, &entry)?,
            None => None,
        };

        let bound = ParticleSelection {
            halo_id,
            binding: Binding::Bound,
            particle_ids: self.read_block(entry.bound_range())?,
            properties: properties.clone(),
        };
        let unbound = ParticleSelection {
            halo_id,
            binding: Binding::Unbound,
            particle_ids: self.read_block(entry.unbound_range())?,
            properties,
        };
        tracing::debug!(
            halo_id,
            bound = bound.len(),
            unbound = unbound.len(),
            "extracted halo particles"
        );
        Ok((bound, unbound))
    }
}

/// Particles path for a groups path: `catalog_groups` becomes
/// `catalog_particles`.
#[cfg(feature = "hdf5")]
pub fn particles_path(groups: &Path) -> Result<PathBuf> {
    let text = groups.to_string_lossy();
    if !text.contains("catalog_groups") {
        return Err(Error::format(
            &text,
            "cannot derive particles file: name does not contain 'catalog_groups'",
        ));
    }
    Ok(PathBuf::from(text.replace("catalog_groups", "catalog_particles")))
}

/// Opens a groups file and its sibling particles file.
#[cfg(feature = "hdf5")]
pub fn load_groups<'a>(
    groups: impl AsRef<Path>,
    catalogue: Option<&'a Catalogue>,
) -> Result<GroupsHandle<'a>> {
    let groups = groups.as_ref();
    load_groups_with(groups, particles_path(groups)?, catalogue)
}

/// Opens an explicit groups/particles pair.
#[cfg(feature = "hdf5")]
pub fn load_groups_with<'a>(
    groups: impl AsRef<Path>,
    particles: impl AsRef<Path>,
    catalogue: Option<&'a Catalogue>,
) -> Result<GroupsHandle<'a>> {
    let groups = Hdf5Source::open(groups)?;
    let particles = Hdf5Source::open(particles)?;
    GroupsHandle::from_sources(&groups, particles, catalogue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn table(offsets: &[u64], unbound: &[u64], sizes: &[u64], n: usize) -> Result<GroupOffsetTable> {
        GroupOffsetTable::from_arrays(None, offsets, unbound, sizes, n)
    }

    #[test]
    fn ranges_split_bound_and_unbound() {
        let t = table(&[0, 5], &[3, 9], &[5, 4], 9).unwrap();
        let e = t.get(2).unwrap();
        assert_eq!(e.row, 1);
        assert_eq!(e.bound_range(), 5..9);
        assert_eq!(e.unbound_range(), 9..9);
        assert_eq!(t.get(1).unwrap().unbound_range(), 3..5);
    }

    #[test]
    fn default_ids_start_at_one() {
        let t = table(&[0, 1, 2], &[1, 2, 3], &[1, 1, 1], 3).unwrap();
        let ids: Vec<u64> = t.iter().map(|e| e.halo_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(t.get(0).is_none());
    }

    #[test]
    fn rejects_overlapping_blocks() {
        let err = table(&[0, 3], &[2, 3], &[5, 2], 10).unwrap_err();
        assert!(err.to_string().contains("overlaps"), "{}", err);
    }

    #[test]
    fn rejects_block_past_particle_ids() {
        assert!(table(&[0], &[2], &[5], 4).is_err());
    }

    #[test]
    fn rejects_unbound_offset_outside_block() {
        assert!(table(&[2], &[1], &[3], 10).is_err());
        assert!(table(&[2], &[6], &[3], 10).is_err());
    }

    #[test]
    fn rejects_offsets_that_overflow() {
        let err = table(&[u64::MAX], &[u64::MAX], &[5], 10).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{}", err);
        assert!(table(&[3], &[3], &[u64::MAX], 10).is_err());
    }

    #[test]
    fn rejects_duplicate_ids_and_length_mismatch() {
        let dup = GroupOffsetTable::from_arrays(Some(vec![7, 7]), &[0, 1], &[1, 2], &[1, 1], 2);
        assert!(matches!(dup, Err(Error::Format { .. })));
        assert!(table(&[0, 1], &[1], &[1, 1], 2).is_err());
    }

    #[test]
    fn empty_blocks_are_not_read() {
        let groups = MemorySource::new("groups")
            .with_u64("Offset", vec![0])
            .with_u64("Offset_unbound", vec![4])
            .with_u64("Group_Size", vec![4]);
        let particles = MemorySource::new("particles").with_u64("Particle_IDs", vec![10, 11, 12, 13]);
        let counter = particles.counter();
        let handle = GroupsHandle::from_sources(&groups, particles, None).unwrap();

        let (bound, unbound) = handle.extract_halo(1).unwrap();
        assert_eq!(bound.particle_ids, vec![10, 11, 12, 13]);
        assert!(unbound.is_empty());
        assert_eq!(counter.count("Particle_IDs"), 1);
        assert!(bound.properties.is_none());
    }

    #[test]
    fn explicit_halo_ids_are_used() {
        let groups = MemorySource::new("groups")
            .with_u64("Halo_ID", vec![42])
            .with_u64("Offset", vec![0])
            .with_u64("Offset_unbound", vec![1])
            .with_u64("Group_Size", vec![2]);
        let particles = MemorySource::new("particles").with_u64("Particle_IDs", vec![5, 6]);
        let handle = GroupsHandle::from_sources(&groups, particles, None).unwrap();
        assert!(matches!(handle.extract_halo(1), Err(Error::HaloNotFound(1))));
        let (bound, unbound) = handle.extract_halo(42).unwrap();
        assert_eq!((bound.particle_ids, unbound.particle_ids), (vec![5], vec![6]));
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn particles_path_replaces_stem() {
        let p = particles_path(Path::new("/data/halos_0036.catalog_groups")).unwrap();
        assert_eq!(p, PathBuf::from("/data/halos_0036.catalog_particles"));
        assert!(particles_path(Path::new("/data/halos.properties")).is_err());
    }
}
