//! Lazily resolved property groups.
//!
//! A [`PropertyGroup`] holds every field of one [`Category`]. Values are not
//! read when the catalogue opens; the first [`get`](PropertyGroup::get) of a
//! name reads its dataset, applies the field's [`UnitSpec`] and caches the
//! resulting array in the slot. Every later `get` returns the same array.

use crate::catalogue::CatalogueHandle;
use crate::error::{Error, Result};
use crate::registration::{Category, FieldDescriptor};
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use velociraptor_units::{UnitAwareArray, UnitSpec};

const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug)]
struct Slot {
    descriptor: FieldDescriptor,
    spec: UnitSpec,
    value: OnceCell<UnitAwareArray>,
}

pub struct PropertyGroup {
    category: Category,
    handle: Rc<CatalogueHandle>,
    slots: BTreeMap<String, Slot>,
}

impl PropertyGroup {
    pub(crate) fn new(category: Category, handle: Rc<CatalogueHandle>) -> Self {
        Self {
            category,
            handle,
            slots: BTreeMap::new(),
        }
    }

    /// Registers a field. Returns `false` and keeps the existing slot if the
    /// normalized name is already taken.
    pub(crate) fn insert(&mut self, descriptor: FieldDescriptor, spec: UnitSpec) -> bool {
        if let Some(existing) = self.slots.get(&descriptor.normalized_name) {
            tracing::warn!(
                category = %self.category,
                name = %descriptor.normalized_name,
                kept = %existing.descriptor.raw_name,
                dropped = %descriptor.raw_name,
                "duplicate normalized name"
            );
            return false;
        }
        self.slots.insert(
            descriptor.normalized_name.clone(),
            Slot {
                descriptor,
                spec,
                value: OnceCell::new(),
            },
        );
        true
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Resolves `name`, reading it from the file on first access.
    ///
    /// # Errors
    /// - [`Error::UseAfterClose`] once the catalogue is closed, even for
    ///   values that were already resolved.
    /// - [`Error::AttributeNotFound`] with the closest known names.
    /// - Read errors from the underlying source.
    pub fn get(&self, name: &str) -> Result<&UnitAwareArray> {
        if !self.handle.is_open() {
            return Err(Error::UseAfterClose);
        }
        let slot = self.slots.get(name).ok_or_else(|| self.not_found(name))?;
        slot.value.get_or_try_init(|| -> Result<UnitAwareArray> {
            let raw_name = &slot.descriptor.raw_name;
            let raw = self.handle.with_source(|source| source.read_f64(raw_name))?;
            tracing::debug!(
                category = %self.category,
                field = %raw_name,
                len = raw.len(),
                "resolved property"
            );
            let (a, h) = self.handle.scaling();
            Ok(slot.spec.apply(raw, a, h).with_name(raw_name.as_str()))
        })
    }

    fn not_found(&self, name: &str) -> Error {
        let mut ranked: Vec<(usize, &String)> = self
            .slots
            .keys()
            .map(|k| (strsim::levenshtein(name, k), k))
            .collect();
        ranked.sort();
        Error::AttributeNotFound {
            category: self.category.to_string(),
            name: name.to_string(),
            suggestions: ranked
                .into_iter()
                .take(MAX_SUGGESTIONS)
                .map(|(_, k)| k.clone())
                .collect(),
        }
    }

    /// Normalized names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.slots.get(name).map(|s| &s.descriptor)
    }

    pub fn unit_spec(&self, name: &str) -> Option<&UnitSpec> {
        self.slots.get(name).map(|s| &s.spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// True once `name` has been read from the file.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.slots.get(name).is_some_and(|s| s.value.get().is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for PropertyGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyGroup")
            .field("category", &self.category)
            .field("names", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::classify;
    use crate::source::MemorySource;
    use velociraptor_units::Unit;

    fn masses(source: MemorySource) -> PropertyGroup {
        let handle = Rc::new(CatalogueHandle::new(Box::new(source), 1.0, 1.0));
        let mut group = PropertyGroup::new(Category::Masses, handle);
        let msun = UnitSpec::new(Unit::named("Msun").unwrap());
        for raw in ["Mass_200crit", "Mass_200mean", "Mass_tot"] {
            group.insert(classify(raw), msun.clone());
        }
        group
    }

    fn source() -> MemorySource {
        MemorySource::new("group")
            .with_f64("Mass_200crit", vec![1.0, 2.0])
            .with_f64("Mass_200mean", vec![3.0, 4.0])
            .with_f64("Mass_tot", vec![5.0, 6.0])
    }

    #[test]
    fn resolves_once_and_returns_same_array() {
        let source = source();
        let counter = source.counter();
        let group = masses(source);

        assert!(!group.is_resolved("mass_200crit"));
        let first = group.get("mass_200crit").unwrap();
        let second = group.get("mass_200crit").unwrap();

        assert!(std::ptr::eq(first, second));
        assert_eq!(counter.count("Mass_200crit"), 1);
        assert_eq!(counter.count("Mass_tot"), 0);
        assert!(group.is_resolved("mass_200crit"));
        assert_eq!(first.name(), Some("Mass_200crit"));
    }

    #[test]
    fn unknown_name_suggests_closest() {
        let group = masses(source());
        match group.get("mass_200crt") {
            Err(Error::AttributeNotFound {
                category,
                suggestions,
                ..
            }) => {
                assert_eq!(category, "masses");
                assert_eq!(suggestions[0], "mass_200crit");
                assert!(suggestions.len() <= 3);
            }
            other => panic!("unexpected {:?}", other.map(|a| a.len())),
        }
    }

    #[test]
    fn duplicate_normalized_name_keeps_first() {
        let mut group = masses(source());
        let mut dup = classify("Mass_tot");
        dup.raw_name = "MASS_TOT".to_string();
        assert!(!group.insert(dup, UnitSpec::dimensionless()));
        assert_eq!(group.descriptor("mass_tot").unwrap().raw_name, "Mass_tot");
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn names_are_sorted() {
        let group = masses(source());
        let names: Vec<&str> = group.names().collect();
        assert_eq!(names, vec!["mass_200crit", "mass_200mean", "mass_tot"]);
        assert!(group.contains("mass_tot"));
        assert!(!group.is_empty());
    }
}
