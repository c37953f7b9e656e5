use super::Source;
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum Data {
    F64(Vec<f64>),
    U64(Vec<u64>),
}

impl Data {
    fn len(&self) -> usize {
        match self {
            Data::F64(v) => v.len(),
            Data::U64(v) => v.len(),
        }
    }
}

/// Shared view of the reads a [`MemorySource`] has served.
///
/// Clone it before handing the source to a catalogue; the clone keeps
/// observing the same counters.
#[derive(Debug, Clone, Default)]
pub struct ReadCounter {
    reads: Rc<RefCell<HashMap<String, Vec<Option<Range<usize>>>>>>,
}

impl ReadCounter {
    fn record(&self, name: &str, range: Option<Range<usize>>) {
        self.reads
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push(range);
    }

    /// Number of read requests (full or ranged) against `name`.
    pub fn count(&self, name: &str) -> usize {
        self.reads.borrow().get(name).map_or(0, |r| r.len())
    }

    /// Element ranges of the ranged reads against `name`, in request order.
    pub fn ranges(&self, name: &str) -> Vec<Range<usize>> {
        self.reads
            .borrow()
            .get(name)
            .map(|r| r.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of whole-dataset reads against `name`.
    pub fn full_reads(&self, name: &str) -> usize {
        self.reads
            .borrow()
            .get(name)
            .map_or(0, |r| r.iter().filter(|r| r.is_none()).count())
    }

    pub fn total(&self) -> usize {
        self.reads.borrow().values().map(Vec::len).sum()
    }
}

/// In-memory [`Source`] built with a fluent API.
///
/// ```
/// use velociraptor_catalogue::source::{MemorySource, Source};
///
/// let source = MemorySource::new("synthetic")
///     .with_f64("Mass_200crit", vec![1.0, 2.0])
///     .with_header_attribute("UnitInfo", "Mass_unit_to_solarmass", 1.0e10);
/// assert_eq!(source.dataset_names().unwrap(), vec!["Mass_200crit"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    label: String,
    order: Vec<String>,
    datasets: HashMap<String, Data>,
    header: HashMap<(String, String), f64>,
    dataset_attributes: HashMap<(String, String), f64>,
    counter: ReadCounter,
}

impl MemorySource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    fn insert(mut self, name: &str, data: Data) -> Self {
        if !self.datasets.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.datasets.insert(name.to_string(), data);
        self
    }

    pub fn with_f64(self, name: &str, values: Vec<f64>) -> Self {
        self.insert(name, Data::F64(values))
    }

    pub fn with_u64(self, name: &str, values: Vec<u64>) -> Self {
        self.insert(name, Data::U64(values))
    }

    pub fn with_header_attribute(mut self, group: &str, name: &str, value: f64) -> Self {
        self.header.insert((group.to_string(), name.to_string()), value);
        self
    }

    pub fn with_dataset_attribute(mut self, dataset: &str, name: &str, value: f64) -> Self {
        self.dataset_attributes
            .insert((dataset.to_string(), name.to_string()), value);
        self
    }

    pub fn counter(&self) -> ReadCounter {
        self.counter.clone()
    }

    fn data(&self, name: &str) -> Result<&Data> {
        self.datasets
            .get(name)
            .ok_or_else(|| Error::format(&self.label, format!("no dataset named '{}'", name)))
    }
}

impl Source for MemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn dataset_names(&self) -> Result<Vec<String>> {
        Ok(self.order.clone())
    }

    fn dataset_len(&self, name: &str) -> Result<usize> {
        Ok(self.data(name)?.len())
    }

    fn read_f64(&self, name: &str) -> Result<Vec<f64>> {
        let data = self.data(name)?;
        self.counter.record(name, None);
        Ok(match data {
            Data::F64(v) => v.clone(),
            Data::U64(v) => v.iter().map(|&x| x as f64).collect(),
        })
    }

    fn read_u64(&self, name: &str) -> Result<Vec<u64>> {
        let data = self.data(name)?;
        self.counter.record(name, None);
        Ok(match data {
            Data::F64(v) => v.iter().map(|&x| x as u64).collect(),
            Data::U64(v) => v.clone(),
        })
    }

    fn read_u64_range(&self, name: &str, range: Range<usize>) -> Result<Vec<u64>> {
        let data = self.data(name)?;
        if range.start > range.end || range.end > data.len() {
            return Err(Error::format(
                &self.label,
                format!(
                    "range {}..{} out of bounds for '{}' of length {}",
                    range.start,
                    range.end,
                    name,
                    data.len()
                ),
            ));
        }
        self.counter.record(name, Some(range.clone()));
        Ok(match data {
            Data::F64(v) => v[range].iter().map(|&x| x as u64).collect(),
            Data::U64(v) => v[range].to_vec(),
        })
    }

    fn header_attribute(&self, group: &str, name: &str) -> Result<Option<f64>> {
        Ok(self
            .header
            .get(&(group.to_string(), name.to_string()))
            .copied())
    }

    fn dataset_attribute(&self, dataset: &str, name: &str) -> Result<Option<f64>> {
        Ok(self
            .dataset_attributes
            .get(&(dataset.to_string(), name.to_string()))
            .copied())
    }
}
