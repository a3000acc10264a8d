//! Named, coloured collections of completed trials. Exactly one data
//! set receives new trials at any time, and the collection is never
//! empty — deleting the last set is refused with a user-visible
//! message.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use crate::analysis::{analyze, Analysis};
use crate::trial::TrialRecord;

/// d3 category10, the scatter colours the plots key data sets by.
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    pub name: String,
    pub colour: String,
    pub trials: Vec<TrialRecord>,
}

impl DataSet {
    pub fn analyze(&self) -> Analysis {
        analyze(&self.trials)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSetError {
    /// Deleting the only remaining set would violate the non-empty
    /// invariant.
    LastDataSet,
    UnknownId(u32),
}

impl fmt::Display for DataSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSetError::LastDataSet => {
                write!(f, "cannot delete data set: create another data set first")
            }
            DataSetError::UnknownId(id) => write!(f, "no data set with id {}", id),
        }
    }
}

impl Error for DataSetError {}

/// Ordered map from integer id to data set, plus the id currently
/// receiving trials. Ids are never reused after deletion.
#[derive(Debug)]
pub struct DataSets {
    sets: BTreeMap<u32, DataSet>,
    current: u32,
    created: u32,
}

impl DataSets {
    pub fn new() -> Self {
        let mut ds = Self {
            sets: BTreeMap::new(),
            current: 0,
            created: 0,
        };
        ds.add();
        ds
    }

    fn fresh(&mut self) -> DataSet {
        DataSet {
            name: format!("Data Set {}", self.created),
            colour: PALETTE[(self.created as usize - 1) % PALETTE.len()].to_string(),
            trials: Vec::new(),
        }
    }

    /// Creates a new set and makes it current; returns its id.
    pub fn add(&mut self) -> u32 {
        self.created += 1;
        let id = self.created;
        let set = self.fresh();
        self.sets.insert(id, set);
        self.current = id;
        id
    }

    /// Removes a set. The last remaining set cannot be deleted; if the
    /// current set goes, the lowest surviving id becomes current.
    pub fn delete(&mut self, id: u32) -> Result<(), DataSetError> {
        if !self.sets.contains_key(&id) {
            return Err(DataSetError::UnknownId(id));
        }
        if self.sets.len() == 1 {
            return Err(DataSetError::LastDataSet);
        }
        self.sets.remove(&id);
        if self.current == id {
            // BTreeMap keeps keys ordered; non-empty by the guard above
            self.current = *self.sets.keys().next().unwrap();
        }
        Ok(())
    }

    pub fn select(&mut self, id: u32) -> Result<(), DataSetError> {
        if self.sets.contains_key(&id) {
            self.current = id;
            Ok(())
        } else {
            Err(DataSetError::UnknownId(id))
        }
    }

    pub fn current_id(&self) -> u32 {
        self.current
    }

    pub fn current(&self) -> &DataSet {
        &self.sets[&self.current]
    }

    pub fn current_mut(&mut self) -> &mut DataSet {
        self.sets.get_mut(&self.current).unwrap()
    }

    /// Append a completed trial to the current set.
    pub fn record(&mut self, trial: TrialRecord) {
        self.current_mut().trials.push(trial);
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &DataSet)> {
        self.sets.iter()
    }

    /// Re-run the effective-metrics analysis for every set, in id
    /// order.
    pub fn analyze_all(&self) -> Vec<(u32, Analysis)> {
        self.sets.iter().map(|(id, s)| (*id, s.analyze())).collect()
    }
}

impl Default for DataSets {
    fn default() -> Self {
        Self::new()
    }
}
