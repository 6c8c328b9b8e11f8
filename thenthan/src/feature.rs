use std::cmp::Ordering;
use std::collections::BTreeSet;

use bincode::{Decode, Encode};

use crate::context::{column_name, ContextWindow, MAX_WINDOW_SIZE};
use crate::errors::{Result, ThenThanError};

/// Name of the label column in the training table.
pub const LABEL_COLUMN: &str = "th{e|a}n";

/// One indicator column of the one-hot encoding.
#[derive(Debug, Clone, PartialEq, Eq, Decode, Encode)]
pub struct FeatureColumn {
    pub(crate) offset: i8,
    pub(crate) tag: String,
}

impl FeatureColumn {
    /// Offset of the slot relative to the target word.
    pub const fn offset(&self) -> i8 {
        self.offset
    }

    /// Gets the tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Gets the column name, e.g. `Slot-1_CC`.
    pub fn name(&self) -> String {
        column_name(self.offset, &self.tag)
    }

    fn cmp_key(&self, offset: i8, tag: &str) -> Ordering {
        (self.offset, self.tag.as_str()).cmp(&(offset, tag))
    }
}

/// Sparse binary feature vector: the sorted indices of active one-hot columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureVector {
    pub(crate) active: Vec<u32>,
    pub(crate) n_features: usize,
}

impl FeatureVector {
    /// Creates a vector from active column indices.
    ///
    /// # Errors
    ///
    /// If an index is not less than `n_features`, an error variant will be returned.
    pub fn new(mut active: Vec<u32>, n_features: usize) -> Result<Self> {
        active.sort_unstable();
        active.dedup();
        if let Some(&last) = active.last() {
            if last as usize >= n_features {
                return Err(ThenThanError::configuration(
                    "active",
                    format!("index {} exceeds {} features", last, n_features),
                ));
            }
        }
        Ok(Self { active, n_features })
    }

    /// Gets the indices of the active columns.
    pub fn active(&self) -> &[u32] {
        &self.active
    }

    /// Gets the number of columns.
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Returns `true` if the column at `index` is set.
    #[inline]
    pub fn get(&self, index: u32) -> bool {
        self.active.binary_search(&index).is_ok()
    }

    /// Expands the vector into dense 0/1 values.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut result = vec![0.; self.n_features];
        for &i in &self.active {
            result[i as usize] = 1.;
        }
        result
    }
}

/// Frozen, ordered set of one-hot columns established at training time.
///
/// Columns are sorted by slot offset, then by tag.
#[derive(Debug, Clone, PartialEq, Eq, Decode, Encode)]
pub struct FeatureSchema {
    pub(crate) window_size: u8,
    pub(crate) columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    /// Builds a schema from every `(offset, tag)` pair observed in the given windows.
    ///
    /// # Errors
    ///
    /// An error variant will be returned when:
    ///
    /// * a window was extracted with a different half-width;
    /// * no column could be derived (the feature set is degenerate);
    /// * a column name collides with [`LABEL_COLUMN`].
    pub fn build<'a, I>(window_size: u8, windows: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a ContextWindow>,
    {
        let mut observed = BTreeSet::new();
        for window in windows {
            if window.window_size != window_size {
                return Err(ThenThanError::configuration(
                    "window_size",
                    format!(
                        "a context of width {} cannot join a schema of width {}",
                        window.window_size, window_size
                    ),
                ));
            }
            for slot in &window.slots {
                observed.insert((slot.offset, slot.tag.as_str()));
            }
        }
        if observed.is_empty() {
            return Err(ThenThanError::configuration(
                "corpus",
                "no context tags were observed",
            ));
        }
        let columns: Vec<FeatureColumn> = observed
            .into_iter()
            .map(|(offset, tag)| FeatureColumn {
                offset,
                tag: tag.to_string(),
            })
            .collect();
        if columns.iter().any(|c| c.name() == LABEL_COLUMN) {
            return Err(ThenThanError::configuration(
                "corpus",
                format!("a feature column collides with `{}`", LABEL_COLUMN),
            ));
        }
        Ok(Self {
            window_size,
            columns,
        })
    }

    /// Checks the invariants [`FeatureSchema::build()`] establishes.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.window_size == 0 || self.window_size > MAX_WINDOW_SIZE {
            return Err(ThenThanError::invalid_model(format!(
                "invalid window size {}",
                self.window_size
            )));
        }
        let max_offset = i16::from(self.window_size);
        for col in &self.columns {
            let offset = i16::from(col.offset);
            if offset == 0 || offset.abs() > max_offset || col.tag.is_empty() {
                return Err(ThenThanError::invalid_model(format!(
                    "invalid column {:?}",
                    col.name()
                )));
            }
        }
        // Lookups binary-search the columns.
        for pair in self.columns.windows(2) {
            if pair[0].cmp_key(pair[1].offset, &pair[1].tag) != Ordering::Less {
                return Err(ThenThanError::invalid_model(format!(
                    "columns {:?} and {:?} are not in strictly increasing order",
                    pair[0].name(),
                    pair[1].name()
                )));
            }
        }
        Ok(())
    }

    /// Gets the half-width of the windows this schema accepts.
    pub const fn window_size(&self) -> u8 {
        self.window_size
    }

    /// Gets the columns.
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Gets the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the index of the column for `tag` at `offset`.
    pub fn column_index(&self, offset: i8, tag: &str) -> Option<u32> {
        self.columns
            .binary_search_by(|c| c.cmp_key(offset, tag))
            .ok()
            .map(|i| i as u32)
    }

    /// Encodes a context window.
    ///
    /// # Arguments
    ///
    /// * `window` - A context window.
    ///
    /// # Returns
    ///
    /// A feature vector with one active column per slot present in `window`.
    ///
    /// # Errors
    ///
    /// * [`ThenThanError::Configuration`] if `window` was extracted with another half-width.
    /// * [`ThenThanError::UnknownTag`] if a slot holds a tag never seen at that offset
    ///   during training.
    pub fn encode(&self, window: &ContextWindow) -> Result<FeatureVector> {
        if window.window_size != self.window_size {
            return Err(ThenThanError::configuration(
                "window_size",
                format!(
                    "the model was trained with {} but the context has {}",
                    self.window_size, window.window_size
                ),
            ));
        }
        let mut active = Vec::with_capacity(window.slots.len());
        for slot in &window.slots {
            let idx = self
                .column_index(slot.offset, &slot.tag)
                .ok_or_else(|| ThenThanError::unknown_tag(slot.offset, slot.tag.as_str()))?;
            active.push(idx);
        }
        active.sort_unstable();
        Ok(FeatureVector {
            active,
            n_features: self.columns.len(),
        })
    }
}
