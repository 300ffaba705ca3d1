//! FILENAME: core/pivot-dataset/src/cache.rs
//! Value interning for the record indexes.
//!
//! Each grouping field stores every distinct value once and hands out a
//! compact `ValueId`. The grouping tree in `raw_index` is then keyed by ids
//! instead of owned strings, which keeps it small and makes prefix descents
//! a single hash probe per level.

use rustc_hash::FxHashMap;

use crate::value::DataValue;

/// A reference to an interned value within a field's unique value store.
/// Using u32 to save memory (supports up to 4B unique values per field).
pub type ValueId = u32;

/// Represents a missing value in the grouping tree.
pub const VALUE_ID_EMPTY: ValueId = u32::MAX;

/// Cache for a single field of the source records.
/// Stores unique values and provides O(1) lookup by ValueId.
#[derive(Debug, Clone)]
pub struct FieldCache {
    /// The field this cache interns.
    pub name: String,

    /// Map from value to its unique ID (for deduplication during build).
    value_to_id: FxHashMap<DataValue, ValueId>,

    /// Ordered list of unique values (indexed by ValueId), in first-appearance order.
    id_to_value: Vec<DataValue>,
}

impl FieldCache {
    pub fn new(name: impl Into<String>) -> Self {
        FieldCache {
            name: name.into(),
            value_to_id: FxHashMap::default(),
            id_to_value: Vec::new(),
        }
    }

    /// Interns a value and returns its ValueId.
    /// If the value already exists, returns the existing ID.
    pub fn intern(&mut self, value: Option<&DataValue>) -> ValueId {
        let Some(value) = value else {
            return VALUE_ID_EMPTY;
        };

        if let Some(&id) = self.value_to_id.get(value) {
            return id;
        }

        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value.clone(), id);
        id
    }

    /// Looks up the id of an already interned value.
    pub fn id_of(&self, value: &DataValue) -> Option<ValueId> {
        self.value_to_id.get(value).copied()
    }

    /// Gets the value for a given ID. The empty id has no value.
    pub fn get_value(&self, id: ValueId) -> Option<&DataValue> {
        if id == VALUE_ID_EMPTY {
            return None;
        }
        self.id_to_value.get(id as usize)
    }
}
