//! FILENAME: core/pivot-dataset/src/definition.rs
//! Data Configuration - The serializable input of a pivot data set.
//!
//! This module contains all the types needed to DESCRIBE a pivot data set:
//! the primary and totals records, which fields branch rows and columns,
//! which fields are measures, and how each dimension is ordered.
//! These structures are designed to be:
//! - Deserializable from the host's JSON configuration
//! - Lenient: missing containers default to empty, never fail
//! - Immutable snapshots handed to `PivotDataSet::set_data_config`

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DataSetError;
use crate::sort::{ListTail, SortFunc};
use crate::value::DataValue;
use crate::log_warn;

/// Virtual dimension identifying which measure a folded record represents.
pub const EXTRA_FIELD: &str = "$$extra$$";

/// `sortByMeasure` marker routing a measure sort to the totals data.
pub const TOTAL_VALUE: &str = "$$total$$";

// ============================================================================
// RECORDS AND QUERIES
// ============================================================================

/// A flat input record: field name to scalar value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record(BTreeMap<String, DataValue>);

impl Record {
    pub fn new() -> Self {
        Record(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<DataValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&DataValue> {
        self.0.get(field)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DataValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every key of `query` is present on this record with an equal value.
    pub fn matches(&self, query: &Query) -> bool {
        query.iter().all(|(k, v)| self.0.get(k) == Some(v))
    }

    /// Builds a record from loosely typed JSON, dropping values with no
    /// scalar reading.
    fn from_json_map(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let mut fields = BTreeMap::new();
        for (key, value) in raw {
            match DataValue::from_json(&value) {
                Some(v) => {
                    fields.insert(key, v);
                }
                None if value.is_null() => {}
                None => {
                    log_warn!("DATASET", "dropping non-scalar value for field '{}'", key);
                }
            }
        }
        Record(fields)
    }
}

impl<K: Into<String>, V: Into<DataValue>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Record(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(Record::from_json_map(raw))
    }
}

/// A partial assignment of dimension values. Omitted keys are wildcards.
///
/// Keys are kept sorted, so two queries built in different insertion orders
/// are equal, hash alike and render the same canonical key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(BTreeMap<String, DataValue>);

impl Query {
    pub fn new() -> Self {
        Query(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<DataValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&DataValue> {
        self.0.get(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DataValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union of both queries; keys of `other` win on conflict.
    pub fn merged(&self, other: &Query) -> Query {
        let mut out = self.0.clone();
        for (k, v) in other.iter() {
            out.insert(k.clone(), v.clone());
        }
        Query(out)
    }

    /// Stable textual key, e.g. `area=东北;province=辽宁`.
    pub fn canonical_key(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl<K: Into<String>, V: Into<DataValue>> FromIterator<(K, V)> for Query {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Query(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ============================================================================
// FIELD DEFINITIONS
// ============================================================================

/// Which fields build the row and column hierarchies, and which are measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldConfig {
    /// Row dimensions, outer to inner.
    pub rows: Vec<String>,

    /// Column dimensions, outer to inner.
    pub columns: Vec<String>,

    /// Measure fields.
    pub values: Vec<String>,

    /// Whether folded measures are laid out on the column axis.
    pub value_in_cols: bool,

    /// Explicit row tree overriding the default row hierarchy.
    pub custom_tree_items: Vec<CustomTreeItem>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            rows: Vec::new(),
            columns: Vec::new(),
            values: Vec::new(),
            value_in_cols: true,
            custom_tree_items: Vec::new(),
        }
    }
}

impl FieldConfig {
    /// True when records are folded by the measure selector.
    pub fn has_measures(&self) -> bool {
        !self.values.is_empty()
    }

    /// Row dimensions as laid out, including the measure selector when
    /// measures sit on rows.
    pub fn row_dimensions(&self) -> Vec<String> {
        let mut dims = self.rows.clone();
        if self.has_measures() && !self.value_in_cols {
            dims.push(EXTRA_FIELD.to_string());
        }
        dims
    }

    /// Column dimensions as laid out, including the measure selector when
    /// measures sit on columns.
    pub fn column_dimensions(&self) -> Vec<String> {
        let mut dims = self.columns.clone();
        if self.has_measures() && self.value_in_cols {
            dims.push(EXTRA_FIELD.to_string());
        }
        dims
    }

    /// The canonical dimension order: rows, columns, then the measure selector.
    pub fn canonical_dimensions(&self) -> Vec<String> {
        let mut dims: Vec<String> = self.rows.iter().chain(self.columns.iter()).cloned().collect();
        if self.has_measures() {
            dims.push(EXTRA_FIELD.to_string());
        }
        dims
    }

    /// The dimensions sharing an axis with `dimension` (itself excluded).
    /// The measure selector belongs to whichever axis carries the measures.
    pub fn axis_peers(&self, dimension: &str) -> Vec<String> {
        let rows = self.row_dimensions();
        let columns = self.column_dimensions();
        let axis = if rows.iter().any(|d| d == dimension) {
            rows
        } else if columns.iter().any(|d| d == dimension) {
            columns
        } else {
            return Vec::new();
        };
        axis.into_iter().filter(|d| d != dimension).collect()
    }

    /// The measure a point query addresses: its measure selector, or the
    /// sole configured measure.
    pub fn selected_measure(&self, query: &Query) -> Option<String> {
        match query.get(EXTRA_FIELD) {
            Some(selector) => Some(selector.to_string()),
            None if self.values.len() == 1 => Some(self.values[0].clone()),
            None => None,
        }
    }

    /// `query` narrowed to `measure`. Folded record sets carry the measure
    /// selector, so it is fixed whenever measures are configured.
    pub fn measure_point(&self, query: &Query, measure: &str) -> Query {
        if self.has_measures() {
            query.clone().with(EXTRA_FIELD, measure)
        } else {
            query.clone()
        }
    }

    /// True when `query` fixes every row and column dimension.
    pub fn is_leaf_query(&self, query: &Query) -> bool {
        self.rows
            .iter()
            .chain(self.columns.iter())
            .all(|d| query.contains_key(d))
    }

    pub fn is_dimension(&self, field: &str) -> bool {
        field == EXTRA_FIELD && self.has_measures()
            || self.rows.iter().any(|f| f == field)
            || self.columns.iter().any(|f| f == field)
    }
}

/// A node of a user-supplied row tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTreeItem {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub children: Vec<CustomTreeItem>,
}

/// Display metadata for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub field: String,
    #[serde(default)]
    pub name: Option<String>,
}

// ============================================================================
// SORT AND FILTER PARAMETERS
// ============================================================================

/// The serialized form of a sort spec. See `SortSpec::from_param` for how
/// the optional members combine into one policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortParam {
    /// The dimension this param orders.
    pub sort_field_id: String,

    /// "ASC" or "DESC" (case-insensitive).
    #[serde(default)]
    pub sort_method: Option<String>,

    /// Explicit value order.
    #[serde(default)]
    pub sort_by: Option<Vec<DataValue>>,

    /// Measure id, or `$$total$$` to read from the totals data.
    #[serde(default)]
    pub sort_by_measure: Option<String>,

    /// Scope restricting when this param applies; also the measure lookup context.
    #[serde(default)]
    pub query: Option<Query>,

    /// How values missing from `sort_by` are placed. Falls back to the
    /// data config's `explicit_list_tail`.
    #[serde(default)]
    pub list_tail: Option<ListTail>,

    /// Custom ordering function. Never serialized.
    #[serde(skip)]
    pub sort_func: Option<SortFunc>,
}

impl SortParam {
    pub fn new(sort_field_id: impl Into<String>) -> Self {
        SortParam {
            sort_field_id: sort_field_id.into(),
            ..Default::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.sort_method = Some(method.into());
        self
    }

    pub fn by_list<V: Into<DataValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.sort_by = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn by_measure(mut self, measure: impl Into<String>) -> Self {
        self.sort_by_measure = Some(measure.into());
        self
    }

    pub fn scoped(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    pub fn tail(mut self, tail: ListTail) -> Self {
        self.list_tail = Some(tail);
        self
    }

    pub fn func(mut self, func: SortFunc) -> Self {
        self.sort_func = Some(func);
        self
    }
}

/// Removes primary records whose value at `filter_key` is listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParam {
    pub filter_key: String,
    #[serde(default)]
    pub filtered_values: Vec<DataValue>,
}

impl FilterParam {
    pub fn excludes(&self, record: &Record) -> bool {
        record
            .get(&self.filter_key)
            .is_some_and(|v| self.filtered_values.contains(v))
    }
}

// ============================================================================
// MAIN CONFIG STRUCT
// ============================================================================

/// Everything a `PivotDataSet` is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataConfig {
    /// Primary (leaf-level) records.
    pub data: Vec<Record>,

    /// Pre-aggregated subtotal and grand total records.
    pub total_data: Vec<Record>,

    /// Field display metadata.
    pub meta: Vec<FieldMeta>,

    pub fields: FieldConfig,

    pub sort_params: Vec<SortParam>,

    pub filter_params: Vec<FilterParam>,

    /// Default tail policy for explicit-list sorts.
    pub explicit_list_tail: ListTail,
}

impl DataConfig {
    /// Parses a configuration from JSON text. `null` yields the default
    /// configuration.
    pub fn from_json(text: &str) -> Result<DataConfig, DataSetError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        match value {
            serde_json::Value::Null => Ok(DataConfig::default()),
            serde_json::Value::Object(_) => Ok(serde_json::from_value(value)?),
            other => Err(DataSetError::InvalidConfig(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Applies the defaults a rendered sheet relies on. A custom row tree
    /// always carries the measures on rows.
    pub fn normalized(mut self) -> DataConfig {
        if !self.fields.custom_tree_items.is_empty() {
            self.fields.value_in_cols = false;
        }
        self
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
