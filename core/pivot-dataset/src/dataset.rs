//! FILENAME: core/pivot-dataset/src/dataset.rs
//! PivotDataSet - the facade consumed by the layout builder.
//!
//! `set_data_config` is the only mutator. It normalizes the configuration,
//! filters and folds the records, builds both indexes, derives the sort specs
//! and starts an empty resolution cache. Everything built from the previous
//! configuration is dropped in the same step.

use crate::definition::{DataConfig, FieldConfig, FieldMeta, Query, Record, EXTRA_FIELD};
use crate::raw_index::RawIndex;
use crate::resolver::DimensionResolver;
use crate::sort::{DimensionSource, SortSpec};
use crate::totals_index::TotalsIndex;
use crate::value::DataValue;
use crate::{log_debug, log_info};

/// Which record set a cell lookup reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSource {
    /// Primary (leaf-level) records.
    Raw,
    /// Pre-aggregated subtotal and grand total records.
    Totals,
}

#[derive(Debug)]
pub struct PivotDataSet {
    meta: Vec<FieldMeta>,
    resolver: DimensionResolver,
}

impl Default for PivotDataSet {
    fn default() -> Self {
        PivotDataSet::new(DataConfig::default())
    }
}

impl PivotDataSet {
    pub fn new(config: DataConfig) -> Self {
        let (meta, resolver) = Self::build(config);
        PivotDataSet { meta, resolver }
    }

    /// Replaces the whole configuration. Indexes, sort specs and cached
    /// resolutions of the previous configuration are discarded.
    pub fn set_data_config(&mut self, config: DataConfig) {
        let (meta, resolver) = Self::build(config);
        self.meta = meta;
        self.resolver = resolver;
    }

    fn build(config: DataConfig) -> (Vec<FieldMeta>, DimensionResolver) {
        let DataConfig {
            data,
            total_data,
            meta,
            fields,
            sort_params,
            filter_params,
            explicit_list_tail,
        } = config.normalized();

        let input_len = data.len();
        let data: Vec<Record> = data
            .into_iter()
            .filter(|record| !filter_params.iter().any(|f| f.excludes(record)))
            .collect();
        if data.len() < input_len {
            log_debug!("DATASET", "filtered out {} record(s)", input_len - data.len());
        }

        let dimensions = fields.canonical_dimensions();
        let raw = RawIndex::build(fold_measures(data, &fields.values), &dimensions);
        let totals = TotalsIndex::build(fold_measures(total_data, &fields.values), &dimensions);

        log_info!(
            "INDEX",
            "raw index: {} record(s), {} node(s); totals index: {} record(s), {} signature(s)",
            raw.len(),
            raw.node_count(),
            totals.len(),
            totals.signature_count()
        );

        let specs: Vec<SortSpec> = sort_params
            .iter()
            .map(|param| SortSpec::from_param(param, explicit_list_tail))
            .collect();

        log_info!(
            "DATASET",
            "config set: rows={:?} columns={:?} values={:?} valueInCols={} sort specs={}",
            fields.rows,
            fields.columns,
            fields.values,
            fields.value_in_cols,
            specs.len()
        );

        (meta, DimensionResolver::new(raw, totals, fields, specs))
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Ordered, duplicate-free values of `dimension` among records matching
    /// `query`. An empty query resolves over all records.
    pub fn get_dimension_values(&self, dimension: &str, query: &Query) -> Vec<DataValue> {
        self.resolver.resolve(dimension, query)
    }

    /// Values of `dimension` present on the most specific matching totals
    /// records, in first-appearance order. Not sorted.
    pub fn get_total_dimension_values(&self, dimension: &str, query: &Query) -> Vec<DataValue> {
        self.resolver.totals().distinct_values(dimension, query)
    }

    /// Every value of `dimension` resolved since the configuration was set.
    pub fn sorted_dimension_values(&self, dimension: &str) -> Vec<DataValue> {
        self.resolver.sorted_values(dimension)
    }

    // ------------------------------------------------------------------------
    // Cell lookup
    // ------------------------------------------------------------------------

    /// The measure value addressed by `query`. Queries fixing every row and
    /// column dimension read the primary records, coarser ones the totals.
    /// With a single measure the selector may be omitted.
    pub fn get_cell_value(&self, query: &Query) -> Option<DataValue> {
        let fields = self.resolver.fields();
        let source = if fields.is_leaf_query(query) {
            CellSource::Raw
        } else {
            CellSource::Totals
        };
        let measure = fields.selected_measure(query)?;
        let point = fields.measure_point(query, &measure);
        self.get_cell_data(&point, source)?.get(&measure).cloned()
    }

    /// The record matching `query` in the chosen record set.
    pub fn get_cell_data(&self, query: &Query, source: CellSource) -> Option<&Record> {
        match source {
            CellSource::Raw => self.resolver.raw().lookup(query),
            CellSource::Totals => self.resolver.totals().lookup(query),
        }
    }

    /// Every primary record matching `query`, in record order.
    pub fn get_multi_data(&self, query: &Query) -> Vec<&Record> {
        self.resolver.raw().lookup_all(query)
    }

    // ------------------------------------------------------------------------
    // Field information
    // ------------------------------------------------------------------------

    pub fn fields(&self) -> &FieldConfig {
        self.resolver.fields()
    }

    pub fn measure_fields(&self) -> &[String] {
        &self.resolver.fields().values
    }

    pub fn is_value_in_cols(&self) -> bool {
        self.resolver.fields().value_in_cols
    }

    /// Display name of `field`, falling back to the field id.
    pub fn field_name(&self, field: &str) -> String {
        self.meta
            .iter()
            .find(|m| m.field == field)
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| field.to_string())
    }

    pub fn sort_specs(&self) -> &[SortSpec] {
        self.resolver.specs()
    }

    /// Number of memoized resolutions (diagnostics).
    pub fn cache_len(&self) -> usize {
        self.resolver.cache().len()
    }
}

impl DimensionSource for PivotDataSet {
    fn dimension_values(&self, dimension: &str, query: &Query) -> Vec<DataValue> {
        self.get_dimension_values(dimension, query)
    }
}

/// Expands each record into one record per configured measure it carries,
/// tagged with the measure selector. Records carrying no measure are kept
/// as they are so their dimension values still resolve.
fn fold_measures(records: Vec<Record>, measures: &[String]) -> Vec<Record> {
    if measures.is_empty() {
        return records;
    }

    let mut folded = Vec::with_capacity(records.len() * measures.len());
    for record in records {
        let carried: Vec<&String> = measures.iter().filter(|m| record.contains_field(m)).collect();
        match carried.as_slice() {
            [] => folded.push(record),
            [only] => {
                let tag = (*only).clone();
                folded.push(record.with(EXTRA_FIELD, tag));
            }
            many => {
                for measure in many {
                    folded.push(record.clone().with(EXTRA_FIELD, measure.as_str()));
                }
            }
        }
    }
    folded
}
