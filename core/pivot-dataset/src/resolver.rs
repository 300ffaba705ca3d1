//! FILENAME: core/pivot-dataset/src/resolver.rs
//! DimensionResolver - cache-backed resolution of ordered dimension values.
//!
//! `resolve(dimension, query)`:
//! 1. Return the memoized sequence for `(dimension, query)` if present.
//! 2. Collect the natural-order candidates from the RawIndex.
//! 3. Pick the most specific SortSpec whose scope is consistent with the query.
//! 4. Apply its policy and memoize the result.
//!
//! The resolver owns both indexes so that the whole resolution state is built
//! and dropped as one unit.

use std::cell::RefCell;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::definition::{FieldConfig, Query, EXTRA_FIELD};
use crate::raw_index::RawIndex;
use crate::sort::{self, DimensionSource, MeasureLookup, MeasureRef, SortContext, SortSpec};
use crate::totals_index::TotalsIndex;
use crate::value::DataValue;
use crate::log_debug;

// ============================================================================
// RESOLUTION CACHE
// ============================================================================

/// Cache key. `Query` keeps its keys sorted, so equal queries built in any
/// order hash and compare alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    dimension: String,
    query: Query,
}

/// Memoized `(dimension, query)` resolutions.
///
/// Interior mutability lets resolution run through `&self`, which custom sort
/// functions need in order to call back into the data set. No borrow is held
/// while a sort runs.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RefCell<FxHashMap<CacheKey, Vec<DataValue>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        ResolutionCache::default()
    }

    pub fn get(&self, dimension: &str, query: &Query) -> Option<Vec<DataValue>> {
        let key = CacheKey {
            dimension: dimension.to_string(),
            query: query.clone(),
        };
        self.entries.borrow().get(&key).cloned()
    }

    pub fn insert(&self, dimension: &str, query: &Query, values: Vec<DataValue>) {
        let key = CacheKey {
            dimension: dimension.to_string(),
            query: query.clone(),
        };
        self.entries.borrow_mut().insert(key, values);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Every value resolved so far per dimension, in the order first produced.
#[derive(Debug, Default)]
struct SortedValues {
    order: Vec<DataValue>,
    seen: FxHashSet<DataValue>,
}

impl SortedValues {
    fn extend(&mut self, values: &[DataValue]) {
        for value in values {
            if self.seen.insert(value.clone()) {
                self.order.push(value.clone());
            }
        }
    }
}

// ============================================================================
// MEASURE LOOKUP
// ============================================================================

/// Reads measure values from the indexes for `ByMeasure` sorts.
pub struct IndexMeasureLookup<'a> {
    pub raw: &'a RawIndex,
    pub totals: &'a TotalsIndex,
    pub fields: &'a FieldConfig,
}

impl MeasureLookup for IndexMeasureLookup<'_> {
    fn measure_value(&self, measure: &MeasureRef, query: &Query) -> Option<f64> {
        match measure {
            MeasureRef::Field(field) => {
                let point = self.fields.measure_point(query, field);
                self.raw.lookup(&point)?.get(field)?.as_f64()
            }
            MeasureRef::Totals => {
                let field = self.fields.selected_measure(query)?;
                let point = self.fields.measure_point(query, &field);
                self.totals.lookup(&point)?.get(&field)?.as_f64()
            }
        }
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Debug)]
pub struct DimensionResolver {
    raw: RawIndex,
    totals: TotalsIndex,
    fields: FieldConfig,
    specs: Vec<SortSpec>,
    cache: ResolutionCache,
    sorted: RefCell<FxHashMap<String, SortedValues>>,
}

impl DimensionResolver {
    pub fn new(raw: RawIndex, totals: TotalsIndex, fields: FieldConfig, specs: Vec<SortSpec>) -> Self {
        DimensionResolver {
            raw,
            totals,
            fields,
            specs,
            cache: ResolutionCache::new(),
            sorted: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn raw(&self) -> &RawIndex {
        &self.raw
    }

    pub fn totals(&self) -> &TotalsIndex {
        &self.totals
    }

    pub fn fields(&self) -> &FieldConfig {
        &self.fields
    }

    pub fn specs(&self) -> &[SortSpec] {
        &self.specs
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Ordered, duplicate-free values of `dimension` among records matching `query`.
    pub fn resolve(&self, dimension: &str, query: &Query) -> Vec<DataValue> {
        if let Some(hit) = self.cache.get(dimension, query) {
            log_debug!("RESOLVE", "cache hit for '{}' at [{}]", dimension, query.canonical_key());
            return hit;
        }

        let candidates = self.raw.distinct_values(dimension, query);
        let result = match self.select_spec(dimension, query) {
            Some(spec) => {
                let lookup = IndexMeasureLookup {
                    raw: &self.raw,
                    totals: &self.totals,
                    fields: &self.fields,
                };
                let ctx = SortContext {
                    target_dimension: dimension,
                    scope: &spec.scope,
                    query,
                    measures: &lookup,
                    source: self,
                };
                sort::apply(&spec.policy, candidates, &ctx)
            }
            None => candidates,
        };

        log_debug!(
            "RESOLVE",
            "resolved {} value(s) for '{}' at [{}]",
            result.len(),
            dimension,
            query.canonical_key()
        );

        self.sorted
            .borrow_mut()
            .entry(dimension.to_string())
            .or_default()
            .extend(&result);
        self.cache.insert(dimension, query, result.clone());
        result
    }

    /// The sort spec governing `dimension` under `query`.
    ///
    /// A scope applies when each of its keys either agrees with the query, or
    /// is absent from the query and lies on another axis than `dimension`
    /// (ancestors on the other axis only narrow measure lookups). The measure
    /// selector is lookup context on either axis. Among
    /// applicable specs the one agreeing on the most keys wins; ties go to
    /// the first declared. An empty scope always applies.
    pub fn select_spec(&self, dimension: &str, query: &Query) -> Option<&SortSpec> {
        let known = self.fields.is_dimension(dimension);
        let peers = self.fields.axis_peers(dimension);

        let mut best: Option<(usize, &SortSpec)> = None;
        'specs: for spec in self.specs.iter().filter(|s| s.target_dimension == dimension) {
            let mut overlap = 0;
            for (key, value) in spec.scope.iter() {
                match query.get(key) {
                    Some(fixed) if fixed == value => overlap += 1,
                    Some(_) => continue 'specs,
                    None if key == dimension || key == EXTRA_FIELD => {}
                    None if !known || peers.contains(key) => continue 'specs,
                    None => {}
                }
            }
            if best.map_or(true, |(top, _)| overlap > top) {
                best = Some((overlap, spec));
            }
        }

        if let Some((_, spec)) = best {
            log_debug!(
                "RESOLVE",
                "'{}' at [{}] uses {} sort scoped to [{}]",
                dimension,
                query.canonical_key(),
                spec.policy.name(),
                spec.scope.canonical_key()
            );
        }
        best.map(|(_, spec)| spec)
    }

    /// Every value of `dimension` resolved so far, in the order first produced.
    pub fn sorted_values(&self, dimension: &str) -> Vec<DataValue> {
        self.sorted
            .borrow()
            .get(dimension)
            .map(|s| s.order.clone())
            .unwrap_or_default()
    }
}

impl DimensionSource for DimensionResolver {
    fn dimension_values(&self, dimension: &str, query: &Query) -> Vec<DataValue> {
        self.resolve(dimension, query)
    }
}
