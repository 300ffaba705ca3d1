//! FILENAME: core/pivot-dataset/src/sort.rs
//! Sort Strategy Engine - orders the candidate values of one dimension.
//!
//! Candidates arrive de-duplicated and in natural (first-appearance) order.
//! Every policy is a variant of the closed `SortPolicy` enum and `apply` is the
//! single dispatch point. Policies never add values that are not candidates,
//! except `Custom`, whose output is used verbatim.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::definition::{Query, SortParam, TOTAL_VALUE};
use crate::value::{compare_values, DataValue};
use crate::{log_debug, log_warn};

// ============================================================================
// POLICY TYPES
// ============================================================================

/// Sort direction for directional and measure sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Parses "ASC" / "DESC" (case-insensitive).
    pub fn parse(method: &str) -> Option<SortDirection> {
        match method.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(SortDirection::Ascending),
            "DESC" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    fn orient(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Where an explicit list puts data values it does not name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListTail {
    /// Listed values first (list order), then the rest in natural order.
    #[default]
    AppendNatural,
    /// Natural order for the whole sequence unless the list covers every value.
    FallbackNatural,
}

/// The measure a `ByMeasure` policy reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MeasureRef {
    /// A measure field of the primary data.
    Field(String),
    /// The totals data, measure picked by the lookup's measure selector.
    Totals,
}

impl MeasureRef {
    pub fn parse(measure: &str) -> MeasureRef {
        if measure == TOTAL_VALUE {
            MeasureRef::Totals
        } else {
            MeasureRef::Field(measure.to_string())
        }
    }
}

/// Re-entrant access to resolved dimensions, handed to custom sort functions.
pub trait DimensionSource {
    fn dimension_values(&self, dimension: &str, query: &Query) -> Vec<DataValue>;
}

/// Reads one numeric measure value for a point query.
pub trait MeasureLookup {
    fn measure_value(&self, measure: &MeasureRef, query: &Query) -> Option<f64>;
}

/// Everything a custom sort function gets to see.
pub struct SortFuncParams<'a> {
    /// Natural-order candidates.
    pub candidates: &'a [DataValue],
    pub target_dimension: &'a str,
    pub measure: Option<&'a MeasureRef>,
    pub scope: &'a Query,
    pub query: &'a Query,
    /// Measure value per candidate when `measure` is set, otherwise empty.
    pub measure_values: Vec<Option<f64>>,
    pub source: &'a dyn DimensionSource,
}

type SortFn = dyn Fn(&SortFuncParams<'_>) -> Vec<DataValue> + Send + Sync;

/// A caller-supplied ordering function. Its result is trusted as-is.
#[derive(Clone)]
pub struct SortFunc(Arc<SortFn>);

impl SortFunc {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SortFuncParams<'_>) -> Vec<DataValue> + Send + Sync + 'static,
    {
        SortFunc(Arc::new(f))
    }

    pub fn call(&self, params: &SortFuncParams<'_>) -> Vec<DataValue> {
        (self.0)(params)
    }
}

impl fmt::Debug for SortFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SortFunc(..)")
    }
}

/// One ordering policy.
#[derive(Debug, Clone)]
pub enum SortPolicy {
    Natural,
    Directional(SortDirection),
    ExplicitList {
        values: Vec<DataValue>,
        tail: ListTail,
    },
    ByMeasure {
        measure: MeasureRef,
        direction: SortDirection,
    },
    Custom {
        func: SortFunc,
        measure: Option<MeasureRef>,
    },
}

impl SortPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            SortPolicy::Natural => "natural",
            SortPolicy::Directional(_) => "directional",
            SortPolicy::ExplicitList { .. } => "explicit-list",
            SortPolicy::ByMeasure { .. } => "by-measure",
            SortPolicy::Custom { .. } => "custom",
        }
    }
}

/// A policy bound to a dimension, optionally restricted to a scope.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub target_dimension: String,
    pub policy: SortPolicy,
    /// Empty scope = applies everywhere.
    pub scope: Query,
}

impl SortSpec {
    pub fn new(target_dimension: impl Into<String>, policy: SortPolicy) -> Self {
        SortSpec {
            target_dimension: target_dimension.into(),
            policy,
            scope: Query::new(),
        }
    }

    pub fn scoped(mut self, scope: Query) -> Self {
        self.scope = scope;
        self
    }

    /// Derives the policy from a serialized param. First match wins:
    /// function, explicit list, measure, method, natural.
    pub fn from_param(param: &SortParam, default_tail: ListTail) -> SortSpec {
        let direction = param.sort_method.as_deref().and_then(|method| {
            let parsed = SortDirection::parse(method);
            if parsed.is_none() {
                log_warn!(
                    "SORT",
                    "unknown sort method '{}' for '{}', ignoring",
                    method,
                    param.sort_field_id
                );
            }
            parsed
        });
        let measure = param.sort_by_measure.as_deref().map(MeasureRef::parse);

        let policy = if let Some(func) = &param.sort_func {
            SortPolicy::Custom {
                func: func.clone(),
                measure,
            }
        } else if let Some(values) = &param.sort_by {
            SortPolicy::ExplicitList {
                values: values.clone(),
                tail: param.list_tail.unwrap_or(default_tail),
            }
        } else if let Some(measure) = measure {
            SortPolicy::ByMeasure {
                measure,
                direction: direction.unwrap_or_default(),
            }
        } else if let Some(direction) = direction {
            SortPolicy::Directional(direction)
        } else {
            SortPolicy::Natural
        };

        SortSpec {
            target_dimension: param.sort_field_id.clone(),
            policy,
            scope: param.query.clone().unwrap_or_default(),
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Inputs shared by every policy.
pub struct SortContext<'a> {
    pub target_dimension: &'a str,
    /// Scope of the selected spec.
    pub scope: &'a Query,
    /// The resolve query.
    pub query: &'a Query,
    pub measures: &'a dyn MeasureLookup,
    pub source: &'a dyn DimensionSource,
}

/// Orders `candidates` (natural order, distinct) under `policy`.
pub fn apply(policy: &SortPolicy, candidates: Vec<DataValue>, ctx: &SortContext<'_>) -> Vec<DataValue> {
    log_debug!(
        "SORT",
        "{} sort of {} value(s) for '{}'",
        policy.name(),
        candidates.len(),
        ctx.target_dimension
    );

    match policy {
        SortPolicy::Natural => candidates,
        SortPolicy::Directional(direction) => sort_directional(candidates, *direction),
        SortPolicy::ExplicitList { values, tail } => sort_by_list(candidates, values, *tail),
        SortPolicy::ByMeasure { measure, direction } => {
            let values = measure_values(measure, &candidates, ctx);
            sort_by_measure(candidates, &values, *direction)
        }
        SortPolicy::Custom { func, measure } => {
            let params = SortFuncParams {
                candidates: &candidates,
                target_dimension: ctx.target_dimension,
                measure: measure.as_ref(),
                scope: ctx.scope,
                query: ctx.query,
                measure_values: measure
                    .as_ref()
                    .map(|m| measure_values(m, &candidates, ctx))
                    .unwrap_or_default(),
                source: ctx.source,
            };
            let result = func.call(&params);
            if !is_permutation_of(&result, &candidates) {
                log_warn!(
                    "SORT",
                    "custom sort for '{}' returned {} value(s) for {} candidate(s); using it as-is",
                    ctx.target_dimension,
                    result.len(),
                    candidates.len()
                );
            }
            result
        }
    }
}

/// True when `result` holds exactly the (distinct) `candidates`, in any order.
fn is_permutation_of(result: &[DataValue], candidates: &[DataValue]) -> bool {
    if result.len() != candidates.len() {
        return false;
    }
    let known: FxHashSet<&DataValue> = candidates.iter().collect();
    let mut seen: FxHashSet<&DataValue> = FxHashSet::default();
    result.iter().all(|v| known.contains(v) && seen.insert(v))
}

/// Numeric comparison when every candidate reads as a number, otherwise
/// locale-aware text comparison. Stable, so ties keep natural order.
pub fn sort_directional(mut candidates: Vec<DataValue>, direction: SortDirection) -> Vec<DataValue> {
    let all_numeric = candidates.iter().all(|v| v.as_f64().is_some());
    if all_numeric {
        candidates.sort_by(|a, b| {
            let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            direction.orient(x.partial_cmp(&y).unwrap_or(Ordering::Equal))
        });
    } else {
        candidates.sort_by(|a, b| direction.orient(compare_values(a, b)));
    }
    candidates
}

/// Listed values present in data, in list order; see `ListTail` for the rest.
pub fn sort_by_list(candidates: Vec<DataValue>, list: &[DataValue], tail: ListTail) -> Vec<DataValue> {
    let present: FxHashSet<&DataValue> = candidates.iter().collect();
    let mut placed: FxHashSet<&DataValue> = FxHashSet::default();
    let mut ordered: Vec<DataValue> = Vec::with_capacity(candidates.len());
    for value in list {
        if present.contains(value) && placed.insert(value) {
            ordered.push(value.clone());
        }
    }

    if ordered.len() == candidates.len() {
        return ordered;
    }

    match tail {
        ListTail::AppendNatural => {
            ordered.extend(candidates.iter().filter(|v| !placed.contains(v)).cloned());
            ordered
        }
        ListTail::FallbackNatural => candidates,
    }
}

/// Valued candidates ordered by value; candidates without a value follow in
/// natural order.
pub fn sort_by_measure(
    candidates: Vec<DataValue>,
    values: &[Option<f64>],
    direction: SortDirection,
) -> Vec<DataValue> {
    let mut valued: Vec<(f64, DataValue)> = Vec::with_capacity(candidates.len());
    let mut missing: Vec<DataValue> = Vec::new();
    for (candidate, value) in candidates.into_iter().zip(values.iter()) {
        match value {
            Some(v) => valued.push((*v, candidate)),
            None => missing.push(candidate),
        }
    }

    valued.sort_by(|(a, _), (b, _)| direction.orient(a.partial_cmp(b).unwrap_or(Ordering::Equal)));
    valued
        .into_iter()
        .map(|(_, candidate)| candidate)
        .chain(missing)
        .collect()
}

/// Looks up the measure at `query ∪ scope ∪ {target: candidate}` for each candidate.
fn measure_values(measure: &MeasureRef, candidates: &[DataValue], ctx: &SortContext<'_>) -> Vec<Option<f64>> {
    let base = ctx.query.merged(ctx.scope);
    candidates
        .iter()
        .map(|candidate| {
            let point = base.clone().with(ctx.target_dimension, candidate.clone());
            ctx.measures.measure_value(measure, &point)
        })
        .collect()
}
