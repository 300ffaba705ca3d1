//! FILENAME: core/pivot-dataset/src/lib.rs
//! Dimensional data set backing a cross-tab (pivot) layout.
//!
//! Flat records go in; ordered per-dimension value sequences and point cell
//! lookups come out. Totals are supplied pre-computed, nothing is aggregated
//! here.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the data set IS)
//! - `value`, `cache`: Scalar values and per-field interning
//! - `raw_index`, `totals_index`: Lookup structures over the two record sets
//! - `sort`: Sort policies and the pure `apply` dispatch
//! - `resolver`: Cache-backed dimension resolution (HOW values are ordered)
//! - `dataset`: The `PivotDataSet` facade
//! - `hierarchy`: Header trees built from resolved values (WHAT is laid out)

pub mod logging;
pub mod error;
pub mod value;
pub mod definition;
pub mod cache;
pub mod raw_index;
pub mod totals_index;
pub mod sort;
pub mod resolver;
pub mod dataset;
pub mod hierarchy;

pub use error::DataSetError;
pub use value::{compare_text, compare_values, DataValue, OrderedFloat};
pub use definition::*;
pub use raw_index::RawIndex;
pub use totals_index::TotalsIndex;
pub use sort::{
    DimensionSource, ListTail, MeasureLookup, MeasureRef, SortDirection, SortFunc,
    SortFuncParams, SortPolicy, SortSpec,
};
pub use resolver::{DimensionResolver, ResolutionCache};
pub use dataset::{CellSource, PivotDataSet};
pub use hierarchy::{build_hierarchy, HeaderNode, PivotHierarchy};
