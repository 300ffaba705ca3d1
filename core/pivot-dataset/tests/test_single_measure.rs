//! FILENAME: tests/test_single_measure.rs
//! Integration tests for data sets with one measure, where queries may omit
//! the measure selector.

mod common;

use common::{query, texts, SingleMeasureFixture, VALUE_LAYOUTS};
use pivot_dataset::{DataValue, Query, SortParam, EXTRA_FIELD, TOTAL_VALUE};

// ============================================================================
// CELL LOOKUP
// ============================================================================

#[test]
fn test_totals_cells_without_selector() {
    for value_in_cols in VALUE_LAYOUTS {
        let ds = SingleMeasureFixture::dataset_in(value_in_cols, Vec::new());
        assert_eq!(
            ds.get_cell_value(&query(&[("area", "东北")])),
            Some(DataValue::number(100.0)),
            "value_in_cols {}",
            value_in_cols
        );
        assert_eq!(
            ds.get_cell_value(&query(&[("area", "东北"), ("province", "辽宁")])),
            Some(DataValue::number(70.0))
        );
        assert_eq!(
            ds.get_cell_value(&query(&[("type", "办公用品")])),
            Some(DataValue::number(360.0))
        );
        assert_eq!(ds.get_cell_value(&Query::new()), Some(DataValue::number(400.0)));
    }
}

#[test]
fn test_leaf_cells_without_selector() {
    let ds = SingleMeasureFixture::dataset_in(true, Vec::new());
    let leaf = query(&[("area", "东北"), ("province", "辽宁"), ("type", "办公用品")]);
    assert_eq!(ds.get_cell_value(&leaf), Some(DataValue::number(30.0)));

    // Naming the sole measure addresses the same cell.
    assert_eq!(
        ds.get_cell_value(&leaf.with(EXTRA_FIELD, "cost")),
        Some(DataValue::number(30.0))
    );
}

#[test]
fn test_selector_is_the_sole_measure() {
    let ds = SingleMeasureFixture::dataset_in(true, Vec::new());
    assert_eq!(ds.get_dimension_values(EXTRA_FIELD, &Query::new()), texts(&["cost"]));
}

// ============================================================================
// SORTING
// ============================================================================

#[test]
fn test_totals_sentinel_sort_without_selector() {
    for value_in_cols in VALUE_LAYOUTS {
        let asc = SingleMeasureFixture::dataset_in(
            value_in_cols,
            vec![
                SortParam::new("area").by_measure(TOTAL_VALUE).method("ASC"),
                SortParam::new("province").by_measure(TOTAL_VALUE).method("ASC"),
            ],
        );
        assert_eq!(
            asc.get_dimension_values("area", &Query::new()),
            texts(&["东北", "中南"]),
            "value_in_cols {}",
            value_in_cols
        );
        assert_eq!(
            asc.get_dimension_values("province", &query(&[("area", "东北")])),
            texts(&["吉林", "辽宁"])
        );

        let desc = SingleMeasureFixture::dataset_in(
            value_in_cols,
            vec![SortParam::new("area").by_measure(TOTAL_VALUE).method("DESC")],
        );
        assert_eq!(desc.get_dimension_values("area", &Query::new()), texts(&["中南", "东北"]));
    }
}

#[test]
fn test_field_sort_without_selector() {
    for value_in_cols in VALUE_LAYOUTS {
        let ds = SingleMeasureFixture::dataset_in(
            value_in_cols,
            vec![SortParam::new("province").by_measure("cost").method("ASC")],
        );
        // Natural order under 办公用品 is 吉林, 辽宁.
        assert_eq!(
            ds.get_dimension_values("province", &query(&[("area", "东北"), ("type", "办公用品")])),
            texts(&["辽宁", "吉林"])
        );
    }
}
