//! FILENAME: tests/common/mod.rs
//! Fixtures for pivot-dataset integration tests.

#![allow(dead_code)]

use pivot_dataset::{
    DataConfig, DataValue, FieldConfig, FieldMeta, PivotDataSet, Query, Record, SortParam,
    EXTRA_FIELD,
};

// ============================================================================
// REGIONAL SALES FIXTURE
// ============================================================================

/// Regional office-supply sales. Rows: area / province / city.
/// Columns: type / sub_type. Measures: cost, price.
pub struct RegionFixture;

impl RegionFixture {
    pub fn fields() -> FieldConfig {
        FieldConfig {
            rows: vec!["area".into(), "province".into(), "city".into()],
            columns: vec!["type".into(), "sub_type".into()],
            values: vec!["cost".into(), "price".into()],
            ..FieldConfig::default()
        }
    }

    pub fn cities() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("中南", "广东", "广州"),
            ("中南", "广东", "汕头"),
            ("东北", "辽宁", "朝阳"),
            ("东北", "辽宁", "抚顺"),
            ("东北", "吉林", "白山"),
            ("东北", "吉林", "丹东"),
        ]
    }

    pub fn products() -> Vec<(&'static str, &'static str)> {
        vec![
            ("家具产品", "办公装饰品"),
            ("家具产品", "餐桌"),
            ("办公用品", "笔"),
            ("办公用品", "纸张"),
        ]
    }

    /// (cost, price) per city, in `products()` order. `None` marks a missing sale.
    pub fn amounts() -> Vec<[Option<(f64, f64)>; 4]> {
        vec![
            [Some((10.0, 20.0)), Some((30.0, 50.0)), Some((5.0, 8.0)), Some((12.0, 15.0))],
            [Some((14.0, 22.0)), Some((25.0, 40.0)), None, Some((9.0, 11.0))],
            [Some((8.0, 18.0)), Some((40.0, 60.0)), Some((7.0, 9.0)), Some((20.0, 25.0))],
            [Some((6.0, 16.0)), Some((35.0, 70.0)), Some((3.0, 4.0)), Some((18.0, 30.0))],
            [Some((11.0, 21.0)), Some((28.0, 45.0)), Some((2.0, 6.0)), Some((16.0, 19.0))],
            [Some((13.0, 19.0)), Some((22.0, 35.0)), Some((4.0, 5.0)), Some((10.0, 14.0))],
        ]
    }

    pub fn records() -> Vec<Record> {
        let products = Self::products();
        let mut records = Vec::new();
        for ((area, province, city), amounts) in Self::cities().into_iter().zip(Self::amounts()) {
            for (&(ty, sub_type), amount) in products.iter().zip(amounts.iter()) {
                let Some((cost, price)) = amount else {
                    continue;
                };
                records.push(
                    Record::new()
                        .with("area", area)
                        .with("province", province)
                        .with("city", city)
                        .with("type", ty)
                        .with("sub_type", sub_type)
                        .with("cost", *cost)
                        .with("price", *price),
                );
            }
        }
        records
    }

    /// Pre-computed subtotals. Deliberately not equal to sums of `records()`
    /// so tests can tell which record set a value came from.
    pub fn totals() -> Vec<Record> {
        vec![
            Record::new().with("cost", 400.0).with("price", 800.0),
            Record::new().with("area", "中南").with("cost", 100.0).with("price", 300.0),
            Record::new().with("area", "东北").with("cost", 300.0).with("price", 500.0),
            Record::new()
                .with("area", "中南")
                .with("province", "广东")
                .with("cost", 100.0)
                .with("price", 300.0),
            Record::new()
                .with("area", "东北")
                .with("province", "辽宁")
                .with("cost", 140.0)
                .with("price", 260.0),
            Record::new()
                .with("area", "东北")
                .with("province", "吉林")
                .with("cost", 160.0)
                .with("price", 240.0),
            Record::new().with("type", "家具产品").with("cost", 250.0).with("price", 450.0),
            Record::new().with("type", "办公用品").with("cost", 150.0).with("price", 350.0),
        ]
    }

    pub fn meta() -> Vec<FieldMeta> {
        vec![
            FieldMeta {
                field: "cost".into(),
                name: Some("成本".into()),
            },
            FieldMeta {
                field: "price".into(),
                name: Some("价格".into()),
            },
        ]
    }

    pub fn config(sort_params: Vec<SortParam>) -> DataConfig {
        DataConfig {
            data: Self::records(),
            total_data: Self::totals(),
            meta: Self::meta(),
            fields: Self::fields(),
            sort_params,
            ..DataConfig::default()
        }
    }

    pub fn dataset(sort_params: Vec<SortParam>) -> PivotDataSet {
        PivotDataSet::new(Self::config(sort_params))
    }

    /// The fixture with measures laid out on columns (`true`) or rows.
    pub fn config_in(value_in_cols: bool, sort_params: Vec<SortParam>) -> DataConfig {
        let mut config = Self::config(sort_params);
        config.fields.value_in_cols = value_in_cols;
        config
    }

    pub fn dataset_in(value_in_cols: bool, sort_params: Vec<SortParam>) -> PivotDataSet {
        PivotDataSet::new(Self::config_in(value_in_cols, sort_params))
    }
}

// ============================================================================
// SINGLE MEASURE FIXTURE
// ============================================================================

/// One measure (cost) over rows area / province and columns type. Queries
/// may omit the measure selector.
pub struct SingleMeasureFixture;

impl SingleMeasureFixture {
    pub fn fields() -> FieldConfig {
        FieldConfig {
            rows: vec!["area".into(), "province".into()],
            columns: vec!["type".into()],
            values: vec!["cost".into()],
            ..FieldConfig::default()
        }
    }

    pub fn records() -> Vec<Record> {
        [
            ("中南", "广东", "办公用品", 120.0),
            ("东北", "辽宁", "家具产品", 40.0),
            ("东北", "吉林", "办公用品", 60.0),
            ("东北", "辽宁", "办公用品", 30.0),
        ]
        .iter()
        .map(|&(area, province, ty, cost)| {
            Record::new()
                .with("area", area)
                .with("province", province)
                .with("type", ty)
                .with("cost", cost)
        })
        .collect()
    }

    /// Subtotals ordered against natural order: 东北 < 中南, 吉林 < 辽宁.
    pub fn totals() -> Vec<Record> {
        vec![
            Record::new().with("cost", 400.0),
            Record::new().with("area", "中南").with("cost", 300.0),
            Record::new().with("area", "东北").with("cost", 100.0),
            Record::new().with("area", "东北").with("province", "辽宁").with("cost", 70.0),
            Record::new().with("area", "东北").with("province", "吉林").with("cost", 30.0),
            Record::new().with("type", "办公用品").with("cost", 360.0),
        ]
    }

    pub fn config_in(value_in_cols: bool, sort_params: Vec<SortParam>) -> DataConfig {
        let mut fields = Self::fields();
        fields.value_in_cols = value_in_cols;
        DataConfig {
            data: Self::records(),
            total_data: Self::totals(),
            fields,
            sort_params,
            ..DataConfig::default()
        }
    }

    pub fn dataset_in(value_in_cols: bool, sort_params: Vec<SortParam>) -> PivotDataSet {
        PivotDataSet::new(Self::config_in(value_in_cols, sort_params))
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Measures on columns, then measures on rows.
pub const VALUE_LAYOUTS: [bool; 2] = [true, false];

pub fn texts(values: &[&str]) -> Vec<DataValue> {
    values.iter().map(|v| DataValue::text(*v)).collect()
}

pub fn query(pairs: &[(&str, &str)]) -> Query {
    pairs.iter().map(|&(k, v)| (k, v)).collect()
}

/// A query selecting one measure, plus the given dimension values.
pub fn measure_query(measure: &str, pairs: &[(&str, &str)]) -> Query {
    query(pairs).with(EXTRA_FIELD, measure)
}
