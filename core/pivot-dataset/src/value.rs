//! FILENAME: core/pivot-dataset/src/value.rs
//! Scalar values carried by records, queries and resolved dimension sequences.
//!
//! Records only ever hold text or numbers. Numbers are wrapped in
//! `OrderedFloat` so values can key hash maps (interning, query matching,
//! resolution cache).

use std::cmp::Ordering;
use std::fmt;

use icu_collator::{Collator, CollatorOptions, Strength};
use icu_locid::{locale, Locale};
use serde::{Deserialize, Serialize};

use crate::log_warn;

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // -0.0 == 0.0, so they must hash alike
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// A primitive scalar held by a record field or a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Number(OrderedFloat),
    Text(String),
}

impl DataValue {
    pub fn text(s: impl Into<String>) -> Self {
        DataValue::Text(s.into())
    }

    pub fn number(n: f64) -> Self {
        DataValue::Number(OrderedFloat(n))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s.as_str()),
            DataValue::Number(_) => None,
        }
    }

    /// Numeric reading of the value. Text counts when it parses as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) => Some(n.0),
            DataValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Converts a JSON scalar into a value. Booleans become text; null,
    /// arrays and objects have no scalar reading.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(DataValue::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(DataValue::number),
            serde_json::Value::Bool(b) => Some(DataValue::Text(b.to_string())),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Text(s) => f.write_str(s),
            DataValue::Number(n) => write!(f, "{}", n.0),
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::number(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::number(value as f64)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::number(value as f64)
    }
}

thread_local! {
    static COLLATOR: Option<Collator> = create_collator();
}

fn create_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    // Secondary strength ignores case; ties are broken by code point below.
    options.strength = Some(Strength::Secondary);
    // The default zh collation orders Han by pinyin.
    let locale: Locale = locale!("zh");
    match Collator::try_new(&locale.into(), options) {
        Ok(collator) => Some(collator),
        Err(e) => {
            log_warn!("SORT", "no zh collator ({}); comparing by code point", e);
            None
        }
    }
}

/// Locale-aware text comparison (pinyin for Han, case-insensitive for
/// Latin), then by code point so distinct strings never compare equal.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let collated = COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => Ordering::Equal,
    });
    collated.then_with(|| a.cmp(b))
}

/// Comparison used when a candidate set mixes text and numbers: numbers
/// first (numerically), then text.
pub fn compare_values(a: &DataValue, b: &DataValue) -> Ordering {
    match (a, b) {
        (DataValue::Number(na), DataValue::Number(nb)) => {
            na.0.partial_cmp(&nb.0).unwrap_or(Ordering::Equal)
        }
        (DataValue::Number(_), DataValue::Text(_)) => Ordering::Less,
        (DataValue::Text(_), DataValue::Number(_)) => Ordering::Greater,
        (DataValue::Text(ta), DataValue::Text(tb)) => compare_text(ta, tb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialize() {
        let values: Vec<DataValue> = serde_json::from_str(r#"["a", 1.5, 2]"#).unwrap();
        assert_eq!(
            values,
            vec![DataValue::text("a"), DataValue::number(1.5), DataValue::number(2.0)]
        );
    }

    #[test]
    fn test_numeric_text_parses() {
        assert_eq!(DataValue::text(" 12 ").as_f64(), Some(12.0));
        assert_eq!(DataValue::text("abc").as_f64(), None);
    }

    #[test]
    fn test_compare_text_is_case_insensitive_first() {
        assert_eq!(compare_text("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_text("B", "b"), Ordering::Less);
        assert_eq!(compare_text("b", "B"), Ordering::Greater);
        assert_eq!(compare_text("price", "price"), Ordering::Equal);
    }

    #[test]
    fn test_compare_text_orders_han_by_pinyin() {
        // chao < fu, bai < dan: the reverse of code point order.
        assert_eq!(compare_text("朝阳", "抚顺"), Ordering::Less);
        assert_eq!(compare_text("白山", "丹东"), Ordering::Less);
        assert!("朝阳" > "抚顺" && "白山" > "丹东");

        let mut cities = vec!["抚顺", "丹东", "朝阳", "白山"];
        cities.sort_by(|a, b| compare_text(a, b));
        assert_eq!(cities, vec!["白山", "朝阳", "丹东", "抚顺"]);

        assert_eq!(compare_text("吉林", "辽宁"), Ordering::Less);
        assert_eq!(compare_text("东北", "中南"), Ordering::Less);
    }

    #[test]
    fn test_compare_values_puts_numbers_first() {
        assert_eq!(
            compare_values(&DataValue::number(100.0), &DataValue::text("白山")),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&DataValue::text("抚顺"), &DataValue::text("朝阳")),
            Ordering::Greater
        );
    }

    #[test]
    fn test_json_scalars() {
        assert_eq!(
            DataValue::from_json(&serde_json::json!(true)),
            Some(DataValue::text("true"))
        );
        assert_eq!(DataValue::from_json(&serde_json::Value::Null), None);
    }
}
