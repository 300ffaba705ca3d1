//! FILENAME: core/pivot-dataset/src/totals_index.rs
//! TotalsIndex - lookup over pre-aggregated subtotal and grand total records.
//!
//! A totals record fixes only some dimensions (a province subtotal fixes
//! area and province, a grand total fixes none). Records are grouped by the
//! set of dimensions they fix, their "signature". A query is answered by the
//! most specific signature that the query fully covers.

use std::cmp::Reverse;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::definition::{Query, Record};
use crate::raw_index::RecordId;
use crate::value::DataValue;

/// All totals records fixing the same set of dimensions.
#[derive(Debug)]
struct TotalsGroup {
    /// Fixed dimensions, in canonical order.
    signature: Vec<String>,

    first_record: RecordId,

    /// Fixed values (aligned with `signature`) to matching records, ascending.
    entries: FxHashMap<Vec<DataValue>, SmallVec<[RecordId; 2]>>,
}

impl TotalsGroup {
    fn covered_by(&self, query: &Query, except: Option<&str>) -> bool {
        self.signature
            .iter()
            .filter(|d| Some(d.as_str()) != except)
            .all(|d| query.contains_key(d))
    }
}

/// Index over the totals record set.
#[derive(Debug)]
pub struct TotalsIndex {
    records: Vec<Record>,

    /// Most specific signature first; ties by first appearance.
    groups: Vec<TotalsGroup>,
}

impl TotalsIndex {
    /// Groups totals records by the `dimensions` they carry. Fields that are
    /// not dimensions (the measures) never enter a signature.
    pub fn build(records: Vec<Record>, dimensions: &[String]) -> Self {
        let mut group_of: FxHashMap<Vec<String>, usize> = FxHashMap::default();
        let mut groups: Vec<TotalsGroup> = Vec::new();

        for (rid, record) in records.iter().enumerate() {
            let rid = rid as RecordId;
            let mut signature: Vec<String> = Vec::new();
            for dim in dimensions {
                if record.contains_field(dim) && !signature.contains(dim) {
                    signature.push(dim.clone());
                }
            }
            let key: Vec<DataValue> = signature
                .iter()
                .filter_map(|d| record.get(d).cloned())
                .collect();

            let idx = *group_of.entry(signature.clone()).or_insert_with(|| {
                groups.push(TotalsGroup {
                    signature,
                    first_record: rid,
                    entries: FxHashMap::default(),
                });
                groups.len() - 1
            });
            groups[idx].entries.entry(key).or_default().push(rid);
        }

        groups.sort_by_key(|g| (Reverse(g.signature.len()), g.first_record));

        TotalsIndex { records, groups }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct signatures (diagnostics).
    pub fn signature_count(&self) -> usize {
        self.groups.len()
    }

    /// The totals record whose fixed dimensions are all fixed by `query`
    /// with equal values, preferring the largest such set.
    pub fn lookup(&self, query: &Query) -> Option<&Record> {
        for group in &self.groups {
            if !group.covered_by(query, None) {
                continue;
            }
            let key: Vec<DataValue> = group
                .signature
                .iter()
                .filter_map(|d| query.get(d).cloned())
                .collect();
            if let Some(ids) = group.entries.get(&key) {
                return Some(&self.records[ids[0] as usize]);
            }
        }
        None
    }

    /// Values of `dimension` on the most specific totals records that fix
    /// `dimension` and otherwise agree with `query`, in first-appearance order.
    pub fn distinct_values(&self, dimension: &str, query: &Query) -> Vec<DataValue> {
        for group in &self.groups {
            let Some(pos) = group.signature.iter().position(|d| d == dimension) else {
                continue;
            };
            if !group.covered_by(query, Some(dimension)) {
                continue;
            }

            let mut found: Vec<(RecordId, &DataValue)> = group
                .entries
                .iter()
                .filter(|(key, _)| {
                    group
                        .signature
                        .iter()
                        .zip(key.iter())
                        .enumerate()
                        .all(|(i, (d, v))| i == pos || query.get(d) == Some(v))
                })
                .map(|(key, ids)| (ids[0], &key[pos]))
                .collect();

            if found.is_empty() {
                continue;
            }
            found.sort_unstable_by_key(|(rid, _)| *rid);
            return found.into_iter().map(|(_, v)| v.clone()).collect();
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_totals() -> TotalsIndex {
        let records = vec![
            Record::new().with("price", 900.0),
            Record::new().with("area", "中南").with("price", 300.0),
            Record::new().with("area", "东北").with("price", 600.0),
            Record::new()
                .with("area", "东北")
                .with("province", "辽宁")
                .with("price", 250.0),
            Record::new()
                .with("area", "东北")
                .with("province", "吉林")
                .with("price", 350.0),
        ];
        TotalsIndex::build(
            records,
            &["area".to_string(), "province".to_string(), "city".to_string()],
        )
    }

    #[test]
    fn test_lookup_prefers_most_specific() {
        let index = create_test_totals();
        let q = Query::new().with("area", "东北").with("province", "吉林");
        assert_eq!(index.lookup(&q).unwrap().get("price"), Some(&DataValue::number(350.0)));

        let q = Query::new().with("area", "东北");
        assert_eq!(index.lookup(&q).unwrap().get("price"), Some(&DataValue::number(600.0)));
    }

    #[test]
    fn test_lookup_falls_back_to_coarser_record() {
        let index = create_test_totals();
        // No city-level totals: the province subtotal is the best candidate.
        let q = Query::new()
            .with("area", "东北")
            .with("province", "辽宁")
            .with("city", "朝阳");
        assert_eq!(index.lookup(&q).unwrap().get("price"), Some(&DataValue::number(250.0)));

        // Nothing fixes "area = 西北": grand total.
        let q = Query::new().with("area", "西北");
        assert_eq!(index.lookup(&q).unwrap().get("price"), Some(&DataValue::number(900.0)));
    }

    #[test]
    fn test_distinct_values() {
        let index = create_test_totals();
        assert_eq!(
            index.distinct_values("area", &Query::new()),
            vec![DataValue::text("中南"), DataValue::text("东北")]
        );
        assert_eq!(
            index.distinct_values("province", &Query::new().with("area", "东北")),
            vec![DataValue::text("辽宁"), DataValue::text("吉林")]
        );
        assert!(index
            .distinct_values("province", &Query::new().with("area", "中南"))
            .is_empty());
        assert!(index.distinct_values("city", &Query::new()).is_empty());
    }

    #[test]
    fn test_signatures() {
        let index = create_test_totals();
        assert_eq!(index.signature_count(), 3);
        assert_eq!(index.len(), 5);
    }
}
