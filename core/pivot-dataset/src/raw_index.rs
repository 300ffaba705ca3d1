//! FILENAME: core/pivot-dataset/src/raw_index.rs
//! RawIndex - grouping tree over the primary records.
//!
//! Records are grouped progressively along the canonical dimension order
//! (row dimensions, then column dimensions, then the measure selector).
//! Both header hierarchies expand depth-first along exactly that order, so a
//! query fixing a prefix of it descends straight to the matching subtree
//! instead of scanning every record.
//!
//! Every node remembers the first record that reached it. Because records are
//! inserted in source order, that id is the smallest one in the subtree, which
//! gives first-appearance ordering without visiting leaves.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::cache::{FieldCache, ValueId};
use crate::definition::{Query, Record};
use crate::value::DataValue;

/// Position of a record in the source order.
pub type RecordId = u32;

#[derive(Debug)]
struct GroupNode {
    /// Smallest record id in this subtree.
    first_record: RecordId,

    children: FxHashMap<ValueId, GroupNode>,

    /// Records ending here (leaf level only), ascending.
    records: SmallVec<[RecordId; 4]>,
}

impl GroupNode {
    fn new(first_record: RecordId) -> Self {
        GroupNode {
            first_record,
            children: FxHashMap::default(),
            records: SmallVec::new(),
        }
    }

    fn count_nodes(&self) -> usize {
        1 + self.children.values().map(GroupNode::count_nodes).sum::<usize>()
    }
}

/// A query translated into grouping-tree terms.
struct QueryPlan<'q> {
    /// Fixed value id per level, `None` for a wildcard.
    fixed: Vec<Option<ValueId>>,

    /// Query keys that are not grouping levels, checked on each record.
    residual: Vec<(&'q str, &'q DataValue)>,
}

impl QueryPlan<'_> {
    /// The shallowest depth from which nothing below `from` constrains the
    /// walk any more, or `None` when records must be inspected.
    fn unconstrained_below(&self, from: usize) -> Option<usize> {
        if !self.residual.is_empty() {
            return None;
        }
        let last_fixed = self.fixed.iter().rposition(Option::is_some);
        Some(match last_fixed {
            Some(level) => from.max(level + 1),
            None => from,
        })
    }
}

/// Index over the primary record set.
#[derive(Debug)]
pub struct RawIndex {
    records: Vec<Record>,

    /// One interning cache per grouping level, in canonical order.
    levels: Vec<FieldCache>,

    level_of: FxHashMap<String, usize>,

    root: GroupNode,
}

impl RawIndex {
    /// Builds the grouping tree. `dimensions` is the canonical dimension order;
    /// repeated names are grouped once.
    pub fn build(records: Vec<Record>, dimensions: &[String]) -> Self {
        let mut levels: Vec<FieldCache> = Vec::with_capacity(dimensions.len());
        let mut level_of = FxHashMap::default();
        for dim in dimensions {
            if !level_of.contains_key(dim) {
                level_of.insert(dim.clone(), levels.len());
                levels.push(FieldCache::new(dim.clone()));
            }
        }

        let mut root = GroupNode::new(0);
        for (rid, record) in records.iter().enumerate() {
            let rid = rid as RecordId;
            let mut node = &mut root;
            for level in levels.iter_mut() {
                let id = level.intern(record.get(&level.name));
                node = node
                    .children
                    .entry(id)
                    .or_insert_with(|| GroupNode::new(rid));
            }
            node.records.push(rid);
        }

        RawIndex {
            records,
            levels,
            level_of,
            root,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of grouping-tree nodes (diagnostics).
    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }

    /// Distinct values of `dimension` among records matching `query`, in
    /// first-appearance order. Records without the field contribute nothing.
    pub fn distinct_values(&self, dimension: &str, query: &Query) -> Vec<DataValue> {
        let Some(plan) = self.plan(query) else {
            return Vec::new();
        };

        let mut first_seen: FxHashMap<&DataValue, RecordId> = FxHashMap::default();

        match self.level_of.get(dimension).copied() {
            Some(level) => {
                let field = &self.levels[level];
                let stop = plan.unconstrained_below(level + 1);
                self.visit(&plan, stop, |rid, path| {
                    if let Some(value) = field.get_value(path[level]) {
                        first_seen
                            .entry(value)
                            .and_modify(|min| *min = (*min).min(rid))
                            .or_insert(rid);
                    }
                });
            }
            None => {
                self.visit(&plan, None, |rid, _| {
                    if let Some(value) = self.records[rid as usize].get(dimension) {
                        first_seen
                            .entry(value)
                            .and_modify(|min| *min = (*min).min(rid))
                            .or_insert(rid);
                    }
                });
            }
        }

        let mut ordered: Vec<(RecordId, &DataValue)> =
            first_seen.into_iter().map(|(value, rid)| (rid, value)).collect();
        ordered.sort_unstable_by_key(|(rid, _)| *rid);
        ordered.into_iter().map(|(_, value)| value.clone()).collect()
    }

    /// The first record (in source order) matching every key of `query`.
    pub fn lookup(&self, query: &Query) -> Option<&Record> {
        let plan = self.plan(query)?;
        let mut best: Option<RecordId> = None;
        self.visit(&plan, plan.unconstrained_below(0), |rid, _| {
            best = Some(best.map_or(rid, |b| b.min(rid)));
        });
        best.map(|rid| &self.records[rid as usize])
    }

    /// Every record matching `query`, in source order.
    pub fn lookup_all(&self, query: &Query) -> Vec<&Record> {
        let Some(plan) = self.plan(query) else {
            return Vec::new();
        };
        let mut ids = Vec::new();
        self.visit(&plan, None, |rid, _| ids.push(rid));
        ids.sort_unstable();
        ids.into_iter().map(|rid| &self.records[rid as usize]).collect()
    }

    /// Translates a query into per-level ids. Returns `None` when a fixed
    /// value never occurs at its level, i.e. nothing can match.
    fn plan<'q>(&self, query: &'q Query) -> Option<QueryPlan<'q>> {
        let mut fixed = vec![None; self.levels.len()];
        let mut residual = Vec::new();
        for (key, value) in query.iter() {
            match self.level_of.get(key.as_str()) {
                Some(&level) => fixed[level] = Some(self.levels[level].id_of(value)?),
                None => residual.push((key.as_str(), value)),
            }
        }
        Some(QueryPlan { fixed, residual })
    }

    /// Walks the matching part of the tree, calling `f(record_id, path)` for
    /// every matching record. With `stop = Some(d)` the walk ends at depth `d`
    /// and reports each node's first record instead.
    fn visit<F>(&self, plan: &QueryPlan<'_>, stop: Option<usize>, mut f: F)
    where
        F: FnMut(RecordId, &[ValueId]),
    {
        let mut path = Vec::with_capacity(self.levels.len());
        self.visit_node(&self.root, 0, plan, stop, &mut path, &mut f);
    }

    fn visit_node<F>(
        &self,
        node: &GroupNode,
        depth: usize,
        plan: &QueryPlan<'_>,
        stop: Option<usize>,
        path: &mut Vec<ValueId>,
        f: &mut F,
    ) where
        F: FnMut(RecordId, &[ValueId]),
    {
        if stop == Some(depth) {
            if depth > 0 || !self.records.is_empty() {
                f(node.first_record, path);
            }
            return;
        }

        if depth == self.levels.len() {
            for &rid in &node.records {
                let record = &self.records[rid as usize];
                if plan
                    .residual
                    .iter()
                    .all(|(key, value)| record.get(key) == Some(*value))
                {
                    f(rid, path);
                }
            }
            return;
        }

        match plan.fixed[depth] {
            Some(id) => {
                if let Some(child) = node.children.get(&id) {
                    path.push(id);
                    self.visit_node(child, depth + 1, plan, stop, path, f);
                    path.pop();
                }
            }
            None => {
                for (&id, child) in &node.children {
                    path.push(id);
                    self.visit_node(child, depth + 1, plan, stop, path, f);
                    path.pop();
                }
            }
        }
    }
}
