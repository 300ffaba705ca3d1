//! FILENAME: core/pivot-dataset/src/hierarchy.rs
//! Header hierarchy builder.
//!
//! Expands the row and column header trees of a data set by resolving each
//! level under its ancestors' query, the way the layout builder walks the
//! axes: rows first, then columns, the measure selector as the innermost
//! level of whichever axis carries the measures.

use crate::dataset::PivotDataSet;
use crate::definition::{CustomTreeItem, Query, EXTRA_FIELD};
use crate::value::DataValue;

// ============================================================================
// HEADER TREE STRUCTURES
// ============================================================================

/// One header cell: a value of `field` under its ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderNode {
    pub field: String,

    pub value: DataValue,

    /// Display label (field display name for measure nodes).
    pub label: String,

    /// Depth in the tree (0 = outermost level).
    pub depth: usize,

    /// Ancestor values plus this node's own.
    pub query: Query,

    pub children: Vec<HeaderNode>,
}

impl HeaderNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a HeaderNode>) {
        if self.is_leaf() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }
}

/// Row and column header trees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotHierarchy {
    pub rows: Vec<HeaderNode>,
    pub columns: Vec<HeaderNode>,
}

impl PivotHierarchy {
    /// Row leaves, depth-first.
    pub fn row_leaves(&self) -> Vec<&HeaderNode> {
        leaves(&self.rows)
    }

    /// Column leaves, depth-first.
    pub fn column_leaves(&self) -> Vec<&HeaderNode> {
        leaves(&self.columns)
    }

    /// Cell values for every (row leaf, column leaf) pair. An axis without
    /// headers contributes a single empty query.
    pub fn cell_grid(&self, dataset: &PivotDataSet) -> Vec<Vec<Option<DataValue>>> {
        let empty = Query::new();
        let row_queries = leaf_queries(&self.row_leaves(), &empty);
        let column_queries = leaf_queries(&self.column_leaves(), &empty);

        row_queries
            .iter()
            .map(|row| {
                column_queries
                    .iter()
                    .map(|column| dataset.get_cell_value(&row.merged(column)))
                    .collect()
            })
            .collect()
    }
}

fn leaves(nodes: &[HeaderNode]) -> Vec<&HeaderNode> {
    let mut out = Vec::new();
    for node in nodes {
        node.collect_leaves(&mut out);
    }
    out
}

fn leaf_queries<'a>(leaves: &[&'a HeaderNode], empty: &'a Query) -> Vec<&'a Query> {
    if leaves.is_empty() {
        vec![empty]
    } else {
        leaves.iter().map(|leaf| &leaf.query).collect()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds both header trees of `dataset`.
pub fn build_hierarchy(dataset: &PivotDataSet) -> PivotHierarchy {
    let fields = dataset.fields();

    let rows = if fields.custom_tree_items.is_empty() {
        build_level(dataset, &fields.row_dimensions(), 0, &Query::new())
    } else {
        build_custom_level(dataset, &fields.custom_tree_items, 0, &Query::new())
    };
    let columns = build_level(dataset, &fields.column_dimensions(), 0, &Query::new());

    PivotHierarchy { rows, columns }
}

/// Recursively builds one level of an axis tree.
fn build_level(
    dataset: &PivotDataSet,
    dimensions: &[String],
    depth: usize,
    parent: &Query,
) -> Vec<HeaderNode> {
    let Some(field) = dimensions.get(depth) else {
        return Vec::new();
    };

    dataset
        .get_dimension_values(field, parent)
        .into_iter()
        .map(|value| {
            let query = parent.clone().with(field.as_str(), value.clone());
            let children = build_level(dataset, dimensions, depth + 1, &query);
            HeaderNode {
                field: field.clone(),
                label: header_label(dataset, field, &value),
                value,
                depth,
                query,
                children,
            }
        })
        .collect()
}

fn build_custom_level(
    dataset: &PivotDataSet,
    items: &[CustomTreeItem],
    depth: usize,
    parent: &Query,
) -> Vec<HeaderNode> {
    items
        .iter()
        .map(|item| {
            let query = parent.clone().with(EXTRA_FIELD, item.key.as_str());
            HeaderNode {
                field: EXTRA_FIELD.to_string(),
                value: DataValue::text(item.key.as_str()),
                label: item.title.clone(),
                depth,
                children: build_custom_level(dataset, &item.children, depth + 1, &query),
                query,
            }
        })
        .collect()
}

fn header_label(dataset: &PivotDataSet, field: &str, value: &DataValue) -> String {
    if field == EXTRA_FIELD {
        dataset.field_name(&value.to_string())
    } else {
        value.to_string()
    }
}
