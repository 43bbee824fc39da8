//! Native view evaluation.
//!
//! Rows are produced by running a view's map closure over every live,
//! non-design document, then sorted by collated key and document ID the
//! way a CouchDB index is.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use oidc_docdb::{BuiltinReduce, ViewDefinition, ViewQuery, ViewResult, ViewRow, collate};
use serde_json::{Value, json};

use crate::storage::StoredDocument;

/// One emitted index row before options are applied.
#[derive(Debug, Clone)]
struct IndexRow {
    id: String,
    key: Value,
    value: Value,
}

fn build_index(
    view: &ViewDefinition,
    documents: &BTreeMap<String, StoredDocument>,
) -> Vec<IndexRow> {
    let mut rows: Vec<IndexRow> = documents
        .iter()
        .filter(|(id, doc)| !doc.deleted && !id.starts_with("_design/"))
        .flat_map(|(id, doc)| {
            view.map(&doc.body)
                .into_iter()
                .map(move |(key, value)| IndexRow {
                    id: id.clone(),
                    key,
                    value,
                })
        })
        .collect();

    rows.sort_by(|a, b| collate(&a.key, &b.key).then_with(|| a.id.cmp(&b.id)));
    rows
}

fn in_range(key: &Value, query: &ViewQuery) -> bool {
    // With `descending`, `start_key` is the upper bound and `end_key` the lower.
    let (lower, upper) = if query.descending {
        (query.end_key.as_ref(), query.start_key.as_ref())
    } else {
        (query.start_key.as_ref(), query.end_key.as_ref())
    };

    lower.is_none_or(|lower| collate(key, lower) != Ordering::Less)
        && upper.is_none_or(|upper| collate(key, upper) != Ordering::Greater)
}

fn select(index: Vec<IndexRow>, query: &ViewQuery) -> Vec<IndexRow> {
    if let Some(keys) = &query.keys {
        let mut selected = Vec::new();
        for key in keys {
            selected.extend(
                index
                    .iter()
                    .filter(|row| collate(&row.key, key) == Ordering::Equal)
                    .cloned(),
            );
        }
        if query.descending {
            selected.reverse();
        }
        return selected;
    }

    let mut selected: Vec<IndexRow> = index
        .into_iter()
        .filter(|row| {
            query
                .key
                .as_ref()
                .is_none_or(|key| collate(&row.key, key) == Ordering::Equal)
        })
        .filter(|row| in_range(&row.key, query))
        .collect();

    if query.descending {
        selected.reverse();
    }
    selected
}

/// Executes `view` over `documents` with the given options.
pub(crate) fn execute(
    view: &ViewDefinition,
    documents: &BTreeMap<String, StoredDocument>,
    query: &ViewQuery,
) -> ViewResult {
    let index = build_index(view, documents);
    let total_rows = index.len() as u64;
    let selected = select(index, query);

    let reduce = match (view.reduce(), query.reduce) {
        (Some(reduce), None | Some(true)) => Some(reduce),
        _ => None,
    };

    if let Some(BuiltinReduce::Count) = reduce {
        let count = selected.len();
        let rows = if count == 0 {
            Vec::new()
        } else {
            vec![ViewRow {
                id: None,
                key: Value::Null,
                value: json!(count),
                doc: None,
            }]
        };
        return ViewResult {
            total_rows: None,
            offset: None,
            rows,
        };
    }

    let skip = query.skip.unwrap_or(0);
    let rows = selected
        .into_iter()
        .skip(skip)
        .take(query.limit.unwrap_or(usize::MAX))
        .map(|row| {
            let doc = query
                .include_docs
                .then(|| documents.get(&row.id).map(|stored| stored.body.clone()))
                .flatten();
            ViewRow {
                id: Some(row.id),
                key: row.key,
                value: row.value,
                doc,
            }
        })
        .collect();

    ViewResult {
        total_rows: Some(total_rows),
        offset: Some(skip as u64),
        rows,
    }
}
