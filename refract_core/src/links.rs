//! Stitching `Link` placeholders in raw documents against a reference list.
//!
//! Delivery payloads embed references as `{sys: {type: "Link", linkType, id}}`
//! placeholders and ship the referenced records separately. Stitching swaps
//! each placeholder for its record and drops placeholders that have no match.

use crate::classify;
use crate::document::RichTextNode;
use crate::error::{Error, Result};
use crate::record::{RawRecord, RecordKind};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::trace;

/// Normalize a record id the way node ids are normalized by the host system:
/// ids starting with a digit gain a `c` prefix.
pub fn normalize_id(id: &str) -> String {
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        format!("c{}", id)
    } else {
        id.to_string()
    }
}

/// Referenced records keyed by kind and normalized id.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    records: HashMap<(RecordKind, String), Value>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a flat reference list.
    pub fn from_references(references: &[Value]) -> Result<Self> {
        let mut index = LinkIndex::new();
        for reference in references {
            index.insert(reference)?;
        }
        Ok(index)
    }

    /// Add a reference.
    ///
    /// A reference either carries a full `sys` block, or is a flat node with
    /// a `contentful_id`, in which case it is given an entry `sys` block with
    /// the normalized id.
    pub fn insert(&mut self, reference: &Value) -> Result<()> {
        let object = reference
            .as_object()
            .ok_or_else(|| Error::invalid_record("reference must be a JSON object"))?;

        let sys_id = object
            .get("sys")
            .and_then(|sys| sys.get("id"))
            .and_then(Value::as_str);

        let (kind, id, record) = match sys_id {
            Some(id) => {
                let kind = classify::record_kind(reference).unwrap_or(RecordKind::Entry);
                (kind, normalize_id(id), reference.clone())
            }
            None => {
                let contentful_id = object
                    .get("contentful_id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        Error::invalid_record("reference has neither sys.id nor contentful_id")
                    })?;
                let id = normalize_id(contentful_id);

                let mut record = object.clone();
                let mut sys = match record.remove("sys") {
                    Some(Value::Object(sys)) => sys,
                    _ => Map::new(),
                };
                sys.insert("type".to_string(), Value::from(RecordKind::Entry.as_str()));
                sys.insert("id".to_string(), Value::from(id.clone()));
                record.insert("sys".to_string(), Value::Object(sys));

                (RecordKind::Entry, id, Value::Object(record))
            }
        };

        self.records.insert((kind, id), record);
        Ok(())
    }

    /// Look up a referenced record.
    pub fn get(&self, kind: RecordKind, id: &str) -> Option<&Value> {
        self.records.get(&(kind, normalize_id(id)))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return a copy of `document` with every placeholder replaced by its
    /// record. Unmatched placeholders are removed: dropped from arrays,
    /// deleted from objects. Inserted records are not stitched themselves.
    pub fn stitch(&self, document: &Value) -> Value {
        self.stitch_value(document).unwrap_or(Value::Null)
    }

    /// Stitch a raw document and parse it into a node tree.
    pub fn stitch_document(&self, document: &Value) -> Result<RichTextNode<RawRecord>> {
        RichTextNode::from_json(&self.stitch(document))
    }

    /// `None` means the value is an unmatched placeholder.
    fn stitch_value(&self, value: &Value) -> Option<Value> {
        if let Some((kind, id)) = classify::link_target(value) {
            let record = self.get(kind, id);
            if record.is_none() {
                trace!(kind = kind.as_str(), id, "dropping unresolved link");
            }
            return record.cloned();
        }

        Some(match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .filter_map(|item| self.stitch_value(item))
                    .collect(),
            ),
            Value::Object(members) => Value::Object(
                members
                    .iter()
                    .filter_map(|(key, member)| {
                        self.stitch_value(member).map(|member| (key.clone(), member))
                    })
                    .collect(),
            ),
            other => other.clone(),
        })
    }
}
