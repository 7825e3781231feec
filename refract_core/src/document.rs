//! Rich text document trees.
//!
//! A node is generic over the record type held by reference nodes, so the
//! same tree shape carries raw targets before resolution and resolved
//! targets after.

use crate::classify::{self, ReferenceNodeType};
use crate::error::{Error, Result};
use crate::record::RawRecord;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Block-level node types that hold children.
const BLOCK_TYPES: &[&str] = &[
    "paragraph",
    "heading-1",
    "heading-2",
    "heading-3",
    "heading-4",
    "heading-5",
    "heading-6",
    "ordered-list",
    "unordered-list",
    "list-item",
    "hr",
    "blockquote",
    "table",
    "table-row",
    "table-cell",
    "table-header-cell",
    "embedded-entry-block",
    "embedded-asset-block",
    "embedded-resource-block",
];

/// Inline node types that hold children.
const INLINE_TYPES: &[&str] = &[
    "hyperlink",
    "entry-hyperlink",
    "asset-hyperlink",
    "embedded-entry-inline",
    "resource-hyperlink",
    "embedded-resource-inline",
];

/// Whether a container node is a block, an inline, or of a type we do not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerClass {
    Block,
    Inline,
    Unknown,
}

impl ContainerClass {
    /// Classify a node type.
    pub fn of(node_type: &str) -> Self {
        if BLOCK_TYPES.contains(&node_type) {
            ContainerClass::Block
        } else if INLINE_TYPES.contains(&node_type) {
            ContainerClass::Inline
        } else {
            ContainerClass::Unknown
        }
    }
}

/// Members of a node object other than its children.
pub type Members = Map<String, Value>;

/// A node of a rich text tree.
///
/// Every node keeps the members it was parsed with, so a tree without
/// reference nodes serializes back to exactly its input.
#[derive(Debug, Clone, PartialEq)]
pub enum RichTextNode<T> {
    /// The root node. `content` is `None` when the input had no children array.
    Document {
        members: Members,
        content: Option<Vec<RichTextNode<T>>>,
    },
    /// Any node with a children array that is not a document or a reference.
    Container {
        class: ContainerClass,
        members: Members,
        content: Vec<RichTextNode<T>>,
    },
    /// A text leaf.
    Text { members: Members },
    /// An embedded record or a hyperlink to one.
    ///
    /// `data` holds every data member except `target`; `members` holds every
    /// node member except `data` and `content`.
    Reference {
        node_type: ReferenceNodeType,
        target: T,
        data: Map<String, Value>,
        members: Members,
        content: Option<Vec<RichTextNode<T>>>,
    },
    /// A node with neither children nor a target, kept verbatim.
    Opaque(Value),
}

impl<T> RichTextNode<T> {
    /// An empty document.
    pub fn empty_document() -> Self {
        let mut members = Members::new();
        members.insert("nodeType".to_string(), Value::from("document"));
        members.insert("data".to_string(), Value::Object(Map::new()));
        RichTextNode::Document {
            members,
            content: Some(Vec::new()),
        }
    }

    /// The node's `nodeType`.
    pub fn node_type(&self) -> &str {
        match self {
            RichTextNode::Document { .. } => "document",
            RichTextNode::Text { .. } => "text",
            RichTextNode::Reference { node_type, .. } => node_type.as_str(),
            RichTextNode::Container { members, .. } => member_str(members, "nodeType"),
            RichTextNode::Opaque(value) => value
                .get("nodeType")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        }
    }

    /// The node's `data` object, if it has one.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        match self {
            RichTextNode::Reference { data, .. } => Some(data),
            RichTextNode::Document { members, .. }
            | RichTextNode::Container { members, .. }
            | RichTextNode::Text { members } => members.get("data").and_then(Value::as_object),
            RichTextNode::Opaque(value) => value.get("data").and_then(Value::as_object),
        }
    }

    /// The string value of a text leaf.
    pub fn text(&self) -> Option<&str> {
        match self {
            RichTextNode::Text { members } => members.get("value").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Children of the node, if it has a children array.
    pub fn content(&self) -> Option<&[RichTextNode<T>]> {
        match self {
            RichTextNode::Container { content, .. } => Some(content),
            RichTextNode::Document { content, .. } | RichTextNode::Reference { content, .. } => {
                content.as_deref()
            }
            RichTextNode::Text { .. } | RichTextNode::Opaque(_) => None,
        }
    }

    /// The embedded record, if this is a reference node.
    pub fn target(&self) -> Option<&T> {
        match self {
            RichTextNode::Reference { target, .. } => Some(target),
            _ => None,
        }
    }

    /// All embedded records in the tree, in document order.
    pub fn targets(&self) -> Vec<&T> {
        let mut targets = Vec::new();
        self.collect_targets(&mut targets);
        targets
    }

    fn collect_targets<'a>(&'a self, targets: &mut Vec<&'a T>) {
        if let Some(target) = self.target() {
            targets.push(target);
        }
        for child in self.content().unwrap_or_default() {
            child.collect_targets(targets);
        }
    }

    /// Rebuild the tree, replacing every reference target with `f`'s result.
    ///
    /// Children are visited depth-first in order; the first error aborts.
    pub fn try_map_targets<U, E, F>(&self, f: &mut F) -> std::result::Result<RichTextNode<U>, E>
    where
        F: FnMut(ReferenceNodeType, &T) -> std::result::Result<U, E>,
    {
        Ok(match self {
            RichTextNode::Document { members, content } => RichTextNode::Document {
                members: members.clone(),
                content: try_map_optional(content.as_deref(), f)?,
            },
            RichTextNode::Container {
                class,
                members,
                content,
            } => RichTextNode::Container {
                class: *class,
                members: members.clone(),
                content: try_map_children(content, f)?,
            },
            RichTextNode::Text { members } => RichTextNode::Text {
                members: members.clone(),
            },
            RichTextNode::Reference {
                node_type,
                target,
                data,
                members,
                content,
            } => RichTextNode::Reference {
                node_type: *node_type,
                target: f(*node_type, target)?,
                data: data.clone(),
                members: members.clone(),
                content: try_map_optional(content.as_deref(), f)?,
            },
            RichTextNode::Opaque(value) => RichTextNode::Opaque(value.clone()),
        })
    }
}

fn member_str<'a>(members: &'a Members, key: &str) -> &'a str {
    members
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn try_map_children<T, U, E, F>(
    content: &[RichTextNode<T>],
    f: &mut F,
) -> std::result::Result<Vec<RichTextNode<U>>, E>
where
    F: FnMut(ReferenceNodeType, &T) -> std::result::Result<U, E>,
{
    content
        .iter()
        .map(|child| child.try_map_targets(&mut *f))
        .collect()
}

fn try_map_optional<T, U, E, F>(
    content: Option<&[RichTextNode<T>]>,
    f: &mut F,
) -> std::result::Result<Option<Vec<RichTextNode<U>>>, E>
where
    F: FnMut(ReferenceNodeType, &T) -> std::result::Result<U, E>,
{
    content
        .map(|content| try_map_children(content, f))
        .transpose()
}

impl RichTextNode<RawRecord> {
    /// Parse a node tree from its JSON form.
    ///
    /// A reference-type node whose `data.target` is not an entry or asset
    /// (for example a link that was never stitched) is kept as a plain node.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_node("expected a JSON object"))?;

        let node_type = object
            .get("nodeType")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_node("missing nodeType"))?;

        match object.get("data") {
            None | Some(Value::Null) | Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(Error::invalid_node(format!(
                    "{} node has non-object data",
                    node_type
                )));
            }
        }

        if node_type == "text" {
            return Ok(RichTextNode::Text {
                members: object.clone(),
            });
        }

        // Only a children array is taken apart; anything else stays a member.
        let mut members = object.clone();
        let content = match members.remove("content") {
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(Self::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(other) => {
                members.insert("content".to_string(), other);
                None
            }
            None => None,
        };

        if node_type == "document" {
            return Ok(RichTextNode::Document { members, content });
        }

        if let Some(reference) = ReferenceNodeType::from_node_type(node_type)
            && let Some(kind) = object
                .get("data")
                .and_then(|data| data.get("target"))
                .and_then(classify::record_kind)
        {
            if kind != reference.target_kind() {
                return Err(Error::invalid_node(format!(
                    "{} node embeds an {} target",
                    reference, kind
                )));
            }

            let mut data = match members.remove("data") {
                Some(Value::Object(data)) => data,
                _ => return Err(Error::invalid_node("missing data")),
            };
            let target = data
                .remove("target")
                .ok_or_else(|| Error::invalid_node("missing target"))?;

            return Ok(RichTextNode::Reference {
                node_type: reference,
                target: RawRecord::from_json(&target)?,
                data,
                members,
                content,
            });
        }

        Ok(match content {
            Some(content) => RichTextNode::Container {
                class: ContainerClass::of(node_type),
                members,
                content,
            },
            None => RichTextNode::Opaque(value.clone()),
        })
    }
}

/// `data` with the target put back in for serialization.
struct DataWithTarget<'a, T> {
    data: &'a Map<String, Value>,
    target: &'a T,
}

impl<T: Serialize> Serialize for DataWithTarget<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len() + 1))?;
        for (key, value) in self.data {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("target", self.target)?;
        map.end()
    }
}

impl<T: Serialize> Serialize for RichTextNode<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let (members, content) = match self {
            RichTextNode::Opaque(value) => return value.serialize(serializer),
            RichTextNode::Text { members } => return members.serialize(serializer),
            RichTextNode::Document { members, content } => (members, content.as_deref()),
            RichTextNode::Container {
                members, content, ..
            } => (members, Some(content.as_slice())),
            RichTextNode::Reference {
                members, content, ..
            } => (members, content.as_deref()),
        };

        let mut map = serializer.serialize_map(None)?;
        for (key, value) in members {
            map.serialize_entry(key, value)?;
        }
        if let RichTextNode::Reference { data, target, .. } = self {
            map.serialize_entry("data", &DataWithTarget { data, target })?;
        }
        if let Some(content) = content {
            map.serialize_entry("content", content)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RichTextNode<RawRecord> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RichTextNode::from_json(&value).map_err(serde::de::Error::custom)
    }
}
