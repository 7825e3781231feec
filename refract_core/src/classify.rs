//! Reference classification for raw JSON values and rich text nodes.
//!
//! Classification is structural: a value is a reference when its `sys.type`
//! discriminator says so, never by id or field name.

use crate::record::RecordKind;
use serde_json::Value;
use std::fmt;

/// Report which kind of record a raw JSON value is, if any.
///
/// `Link` placeholders and plain objects are not records.
pub fn record_kind(value: &Value) -> Option<RecordKind> {
    match value.get("sys")?.get("type")?.as_str()? {
        "Entry" => Some(RecordKind::Entry),
        "Asset" => Some(RecordKind::Asset),
        _ => None,
    }
}

/// True when the value is an entry in raw field shape.
pub fn is_entry_reference(value: &Value) -> bool {
    record_kind(value) == Some(RecordKind::Entry)
}

/// True when the value is an asset in raw field shape.
pub fn is_asset_reference(value: &Value) -> bool {
    record_kind(value) == Some(RecordKind::Asset)
}

/// Extract the target of an unresolved `{sys: {type: "Link", linkType, id}}` placeholder.
pub fn link_target(value: &Value) -> Option<(RecordKind, &str)> {
    let sys = value.get("sys")?;
    if sys.get("type")?.as_str()? != "Link" {
        return None;
    }

    let kind = match sys.get("linkType")?.as_str()? {
        "Entry" => RecordKind::Entry,
        "Asset" => RecordKind::Asset,
        _ => return None,
    };

    Some((kind, sys.get("id")?.as_str()?))
}

/// Rich text node types that carry an embedded record in `data.target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceNodeType {
    /// `embedded-entry-block`
    EmbeddedEntryBlock,
    /// `embedded-entry-inline`
    EmbeddedEntryInline,
    /// `entry-hyperlink`
    EntryHyperlink,
    /// `embedded-asset-block`
    EmbeddedAssetBlock,
    /// `asset-hyperlink`
    AssetHyperlink,
}

impl ReferenceNodeType {
    /// All reference-carrying node types.
    pub const ALL: [ReferenceNodeType; 5] = [
        ReferenceNodeType::EmbeddedEntryBlock,
        ReferenceNodeType::EmbeddedEntryInline,
        ReferenceNodeType::EntryHyperlink,
        ReferenceNodeType::EmbeddedAssetBlock,
        ReferenceNodeType::AssetHyperlink,
    ];

    /// The `nodeType` string used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceNodeType::EmbeddedEntryBlock => "embedded-entry-block",
            ReferenceNodeType::EmbeddedEntryInline => "embedded-entry-inline",
            ReferenceNodeType::EntryHyperlink => "entry-hyperlink",
            ReferenceNodeType::EmbeddedAssetBlock => "embedded-asset-block",
            ReferenceNodeType::AssetHyperlink => "asset-hyperlink",
        }
    }

    /// Parse from a `nodeType` string. Returns `None` for every other node type.
    pub fn from_node_type(node_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == node_type)
    }

    /// The kind of record this node embeds.
    pub fn target_kind(&self) -> RecordKind {
        match self {
            ReferenceNodeType::EmbeddedEntryBlock
            | ReferenceNodeType::EmbeddedEntryInline
            | ReferenceNodeType::EntryHyperlink => RecordKind::Entry,
            ReferenceNodeType::EmbeddedAssetBlock | ReferenceNodeType::AssetHyperlink => {
                RecordKind::Asset
            }
        }
    }
}

impl fmt::Display for ReferenceNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when the node type is one of the reference-carrying kinds.
pub fn is_reference_node_type(node_type: &str) -> bool {
    ReferenceNodeType::from_node_type(node_type).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_kind() {
        let entry = json!({"sys": {"id": "e1", "type": "Entry"}});
        let asset = json!({"sys": {"id": "a1", "type": "Asset"}});
        let link = json!({"sys": {"id": "e1", "type": "Link", "linkType": "Entry"}});

        assert_eq!(record_kind(&entry), Some(RecordKind::Entry));
        assert_eq!(record_kind(&asset), Some(RecordKind::Asset));
        assert_eq!(record_kind(&link), None);
        assert!(is_entry_reference(&entry));
        assert!(!is_entry_reference(&asset));
        assert!(is_asset_reference(&asset));
    }

    #[test]
    fn test_plain_values_are_not_references() {
        for value in [
            json!("Entry"),
            json!(42),
            json!(null),
            json!(["Entry"]),
            json!({"type": "Entry"}),
            json!({"sys": "Entry"}),
            json!({"sys": {"type": 7}}),
        ] {
            assert_eq!(record_kind(&value), None, "{} is not a record", value);
        }
    }

    #[test]
    fn test_link_target() {
        let link = json!({"sys": {"id": "e1", "type": "Link", "linkType": "Entry"}});
        assert_eq!(link_target(&link), Some((RecordKind::Entry, "e1")));

        let asset_link = json!({"sys": {"id": "a1", "type": "Link", "linkType": "Asset"}});
        assert_eq!(link_target(&asset_link), Some((RecordKind::Asset, "a1")));

        let tag_link = json!({"sys": {"id": "t1", "type": "Link", "linkType": "Tag"}});
        assert_eq!(link_target(&tag_link), None);

        let entry = json!({"sys": {"id": "e1", "type": "Entry"}});
        assert_eq!(link_target(&entry), None);
    }

    #[test]
    fn test_reference_node_types() {
        for node_type in ReferenceNodeType::ALL {
            assert_eq!(
                ReferenceNodeType::from_node_type(node_type.as_str()),
                Some(node_type)
            );
        }

        assert_eq!(
            ReferenceNodeType::EmbeddedEntryInline.target_kind(),
            RecordKind::Entry
        );
        assert_eq!(
            ReferenceNodeType::EntryHyperlink.target_kind(),
            RecordKind::Entry
        );
        assert_eq!(
            ReferenceNodeType::AssetHyperlink.target_kind(),
            RecordKind::Asset
        );

        assert!(!is_reference_node_type("paragraph"));
        assert!(!is_reference_node_type("hyperlink"));
        assert!(!is_reference_node_type("embedded-resource-block"));
        assert!(is_reference_node_type("embedded-asset-block"));
    }
}
