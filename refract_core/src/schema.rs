//! Content type schemas and the schema index.

use crate::record::LinkSys;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::HashMap;

/// Declaration of one field of a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field id, as used for the key in a record's `fields`.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    /// Whether values are stored per locale.
    #[serde(default)]
    pub localized: bool,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, localized: bool) -> Self {
        Self {
            id: id.into(),
            name: None,
            field_type: None,
            localized,
        }
    }
}

/// The field layout of one content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ContentTypeJson", into = "ContentTypeJson")]
pub struct ContentTypeSchema {
    pub id: String,
    pub name: Option<String>,
    pub display_field: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl ContentTypeSchema {
    pub fn new(id: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            id: id.into(),
            name: None,
            display_field: None,
            fields,
        }
    }

    /// Look up a field descriptor by id.
    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.id == id)
    }
}

/// Wire shape of a content type: the id lives in `sys.id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentTypeJson {
    sys: LinkSys,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_field: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDescriptor>,
}

impl From<ContentTypeJson> for ContentTypeSchema {
    fn from(json: ContentTypeJson) -> Self {
        Self {
            id: json.sys.id,
            name: json.name,
            display_field: json.display_field,
            fields: json.fields,
        }
    }
}

impl From<ContentTypeSchema> for ContentTypeJson {
    fn from(schema: ContentTypeSchema) -> Self {
        Self {
            sys: LinkSys {
                id: schema.id,
                extra: Map::new(),
            },
            name: schema.name,
            display_field: schema.display_field,
            fields: schema.fields,
        }
    }
}

/// Read-only lookup from content type id to its schema.
pub trait SchemaIndex {
    fn content_type(&self, id: &str) -> Option<&ContentTypeSchema>;
}

impl SchemaIndex for HashMap<String, ContentTypeSchema> {
    fn content_type(&self, id: &str) -> Option<&ContentTypeSchema> {
        self.get(id)
    }
}

/// Content type schemas keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    by_id: HashMap<String, ContentTypeSchema>,
}

impl ContentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema, replacing any previous schema with the same id.
    pub fn insert(&mut self, schema: ContentTypeSchema) {
        self.by_id.insert(schema.id.clone(), schema);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FromIterator<ContentTypeSchema> for ContentTypes {
    fn from_iter<I: IntoIterator<Item = ContentTypeSchema>>(iter: I) -> Self {
        let mut types = ContentTypes::new();
        for schema in iter {
            types.insert(schema);
        }
        types
    }
}

impl SchemaIndex for ContentTypes {
    fn content_type(&self, id: &str) -> Option<&ContentTypeSchema> {
        self.by_id.get(id)
    }
}
