//! Content records and field values, raw and resolved.
//!
//! A raw record keys every field value by locale. A resolved record holds one
//! already-selected value per field, with nested references expanded.

use crate::classify;
use crate::error::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Field values of one field, keyed by locale code.
pub type LocaleMap = BTreeMap<String, RawValue>;

/// Discriminator carried in `sys.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    /// An entry of some content type.
    Entry,
    /// A binary asset.
    Asset,
}

impl RecordKind {
    /// Returns the `sys.type` string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Entry => "Entry",
            RecordKind::Asset => "Asset",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `sys` block of a link to another object, e.g. an entry's content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSys {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `{"sys": {...}}` wrapper around a [`LinkSys`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SysLink {
    pub sys: LinkSys,
}

impl SysLink {
    /// Link to the object with the given id.
    pub fn to(id: impl Into<String>) -> Self {
        Self {
            sys: LinkSys {
                id: id.into(),
                extra: Map::new(),
            },
        }
    }
}

/// System metadata of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    /// Record id.
    pub id: String,
    /// Entry or asset.
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Content type of an entry. Assets have none.
    #[serde(
        rename = "contentType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<SysLink>,
    /// Any other `sys` properties, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Sys {
    /// Metadata for an entry of the given content type.
    pub fn entry(id: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: RecordKind::Entry,
            content_type: Some(SysLink::to(content_type)),
            extra: Map::new(),
        }
    }

    /// Metadata for an asset.
    pub fn asset(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: RecordKind::Asset,
            content_type: None,
            extra: Map::new(),
        }
    }

    /// Id of the content type, if any.
    pub fn content_type_id(&self) -> Option<&str> {
        self.content_type.as_ref().map(|link| link.sys.id.as_str())
    }
}

/// A field value before locale selection.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Any JSON value that is not a list or a record.
    Scalar(Value),
    /// An ordered list of values.
    Array(Vec<RawValue>),
    /// A nested entry.
    Entry(Box<RawRecord>),
    /// A nested asset.
    Asset(Box<RawRecord>),
}

impl RawValue {
    /// Classify a JSON value into its raw field shape.
    pub fn from_json(value: &Value) -> Result<Self> {
        if let Value::Array(items) = value {
            let items = items
                .iter()
                .map(RawValue::from_json)
                .collect::<Result<Vec<_>>>()?;
            return Ok(RawValue::Array(items));
        }

        match classify::record_kind(value) {
            Some(RecordKind::Entry) => Ok(RawValue::Entry(Box::new(RawRecord::from_json(value)?))),
            Some(RecordKind::Asset) => Ok(RawValue::Asset(Box::new(RawRecord::from_json(value)?))),
            None => Ok(RawValue::Scalar(value.clone())),
        }
    }

    /// The kind of record this value references, if it is a reference.
    pub fn reference_kind(&self) -> Option<RecordKind> {
        match self {
            RawValue::Entry(_) => Some(RecordKind::Entry),
            RawValue::Asset(_) => Some(RecordKind::Asset),
            RawValue::Scalar(_) | RawValue::Array(_) => None,
        }
    }

    /// True when this value is an entry reference.
    pub fn is_entry_reference(&self) -> bool {
        self.reference_kind() == Some(RecordKind::Entry)
    }

    /// True when this value is an asset reference.
    pub fn is_asset_reference(&self) -> bool {
        self.reference_kind() == Some(RecordKind::Asset)
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        RawValue::Scalar(value)
    }
}

impl From<RawRecord> for RawValue {
    fn from(record: RawRecord) -> Self {
        match record.kind() {
            RecordKind::Entry => RawValue::Entry(Box::new(record)),
            RecordKind::Asset => RawValue::Asset(Box::new(record)),
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RawValue::Scalar(value) => value.serialize(serializer),
            RawValue::Array(items) => items.serialize(serializer),
            RawValue::Entry(record) | RawValue::Asset(record) => record.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RawValue::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// An entry or asset with locale-keyed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// System metadata.
    pub sys: Sys,
    /// Field name to locale-keyed values.
    pub fields: BTreeMap<String, LocaleMap>,
    /// Top-level properties other than `sys` and `fields`, kept verbatim.
    pub extra: Map<String, Value>,
}

impl RawRecord {
    /// Create a record with no fields.
    pub fn new(sys: Sys) -> Self {
        Self {
            sys,
            fields: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Builder-style helper adding one locale value to a field.
    pub fn with_value(
        mut self,
        field: impl Into<String>,
        locale: impl Into<String>,
        value: impl Into<RawValue>,
    ) -> Self {
        self.fields
            .entry(field.into())
            .or_default()
            .insert(locale.into(), value.into());
        self
    }

    /// Record id.
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Entry or asset.
    pub fn kind(&self) -> RecordKind {
        self.sys.kind
    }

    /// Content type id of an entry.
    pub fn content_type_id(&self) -> Option<&str> {
        self.sys.content_type_id()
    }

    /// Parse a record from its JSON form.
    ///
    /// Every field must be an object keyed by locale code. An entry may omit
    /// its content type; that only matters once the entry is expanded.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_record("expected a JSON object"))?;

        let sys_value = object
            .get("sys")
            .ok_or_else(|| Error::invalid_record("missing sys"))?;
        let sys = Sys::deserialize(sys_value)
            .map_err(|e| Error::invalid_record(format!("invalid sys: {}", e)))?;

        let mut fields = BTreeMap::new();
        match object.get("fields") {
            None | Some(Value::Null) => {}
            Some(Value::Object(raw_fields)) => {
                for (name, locales) in raw_fields {
                    let locales = locales.as_object().ok_or_else(|| {
                        Error::invalid_record(format!(
                            "field {} of {} is not keyed by locale",
                            name, sys.id
                        ))
                    })?;

                    let mut locale_map = LocaleMap::new();
                    for (code, value) in locales {
                        locale_map.insert(code.clone(), RawValue::from_json(value)?);
                    }
                    fields.insert(name.clone(), locale_map);
                }
            }
            Some(_) => {
                return Err(Error::invalid_record(format!(
                    "fields of {} must be an object",
                    sys.id
                )));
            }
        }

        let extra = object
            .iter()
            .filter(|(key, _)| key.as_str() != "sys" && key.as_str() != "fields")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self { sys, fields, extra })
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.extra.len() + 2))?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("sys", &self.sys)?;
        map.serialize_entry("fields", &self.fields)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RawRecord::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// A field value after locale selection.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    /// Any JSON value that is not a list or a record.
    Scalar(Value),
    /// An ordered list of resolved values.
    Array(Vec<ResolvedValue>),
    /// A fully resolved nested record.
    Record(Box<ResolvedRecord>),
    /// A reference left as-is, either because the entry is already being
    /// resolved further up the path or because it sits inside an asset.
    Unresolved(Box<RawRecord>),
}

impl ResolvedValue {
    /// JSON `null`, used when no value exists for the selected locale.
    pub fn null() -> Self {
        ResolvedValue::Scalar(Value::Null)
    }

    /// Copy a raw value without expanding any nested reference.
    pub fn verbatim(value: &RawValue) -> Self {
        match value {
            RawValue::Scalar(value) => ResolvedValue::Scalar(value.clone()),
            RawValue::Array(items) => {
                ResolvedValue::Array(items.iter().map(ResolvedValue::verbatim).collect())
            }
            RawValue::Entry(record) | RawValue::Asset(record) => {
                ResolvedValue::Unresolved(record.clone())
            }
        }
    }

    /// The scalar value, if this is one.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ResolvedValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// The list items, if this is a list.
    pub fn as_array(&self) -> Option<&[ResolvedValue]> {
        match self {
            ResolvedValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The resolved record, if this is one.
    pub fn as_record(&self) -> Option<&ResolvedRecord> {
        match self {
            ResolvedValue::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The unresolved reference, if this is one.
    pub fn as_unresolved(&self) -> Option<&RawRecord> {
        match self {
            ResolvedValue::Unresolved(record) => Some(record),
            _ => None,
        }
    }
}

impl Serialize for ResolvedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ResolvedValue::Scalar(value) => value.serialize(serializer),
            ResolvedValue::Array(items) => items.serialize(serializer),
            ResolvedValue::Record(record) => record.serialize(serializer),
            ResolvedValue::Unresolved(record) => record.serialize(serializer),
        }
    }
}

/// An entry or asset with one value per field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    /// System metadata, copied from the raw record.
    pub sys: Sys,
    /// Field name to resolved value.
    pub fields: BTreeMap<String, ResolvedValue>,
    /// Top-level properties other than `sys` and `fields`.
    pub extra: Map<String, Value>,
}

impl ResolvedRecord {
    /// Build a resolved record carrying the metadata of `raw`.
    pub(crate) fn from_raw_parts(raw: &RawRecord, fields: BTreeMap<String, ResolvedValue>) -> Self {
        Self {
            sys: raw.sys.clone(),
            fields,
            extra: raw.extra.clone(),
        }
    }

    /// Record id.
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Entry or asset.
    pub fn kind(&self) -> RecordKind {
        self.sys.kind
    }

    /// Resolved value of a field.
    pub fn field(&self, name: &str) -> Option<&ResolvedValue> {
        self.fields.get(name)
    }
}

impl Serialize for ResolvedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.extra.len() + 2))?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("sys", &self.sys)?;
        map.serialize_entry("fields", &self.fields)?;
        map.end()
    }
}
