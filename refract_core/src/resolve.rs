//! Locale resolution of entries, assets and rich text documents.
//!
//! Resolution walks the reference graph depth-first. Entries currently being
//! resolved on the active path are tracked in a [`Visited`] set; meeting one
//! of them again ends that branch with the unresolved reference instead of
//! recursing forever. The same entry on two disjoint paths is expanded on
//! both.

use crate::classify::ReferenceNodeType;
use crate::document::RichTextNode;
use crate::error::{Error, Result};
use crate::locale::LocaleSelector;
use crate::record::{RawRecord, RawValue, RecordKind, ResolvedRecord, ResolvedValue};
use crate::schema::SchemaIndex;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

/// Ids of the entries on the active resolution path.
///
/// One set belongs to one top-level call and is never shared between calls.
#[derive(Debug, Clone, Default)]
pub struct Visited {
    path: HashSet<String>,
}

impl Visited {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the entry is being resolved further up the path.
    pub fn contains(&self, id: &str) -> bool {
        self.path.contains(id)
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Put an entry on the path. Returns false if it already was.
    fn enter(&mut self, id: &str) -> bool {
        self.path.insert(id.to_string())
    }

    fn leave(&mut self, id: &str) {
        self.path.remove(id);
    }
}

/// Resolves records and documents for one locale.
///
/// Holds only borrowed, read-only context, so one resolver can serve any
/// number of top-level calls; each call gets its own [`Visited`] set.
pub struct Resolver<'a, S: ?Sized, L: ?Sized> {
    schemas: &'a S,
    selector: &'a L,
    default_locale: &'a str,
}

impl<S: ?Sized, L: ?Sized> Clone for Resolver<'_, S, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized, L: ?Sized> Copy for Resolver<'_, S, L> {}

impl<'a, S, L> Resolver<'a, S, L>
where
    S: SchemaIndex + ?Sized,
    L: LocaleSelector + ?Sized,
{
    /// Create a resolver.
    ///
    /// `default_locale` is the key non-localized fields are stored under.
    pub fn new(schemas: &'a S, selector: &'a L, default_locale: &'a str) -> Self {
        Self {
            schemas,
            selector,
            default_locale,
        }
    }

    /// The locale values are selected for.
    pub fn locale(&self) -> &str {
        self.selector.locale()
    }

    /// The key non-localized fields are read from.
    pub fn default_locale(&self) -> &str {
        self.default_locale
    }

    /// Resolve every field of an entry, expanding nested references.
    pub fn resolve_entry(&self, entry: &RawRecord) -> Result<ResolvedRecord> {
        debug!(
            entry = entry.id(),
            locale = self.locale(),
            "resolving entry"
        );
        let mut visited = Visited::new();
        self.enter_entry(entry, &mut visited)
    }

    /// Resolve every field of an asset. Assets never expand references.
    pub fn resolve_asset(&self, asset: &RawRecord) -> Result<ResolvedRecord> {
        resolve_asset(asset, self.selector)
    }

    /// Resolve an entry or an asset according to its kind.
    pub fn resolve_record(&self, record: &RawRecord) -> Result<ResolvedRecord> {
        match record.kind() {
            RecordKind::Entry => self.resolve_entry(record),
            RecordKind::Asset => self.resolve_asset(record),
        }
    }

    /// Resolve the targets of every reference node in a rich text tree.
    ///
    /// One visited set spans the whole tree. Nodes without targets are
    /// rebuilt unchanged.
    pub fn resolve_document(
        &self,
        root: &RichTextNode<RawRecord>,
    ) -> Result<RichTextNode<ResolvedRecord>> {
        debug!(
            node_type = root.node_type(),
            locale = self.locale(),
            "resolving document"
        );
        let mut visited = Visited::new();
        root.try_map_targets(&mut |node_type: ReferenceNodeType, target: &RawRecord| {
            match node_type.target_kind() {
                RecordKind::Entry => self.enter_entry(target, &mut visited),
                RecordKind::Asset => self.resolve_asset(target),
            }
        })
    }

    /// Resolve one already locale-selected field value.
    ///
    /// Entries on the visited path come back as [`ResolvedValue::Unresolved`];
    /// lists resolve element by element; scalars are returned unchanged.
    pub fn resolve_field(&self, value: &RawValue, visited: &mut Visited) -> Result<ResolvedValue> {
        match value {
            RawValue::Entry(entry) => {
                if visited.contains(entry.id()) {
                    trace!(entry = entry.id(), "entry already on path, not expanding");
                    return Ok(ResolvedValue::Unresolved(entry.clone()));
                }
                let resolved = self.enter_entry(entry, visited)?;
                Ok(ResolvedValue::Record(Box::new(resolved)))
            }
            RawValue::Asset(asset) => {
                let resolved = self.resolve_asset(asset)?;
                Ok(ResolvedValue::Record(Box::new(resolved)))
            }
            RawValue::Array(items) => items
                .iter()
                .map(|item| self.resolve_field(item, visited))
                .collect::<Result<Vec<_>>>()
                .map(ResolvedValue::Array),
            RawValue::Scalar(value) => Ok(ResolvedValue::Scalar(value.clone())),
        }
    }

    /// Resolve an entry's fields with the entry on the path for the duration.
    fn enter_entry(&self, entry: &RawRecord, visited: &mut Visited) -> Result<ResolvedRecord> {
        let entered = visited.enter(entry.id());
        let result = self.resolve_entry_fields(entry, visited);
        if entered {
            visited.leave(entry.id());
        }
        result
    }

    fn resolve_entry_fields(
        &self,
        entry: &RawRecord,
        visited: &mut Visited,
    ) -> Result<ResolvedRecord> {
        let content_type = entry.content_type_id().ok_or_else(|| {
            Error::invalid_record(format!("entry {} has no content type", entry.id()))
        })?;

        let schema = self
            .schemas
            .content_type(content_type)
            .ok_or_else(|| Error::schema_not_found(content_type, entry.id()))?;

        let mut fields = BTreeMap::new();
        for (name, locales) in &entry.fields {
            let descriptor = schema
                .field(name)
                .ok_or_else(|| Error::unknown_field(entry.id(), content_type, name))?;

            // Non-localized fields only ever carry the default locale key.
            let selected = if descriptor.localized {
                self.selector
                    .select(locales)
                    .map_err(|e| Error::locale_resolution(entry.id(), name, e))?
            } else {
                locales.get(self.default_locale)
            };

            let value = match selected {
                Some(value) => self.resolve_field(value, visited)?,
                None => ResolvedValue::null(),
            };
            fields.insert(name.clone(), value);
        }

        Ok(ResolvedRecord::from_raw_parts(entry, fields))
    }
}

/// Resolve an entry against a schema index for the selector's locale.
pub fn resolve_entry<S, L>(
    entry: &RawRecord,
    schemas: &S,
    selector: &L,
    default_locale: &str,
) -> Result<ResolvedRecord>
where
    S: SchemaIndex + ?Sized,
    L: LocaleSelector + ?Sized,
{
    Resolver::new(schemas, selector, default_locale).resolve_entry(entry)
}

/// Resolve an asset: every field goes through the selector, nothing recurses.
pub fn resolve_asset<L>(asset: &RawRecord, selector: &L) -> Result<ResolvedRecord>
where
    L: LocaleSelector + ?Sized,
{
    let mut fields = BTreeMap::new();
    for (name, locales) in &asset.fields {
        let selected = selector
            .select(locales)
            .map_err(|e| Error::locale_resolution(asset.id(), name, e))?;

        let value = selected
            .map(ResolvedValue::verbatim)
            .unwrap_or_else(ResolvedValue::null);
        fields.insert(name.clone(), value);
    }

    Ok(ResolvedRecord::from_raw_parts(asset, fields))
}

/// Resolve every reference node of a rich text tree.
pub fn resolve_document<S, L>(
    root: &RichTextNode<RawRecord>,
    schemas: &S,
    selector: &L,
    default_locale: &str,
) -> Result<RichTextNode<ResolvedRecord>>
where
    S: SchemaIndex + ?Sized,
    L: LocaleSelector + ?Sized,
{
    Resolver::new(schemas, selector, default_locale).resolve_document(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::{ExactLocale, LocaleError};
    use crate::record::{LocaleMap, Sys};
    use crate::schema::{ContentTypeSchema, ContentTypes, FieldDescriptor};
    use serde_json::{Value, json};

    fn schemas() -> ContentTypes {
        vec![
            ContentTypeSchema::new(
                "post",
                vec![
                    FieldDescriptor::new("title", true),
                    FieldDescriptor::new("slug", false),
                    FieldDescriptor::new("related", true),
                    FieldDescriptor::new("hero", false),
                ],
            ),
            ContentTypeSchema::new("person", vec![FieldDescriptor::new("name", false)]),
        ]
        .into_iter()
        .collect()
    }

    fn post(id: &str) -> RawRecord {
        RawRecord::new(Sys::entry(id, "post"))
    }

    fn entry_value(record: &RawRecord) -> RawValue {
        RawValue::Entry(Box::new(record.clone()))
    }

    fn scalar(value: Value) -> ResolvedValue {
        ResolvedValue::Scalar(value)
    }

    struct FailingSelector;

    impl LocaleSelector for FailingSelector {
        fn locale(&self) -> &str {
            "fr"
        }

        fn select<'a>(&self, _: &'a LocaleMap) -> std::result::Result<Option<&'a RawValue>, LocaleError> {
            Err(LocaleError::new("fr", "no fallback configured"))
        }
    }

    #[test]
    fn test_localized_and_non_localized_fields() {
        let entry = post("e1")
            .with_value("title", "en", json!("a"))
            .with_value("title", "fr", json!("b"))
            .with_value("slug", "en", json!("hello"))
            .with_value("slug", "fr", json!("ignored"));

        let types = schemas();
        let resolved = resolve_entry(&entry, &types, &ExactLocale::new("fr"), "en").unwrap();

        assert_eq!(resolved.id(), "e1");
        assert_eq!(resolved.field("title"), Some(&scalar(json!("b"))));
        assert_eq!(resolved.field("slug"), Some(&scalar(json!("hello"))));
    }

    #[test]
    fn test_missing_values_resolve_to_null() {
        let entry = post("e1")
            .with_value("title", "en", json!("a"))
            .with_value("slug", "fr", json!("only fr"));

        let types = schemas();
        let resolved = resolve_entry(&entry, &types, &ExactLocale::new("de"), "en").unwrap();

        assert_eq!(resolved.fields.len(), 2);
        assert_eq!(resolved.field("title"), Some(&ResolvedValue::null()));
        assert_eq!(resolved.field("slug"), Some(&ResolvedValue::null()));
    }

    #[test]
    fn test_two_entry_cycle() {
        let e1_stub = post("e1");
        let e2 = post("e2").with_value("related", "en", entry_value(&e1_stub));
        let e1 = post("e1").with_value("related", "en", entry_value(&e2));

        let types = schemas();
        let resolved = resolve_entry(&e1, &types, &ExactLocale::new("en"), "en").unwrap();

        let related = resolved.field("related").unwrap().as_record().unwrap();
        assert_eq!(related.id(), "e2");
        assert_eq!(
            related.field("related").unwrap().as_unresolved(),
            Some(&e1_stub)
        );

        assert_eq!(
            serde_json::to_value(&resolved).unwrap()["fields"]["related"]["fields"]["related"]
                ["sys"]["id"],
            json!("e1")
        );
    }

    #[test]
    fn test_cycle_through_bare_entry_stub() {
        let e1 = RawRecord::from_json(&json!({
            "sys": {"id": "e1", "type": "Entry", "contentType": {"sys": {"id": "post"}}},
            "fields": {"related": {"en": {
                "sys": {"id": "e2", "type": "Entry", "contentType": {"sys": {"id": "post"}}},
                "fields": {"related": {"en": {"sys": {"id": "e1", "type": "Entry"}}}}
            }}}
        }))
        .unwrap();

        let types = schemas();
        let resolved = resolve_entry(&e1, &types, &ExactLocale::new("en"), "en").unwrap();

        let e2 = resolved.field("related").unwrap().as_record().unwrap();
        assert_eq!(e2.id(), "e2");
        let stub = e2.field("related").unwrap().as_unresolved().unwrap();
        assert_eq!(stub.id(), "e1");
        assert_eq!(stub.content_type_id(), None);
    }

    #[test]
    fn test_expanding_entry_without_content_type_fails() {
        let entry = RawRecord::from_json(&json!({
            "sys": {"id": "e1", "type": "Entry", "contentType": {"sys": {"id": "post"}}},
            "fields": {"related": {"en": {"sys": {"id": "e9", "type": "Entry"}}}}
        }))
        .unwrap();

        let types = schemas();
        let err = resolve_entry(&entry, &types, &ExactLocale::new("en"), "en").unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }));
    }

    #[test]
    fn test_self_reference() {
        let stub = post("e1").with_value("title", "en", json!("stub"));
        let entry = post("e1")
            .with_value("title", "en", json!("root"))
            .with_value("related", "en", entry_value(&stub));

        let types = schemas();
        let resolved = resolve_entry(&entry, &types, &ExactLocale::new("en"), "en").unwrap();
        assert_eq!(
            resolved.field("related").unwrap().as_unresolved(),
            Some(&stub)
        );
    }

    #[test]
    fn test_disjoint_paths_both_expand() {
        let shared = post("shared").with_value("title", "en", json!("shared"));
        let entry = post("e1").with_value(
            "related",
            "en",
            RawValue::Array(vec![entry_value(&shared), entry_value(&shared)]),
        );

        let types = schemas();
        let resolved = resolve_entry(&entry, &types, &ExactLocale::new("en"), "en").unwrap();
        let items = resolved.field("related").unwrap().as_array().unwrap();

        assert_eq!(items.len(), 2);
        for item in items {
            let record = item.as_record().unwrap();
            assert_eq!(record.field("title"), Some(&scalar(json!("shared"))));
        }
    }

    #[test]
    fn test_array_order_preserved() {
        let asset = RawRecord::new(Sys::asset("a1")).with_value("title", "en", json!("Logo"));
        let entry = post("e1").with_value(
            "related",
            "en",
            RawValue::Array(vec![
                RawValue::Scalar(json!(1)),
                RawValue::Asset(Box::new(asset)),
                RawValue::Array(vec![]),
                RawValue::Scalar(json!("x")),
            ]),
        );

        let types = schemas();
        let resolved = resolve_entry(&entry, &types, &ExactLocale::new("en"), "en").unwrap();
        let items = resolved.field("related").unwrap().as_array().unwrap();

        assert_eq!(items.len(), 4);
        assert_eq!(items[0], scalar(json!(1)));
        assert_eq!(items[1].as_record().unwrap().id(), "a1");
        assert_eq!(items[2], ResolvedValue::Array(vec![]));
        assert_eq!(items[3], scalar(json!("x")));
    }

    #[test]
    fn test_schema_not_found() {
        let entry = RawRecord::new(Sys::entry("e1", "missing")).with_value("title", "en", json!("a"));
        let types = schemas();
        let err = resolve_entry(&entry, &types, &ExactLocale::new("en"), "en").unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaNotFound { ref content_type, ref entry } if content_type == "missing" && entry == "e1"
        ));
    }

    #[test]
    fn test_unknown_field() {
        let entry = post("e1").with_value("subtitle", "en", json!("a"));
        let types = schemas();
        let err = resolve_entry(&entry, &types, &ExactLocale::new("en"), "en").unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "subtitle"));
    }

    #[test]
    fn test_nested_schema_error_propagates() {
        let nested = RawRecord::new(Sys::entry("e2", "missing"));
        let entry = post("e1")
            .with_value("title", "en", json!("fine"))
            .with_value("related", "en", entry_value(&nested));

        let types = schemas();
        let err = resolve_entry(&entry, &types, &ExactLocale::new("en"), "en").unwrap_err();
        assert!(matches!(err, Error::SchemaNotFound { ref entry, .. } if entry == "e2"));
    }

    #[test]
    fn test_locale_error_propagates() {
        let entry = post("e1").with_value("title", "en", json!("a"));
        let types = schemas();
        let err = resolve_entry(&entry, &types, &FailingSelector, "en").unwrap_err();

        match err {
            Error::LocaleResolution {
                record,
                field,
                source,
            } => {
                assert_eq!(record, "e1");
                assert_eq!(field, "title");
                assert_eq!(source, LocaleError::new("fr", "no fallback configured"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_non_localized_field_bypasses_selector() {
        let entry = post("e1").with_value("slug", "en", json!("hello"));
        let types = schemas();
        let resolved = resolve_entry(&entry, &types, &FailingSelector, "en").unwrap();
        assert_eq!(resolved.field("slug"), Some(&scalar(json!("hello"))));
    }

    #[test]
    fn test_resolve_asset() {
        let asset = RawRecord::new(Sys::asset("a1"))
            .with_value("title", "en", json!("Logo"))
            .with_value("title", "fr", json!("Logo FR"));

        let resolved = resolve_asset(&asset, &ExactLocale::new("fr")).unwrap();
        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({"sys": {"id": "a1", "type": "Asset"}, "fields": {"title": "Logo FR"}})
        );
    }

    #[test]
    fn test_asset_does_not_recurse() {
        let nested = post("e1").with_value("title", "en", json!("a"));
        let asset = RawRecord::new(Sys::asset("a1")).with_value("related", "en", entry_value(&nested));

        let resolved = resolve_asset(&asset, &ExactLocale::new("en")).unwrap();
        assert_eq!(
            resolved.field("related").unwrap().as_unresolved(),
            Some(&nested)
        );
    }

    #[test]
    fn test_asset_locale_error() {
        let asset = RawRecord::new(Sys::asset("a1")).with_value("title", "en", json!("Logo"));
        assert!(matches!(
            resolve_asset(&asset, &FailingSelector),
            Err(Error::LocaleResolution { .. })
        ));
    }

    #[test]
    fn test_empty_records() {
        let types = schemas();
        let selector = ExactLocale::new("en");

        let entry = resolve_entry(&post("e1"), &types, &selector, "en").unwrap();
        assert!(entry.fields.is_empty());

        let asset = resolve_asset(&RawRecord::new(Sys::asset("a1")), &selector).unwrap();
        assert!(asset.fields.is_empty());
    }

    #[test]
    fn test_resolve_record_dispatches() {
        let types = schemas();
        let selector = ExactLocale::new("en");
        let resolver = Resolver::new(&types, &selector, "en");

        let asset = RawRecord::new(Sys::asset("a1")).with_value("title", "en", json!("Logo"));
        assert_eq!(resolver.resolve_record(&asset).unwrap().kind(), RecordKind::Asset);

        let entry = post("e1").with_value("title", "en", json!("a"));
        assert_eq!(resolver.resolve_record(&entry).unwrap().kind(), RecordKind::Entry);
    }

    #[test]
    fn test_visited_is_path_scoped() {
        let types = schemas();
        let selector = ExactLocale::new("en");
        let resolver = Resolver::new(&types, &selector, "en");

        let nested = post("e2").with_value("title", "en", json!("n"));
        let mut visited = Visited::new();
        let value = resolver
            .resolve_field(&entry_value(&nested), &mut visited)
            .unwrap();

        assert!(value.as_record().is_some());
        assert!(visited.is_empty());
    }

    #[test]
    fn test_resolve_field_short_circuits_visited() {
        let types = schemas();
        let selector = ExactLocale::new("en");
        let resolver = Resolver::new(&types, &selector, "en");

        let nested = post("e2");
        let mut visited = Visited::new();
        visited.enter("e2");

        let value = resolver
            .resolve_field(&entry_value(&nested), &mut visited)
            .unwrap();
        assert_eq!(value.as_unresolved(), Some(&nested));
        assert_eq!(visited.len(), 1);
    }

    fn document_with(targets: Vec<Value>) -> RichTextNode<RawRecord> {
        let content: Vec<Value> = targets
            .into_iter()
            .map(|target| {
                let node_type = if target["sys"]["type"] == "Asset" {
                    "embedded-asset-block"
                } else {
                    "embedded-entry-block"
                };
                json!({"nodeType": node_type, "data": {"target": target}, "content": []})
            })
            .collect();

        RichTextNode::from_json(&json!({"nodeType": "document", "data": {}, "content": content}))
            .unwrap()
    }

    #[test]
    fn test_resolve_document() {
        let document = document_with(vec![
            json!({
                "sys": {"id": "e1", "type": "Entry", "contentType": {"sys": {"id": "post"}}},
                "fields": {"title": {"en": "Hello", "fr": "Bonjour"}}
            }),
            json!({
                "sys": {"id": "a1", "type": "Asset"},
                "fields": {"title": {"en": "Logo", "fr": "Logo FR"}}
            }),
        ]);

        let types = schemas();
        let resolved =
            resolve_document(&document, &types, &ExactLocale::new("fr"), "en").unwrap();

        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({
                "nodeType": "document",
                "data": {},
                "content": [
                    {
                        "nodeType": "embedded-entry-block",
                        "data": {"target": {
                            "sys": {"id": "e1", "type": "Entry", "contentType": {"sys": {"id": "post"}}},
                            "fields": {"title": "Bonjour"}
                        }},
                        "content": []
                    },
                    {
                        "nodeType": "embedded-asset-block",
                        "data": {"target": {
                            "sys": {"id": "a1", "type": "Asset"},
                            "fields": {"title": "Logo FR"}
                        }},
                        "content": []
                    }
                ]
            })
        );
    }

    #[test]
    fn test_document_cycle_through_embedded_entry() {
        let document = document_with(vec![json!({
            "sys": {"id": "e1", "type": "Entry", "contentType": {"sys": {"id": "post"}}},
            "fields": {"related": {"en": {
                "sys": {"id": "e1", "type": "Entry", "contentType": {"sys": {"id": "post"}}},
                "fields": {}
            }}}
        })]);

        let types = schemas();
        let resolved =
            resolve_document(&document, &types, &ExactLocale::new("en"), "en").unwrap();
        let target = resolved.targets()[0];
        assert!(target.field("related").unwrap().as_unresolved().is_some());
    }

    #[test]
    fn test_document_pass_through() {
        let types = schemas();
        let selector = ExactLocale::new("en");

        let empty = RichTextNode::<RawRecord>::empty_document();
        let resolved = resolve_document(&empty, &types, &selector, "en").unwrap();
        assert_eq!(resolved, RichTextNode::<ResolvedRecord>::empty_document());

        let value = json!({
            "nodeType": "document",
            "data": {},
            "content": [{
                "nodeType": "paragraph",
                "data": {},
                "content": [{"nodeType": "text", "value": "plain", "marks": [], "data": {}}]
            }]
        });
        let document = RichTextNode::from_json(&value).unwrap();
        let resolved = resolve_document(&document, &types, &selector, "en").unwrap();
        assert_eq!(serde_json::to_value(&resolved).unwrap(), value);
    }

    #[test]
    fn test_document_keeps_node_members() {
        let value = json!({
            "nodeType": "document",
            "id": "doc",
            "content": [{
                "nodeType": "embedded-asset-block",
                "key": "k1",
                "data": {"target": {
                    "sys": {"id": "a1", "type": "Asset"},
                    "fields": {"title": {"en": "Logo", "fr": "Logo FR"}}
                }}
            }]
        });

        let document = RichTextNode::from_json(&value).unwrap();
        let types = schemas();
        let resolved =
            resolve_document(&document, &types, &ExactLocale::new("fr"), "en").unwrap();

        let mut expected = value.clone();
        expected["content"][0]["data"]["target"]["fields"] = json!({"title": "Logo FR"});
        assert_eq!(serde_json::to_value(&resolved).unwrap(), expected);
    }

    #[test]
    fn test_document_error_propagates() {
        let document = document_with(vec![json!({
            "sys": {"id": "e1", "type": "Entry", "contentType": {"sys": {"id": "missing"}}},
            "fields": {}
        })]);

        let types = schemas();
        let result = resolve_document(&document, &types, &ExactLocale::new("en"), "en");
        assert!(matches!(result, Err(Error::SchemaNotFound { .. })));
    }

    // Property-based tests
    use proptest::prelude::*;

    // Strategy for a graph of posts where every `related` field holds
    // references to arbitrary posts, nested `depth` levels deep.
    fn arb_graph() -> impl Strategy<Value = (Vec<Vec<usize>>, usize)> {
        (1usize..6).prop_flat_map(|size| {
            (
                prop::collection::vec(prop::collection::vec(0..size, 0..4), size),
                0..size,
            )
        })
    }

    // Materialize an adjacency list into nested raw records `depth` levels deep.
    fn build_post(edges: &[Vec<usize>], node: usize, depth: usize) -> RawRecord {
        let id = format!("e{}", node);
        let mut record = post(&id).with_value("title", "en", json!(id.clone()));
        if depth > 0 {
            let related = edges[node]
                .iter()
                .map(|&next| entry_value(&build_post(edges, next, depth - 1)))
                .collect();
            record = record.with_value("related", "en", RawValue::Array(related));
        }
        record
    }

    // No entry id appears twice along any root-to-leaf path of expanded records.
    fn assert_no_repeat(record: &ResolvedRecord, path: &mut Vec<String>) {
        assert!(!path.contains(&record.id().to_string()));
        path.push(record.id().to_string());
        if let Some(ResolvedValue::Array(items)) = record.field("related") {
            for item in items {
                match item {
                    ResolvedValue::Record(child) => assert_no_repeat(child, path),
                    ResolvedValue::Unresolved(child) => {
                        assert!(path.contains(&child.id().to_string()))
                    }
                    other => panic!("unexpected value: {:?}", other),
                }
            }
        }
        path.pop();
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            max_shrink_iters: 1000,
            ..ProptestConfig::default()
        })]

        /// Cycles never expand twice along one path, and the input is untouched.
        #[test]
        fn prop_cycle_safety_and_non_mutation((edges, root) in arb_graph()) {
            let entry = build_post(&edges, root, 4);
            let before = entry.clone();

            let types = schemas();
            let resolved = resolve_entry(&entry, &types, &ExactLocale::new("en"), "en")?;

            prop_assert_eq!(&entry, &before);
            assert_no_repeat(&resolved, &mut Vec::new());
        }

        /// Resolution is deterministic for identical inputs.
        #[test]
        fn prop_resolution_deterministic((edges, root) in arb_graph()) {
            let entry = build_post(&edges, root, 3);
            let types = schemas();
            let selector = ExactLocale::new("en");

            let first = resolve_entry(&entry, &types, &selector, "en")?;
            let second = resolve_entry(&entry, &types, &selector, "en")?;
            prop_assert_eq!(first, second);
        }

        /// Arrays keep their length and order.
        #[test]
        fn prop_array_homomorphism(items in prop::collection::vec(any::<i64>(), 0..32)) {
            let values = items.iter().map(|n| RawValue::Scalar(json!(n))).collect();
            let entry = post("e1").with_value("related", "en", RawValue::Array(values));

            let types = schemas();
            let resolved = resolve_entry(&entry, &types, &ExactLocale::new("en"), "en")?;
            let resolved_items = resolved.field("related").unwrap().as_array().unwrap();

            prop_assert_eq!(resolved_items.len(), items.len());
            for (resolved, original) in resolved_items.iter().zip(&items) {
                prop_assert_eq!(resolved, &scalar(json!(original)));
            }
        }
    }
}
