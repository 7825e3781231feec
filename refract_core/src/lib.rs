//! # Refract Core
//!
//! A locale-aware resolver for content graphs.
//!
//! Content records (entries and assets) reference one another and key every
//! field value by locale. This library turns any record, or any rich text
//! document embedding records, into a single-locale snapshot with every
//! nested reference expanded, and terminates on cyclic reference graphs.
//!
//! ## Features
//!
//! - Schema-driven locale handling: localized fields go through a locale
//!   selector, non-localized fields read the default locale
//! - Path-scoped cycle detection: an entry already being resolved on the
//!   current path is left as an unresolved reference
//! - Rich text walking: embedded entries, assets and hyperlinks are resolved
//!   in place, unknown node types pass through
//! - Link stitching, locale fallback chains, BLAKE3 digests and export loading
//!
//! ## Example
//!
//! ```no_run
//! use refract_core::{ContentExport, Resolver, ResolveConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load a content export
//! let export = ContentExport::load("./space.json")?;
//! let schemas = export.schema_index();
//!
//! // Settle the locale settings and build a selector
//! let config = ResolveConfig {
//!     locale: Some("fr".to_string()),
//!     ..Default::default()
//! };
//! let settings = config.locale_settings(&export)?;
//! let selector = settings.selector(&export);
//!
//! // Resolve an entry
//! let resolver = Resolver::new(&schemas, &selector, &settings.default_locale);
//! if let Some(entry) = export.entry("home") {
//!     let resolved = resolver.resolve_entry(entry)?;
//!     println!("{}", serde_json::to_string_pretty(&resolved)?);
//! }
//! # Ok(())
//! # }
//! ```

mod classify;
mod config;
mod digest;
mod document;
mod error;
mod export;
mod links;
mod locale;
mod record;
mod resolve;
mod schema;

pub use classify::{
    ReferenceNodeType, is_asset_reference, is_entry_reference, is_reference_node_type,
    link_target, record_kind,
};
pub use config::{CONFIG_FILE, LocaleSettings, ResolveConfig};
pub use digest::Digest;
pub use document::{ContainerClass, RichTextNode};
pub use error::{Error, Result};
pub use export::ContentExport;
pub use links::{LinkIndex, normalize_id};
pub use locale::{ExactLocale, FallbackSelector, Locale, LocaleError, LocaleSelector};
pub use record::{
    LinkSys, LocaleMap, RawRecord, RawValue, RecordKind, ResolvedRecord, ResolvedValue, Sys,
    SysLink,
};
pub use resolve::{Resolver, Visited, resolve_asset, resolve_document, resolve_entry};
pub use schema::{ContentTypeSchema, ContentTypes, FieldDescriptor, SchemaIndex};
