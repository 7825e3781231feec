//! Loading content exports from disk.
//!
//! An export is a JSON object with optional `contentTypes`, `entries`,
//! `assets` and `locales` arrays. It may be a single file, a
//! zstd-compressed file (`.zst`), or a directory of such fragments which are
//! merged in path order.

use crate::error::{Error, Result};
use crate::locale::{self, Locale};
use crate::record::RawRecord;
use crate::schema::{ContentTypeSchema, ContentTypes};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Content types, records and locales of one content space.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentExport {
    #[serde(default)]
    pub content_types: Vec<ContentTypeSchema>,
    #[serde(default)]
    pub entries: Vec<RawRecord>,
    #[serde(default)]
    pub assets: Vec<RawRecord>,
    #[serde(default)]
    pub locales: Vec<Locale>,
}

impl ContentExport {
    /// Load an export file or directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::invalid_export(path, "path does not exist"));
        }

        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Self::load_file(path)
        }
    }

    /// Parse an export from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Load a single export file, decompressing `.zst` files.
    fn load_file(path: &Path) -> Result<Self> {
        let raw = fs::read(path)?;
        let bytes = if is_compressed(path) {
            zstd::stream::decode_all(raw.as_slice())
                .map_err(|e| Error::invalid_export(path, format!("zstd: {}", e)))?
        } else {
            raw
        };

        let export: ContentExport = serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_export(path, e.to_string()))?;

        debug!(
            path = %path.display(),
            content_types = export.content_types.len(),
            entries = export.entries.len(),
            assets = export.assets.len(),
            "loaded export"
        );
        Ok(export)
    }

    /// Load and merge every export fragment below a directory.
    fn load_dir(root: &Path) -> Result<Self> {
        let walker = ignore::WalkBuilder::new(root)
            .hidden(false) // Include hidden files
            .git_ignore(true) // Respect .gitignore
            .build();

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_export_fragment(path) {
                paths.push(path.to_path_buf());
            }
        }

        // Sort for deterministic merge order
        paths.sort();

        let mut export = ContentExport::default();
        for path in paths {
            let fragment = Self::load_file(&path)?;
            if fragment.is_empty() {
                warn!(path = %path.display(), "export fragment contains no content");
                continue;
            }
            export.merge(fragment);
        }

        Ok(export)
    }

    /// Append another export's content to this one.
    pub fn merge(&mut self, other: ContentExport) {
        self.content_types.extend(other.content_types);
        self.entries.extend(other.entries);
        self.assets.extend(other.assets);
        self.locales.extend(other.locales);
    }

    /// True when the export holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.content_types.is_empty()
            && self.entries.is_empty()
            && self.assets.is_empty()
            && self.locales.is_empty()
    }

    /// Find an entry by id.
    pub fn entry(&self, id: &str) -> Option<&RawRecord> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Find an asset by id.
    pub fn asset(&self, id: &str) -> Option<&RawRecord> {
        self.assets.iter().find(|asset| asset.id() == id)
    }

    /// The space's default locale code.
    pub fn default_locale(&self) -> Option<&str> {
        locale::default_locale(&self.locales).map(|locale| locale.code.as_str())
    }

    /// Index the content types by id.
    pub fn schema_index(&self) -> ContentTypes {
        self.content_types.iter().cloned().collect()
    }
}

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zst")
}

fn is_export_fragment(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    name.ends_with(".json") || name.ends_with(".json.zst")
}
