mod output;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use output::{LocaleInfo, LocalesOutput, OutputWriter, ResolveOutput};
use refract_core::{
    CONFIG_FILE, ContentExport, Digest, FallbackSelector, LinkIndex, LocaleSettings,
    RawRecord, ResolveConfig, Resolver, RichTextNode,
};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Refract - resolve localized content graphs into single-locale snapshots
#[derive(Parser)]
#[command(name = "refract")]
#[command(about = "Resolve entries, assets and rich text documents for one locale", long_about = None)]
#[command(version)]
struct Cli {
    /// Content export file or directory (defaults to REFRACT_EXPORT env var or refract.conf)
    #[arg(short, long, global = true, env = "REFRACT_EXPORT")]
    export: Option<PathBuf>,

    /// Locale to resolve for (defaults to the default locale)
    #[arg(short, long, global = true, env = "REFRACT_LOCALE")]
    locale: Option<String>,

    /// Locale non-localized fields are read from (defaults to the export's default locale)
    #[arg(long, global = true)]
    default_locale: Option<String>,

    /// Fail when a localized field has no value along the fallback chain
    /// (`--strict-locales=false` overrides a config file that enables it)
    #[arg(
        long,
        global = true,
        env = "REFRACT_STRICT_LOCALES",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    strict_locales: Option<bool>,

    /// Config file (defaults to ./refract.conf when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the resolved snapshot to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Print the BLAKE3 digest of the resolved snapshot
    #[arg(long, global = true)]
    digest: bool,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an entry and everything it references
    Entry {
        /// Entry id
        id: String,
    },

    /// Resolve an asset
    Asset {
        /// Asset id
        id: String,
    },

    /// Resolve the records embedded in a rich text document
    Document {
        /// Document JSON file (reads stdin if omitted or "-")
        file: Option<PathBuf>,

        /// JSON array of referenced records to stitch into link placeholders
        #[arg(long)]
        references: Option<PathBuf>,
    },

    /// List the export's locales and their fallback chains
    Locales,
}

/// Exit codes for failed runs.
mod result_code {
    pub const ERROR: u8 = 1;
    pub const RESOLUTION: u8 = 2;
    pub const INVALID_INPUT: u8 = 3;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = OutputWriter::new(cli.json);
    match run(&cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = result_code_for(&err);
            output.write_error(&err, code);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("refract={level},refract_core={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn result_code_for(err: &anyhow::Error) -> u8 {
    use refract_core::Error;

    match err.downcast_ref::<Error>() {
        Some(
            Error::SchemaNotFound { .. }
            | Error::UnknownField { .. }
            | Error::LocaleResolution { .. },
        ) => result_code::RESOLUTION,
        Some(
            Error::InvalidRecord { .. }
            | Error::InvalidNode { .. }
            | Error::InvalidExport { .. }
            | Error::InvalidConfig { .. }
            | Error::Json { .. },
        ) => result_code::INVALID_INPUT,
        _ => result_code::ERROR,
    }
}

fn run(cli: &Cli, output: &OutputWriter) -> Result<()> {
    // Settings precedence: CLI flag > env var (via clap) > config file > export defaults
    let config = load_config(cli.config.as_deref())?.merge(flag_config(cli));
    debug!(?config, "effective configuration");

    let export_path = config.export.clone().ok_or_else(|| {
        anyhow!(
            "No content export given (use --export, REFRACT_EXPORT or {})",
            CONFIG_FILE
        )
    })?;
    let export = ContentExport::load(&export_path)
        .with_context(|| format!("Failed to load export from {}", export_path.display()))?;

    match &cli.command {
        Commands::Locales => cmd_locales(&config, &export, output),
        command => cmd_resolve(cli, command, &config, &export, output),
    }
}

fn cmd_resolve(
    cli: &Cli,
    command: &Commands,
    config: &ResolveConfig,
    export: &ContentExport,
    output: &OutputWriter,
) -> Result<()> {
    let settings = config
        .locale_settings(export)
        .context("Failed to determine locale settings")?;
    let selector = settings.selector(export);
    let schemas = export.schema_index();
    let resolver = Resolver::new(&schemas, &selector, &settings.default_locale);

    match command {
        Commands::Entry { id } => {
            let entry = export
                .entry(id)
                .ok_or_else(|| anyhow!("Entry not found: {}", id))?;
            let resolved = resolver
                .resolve_entry(entry)
                .with_context(|| format!("Failed to resolve entry {}", id))?;
            emit(cli, output, "entry", Some(id), &settings, &resolved)
        }
        Commands::Asset { id } => {
            let asset = export
                .asset(id)
                .ok_or_else(|| anyhow!("Asset not found: {}", id))?;
            let resolved = resolver
                .resolve_asset(asset)
                .with_context(|| format!("Failed to resolve asset {}", id))?;
            emit(cli, output, "asset", Some(id), &settings, &resolved)
        }
        Commands::Document { file, references } => {
            let raw = read_document(file.as_deref())?;
            let root = match references {
                Some(path) => {
                    let index = load_references(path)?;
                    debug!(references = index.len(), "stitching document links");
                    index.stitch_document(&raw)
                }
                None => RichTextNode::<RawRecord>::from_json(&raw),
            }
            .context("Failed to parse rich text document")?;

            let resolved = resolver
                .resolve_document(&root)
                .context("Failed to resolve document")?;
            emit(cli, output, "document", None, &settings, &resolved)
        }
        Commands::Locales => cmd_locales(config, export, output),
    }
}

/// Read `--config`, or `./refract.conf` when it exists.
fn load_config(path: Option<&Path>) -> Result<ResolveConfig> {
    match path {
        Some(path) => ResolveConfig::load(path)
            .with_context(|| format!("Failed to read config file {}", path.display())),
        None => {
            let default = Path::new(CONFIG_FILE);
            if default.is_file() {
                ResolveConfig::load(default)
                    .with_context(|| format!("Failed to read config file {}", CONFIG_FILE))
            } else {
                Ok(ResolveConfig::default())
            }
        }
    }
}

fn flag_config(cli: &Cli) -> ResolveConfig {
    ResolveConfig {
        export: cli.export.clone(),
        locale: cli.locale.clone(),
        default_locale: cli.default_locale.clone(),
        strict: cli.strict_locales,
    }
}

fn read_document(file: Option<&Path>) -> Result<Value> {
    let content = match file {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read document {}", path.display()))?,
        _ => {
            if atty::is(atty::Stream::Stdin) {
                anyhow::bail!(
                    "Refusing to read a document from an interactive terminal; pass a file or pipe JSON"
                );
            }
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read document from stdin")?;
            content
        }
    };

    serde_json::from_str(&content).context("Document is not valid JSON")
}

fn load_references(path: &Path) -> Result<LinkIndex> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read references {}", path.display()))?;
    let references: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("References in {} must be a JSON array", path.display()))?;
    LinkIndex::from_references(&references).context("Failed to index references")
}

fn emit<T: Serialize>(
    cli: &Cli,
    output: &OutputWriter,
    kind: &'static str,
    id: Option<&str>,
    settings: &LocaleSettings,
    resolved: &T,
) -> Result<()> {
    let value = serde_json::to_value(resolved)?;
    let digest = if cli.digest {
        Some(Digest::of_json(&value)?)
    } else {
        None
    };

    let written = match &cli.output {
        Some(path) => {
            write_atomic(path, &value)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    let pretty = serde_json::to_string_pretty(&value)?;
    let data = ResolveOutput {
        success: true,
        result_code: 0,
        kind,
        id: id.map(str::to_string),
        locale: settings.locale.clone(),
        digest,
        output: written.clone(),
        result: if written.is_none() { Some(&value) } else { None },
    };

    output.write(&data, || match (written, digest) {
        (Some(path), Some(digest)) => format!("Wrote {}\n{}\n", path, digest),
        (Some(path), None) => format!("Wrote {}\n", path),
        (None, Some(digest)) => format!("{}\n", digest),
        (None, None) => format!("{}\n", pretty),
    })
}

/// Write JSON to `path` through a temp file in the same directory.
fn write_atomic(path: &Path, value: &Value) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut temp_file, value)?;
    temp_file.write_all(b"\n")?;
    temp_file.flush()?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn cmd_locales(config: &ResolveConfig, export: &ContentExport, output: &OutputWriter) -> Result<()> {
    let default_locale = config
        .default_locale
        .clone()
        .or_else(|| export.default_locale().map(str::to_string));

    let locales: Vec<LocaleInfo> = export
        .locales
        .iter()
        .map(|locale| LocaleInfo {
            code: locale.code.clone(),
            name: locale.name.clone(),
            default: default_locale.as_deref() == Some(locale.code.as_str()),
            fallback_chain: FallbackSelector::new(locale.code.clone(), &export.locales)
                .chain()
                .to_vec(),
        })
        .collect();

    let data = LocalesOutput {
        success: true,
        result_code: 0,
        default_locale,
        locales: locales.clone(),
    };

    output.write(&data, || {
        if locales.is_empty() {
            return "No locales declared\n".to_string();
        }
        let mut text = String::new();
        for locale in &locales {
            text.push_str(&locale.fallback_chain.join(" -> "));
            if locale.default {
                text.push_str(" (default)");
            }
            text.push('\n');
        }
        text
    })
}
