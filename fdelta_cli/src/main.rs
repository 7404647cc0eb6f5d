use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fdelta_common::{load_config, ByteDivergence, DiffAlgorithm, EditOperation, Line};
use fdelta_core::{
    comparator_for, ComparatorSettings, ComparisonMode, ContentDiff, Encoding, FileComparison,
};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const SNIFF_LEN: u64 = 8192;

#[derive(Parser)]
#[command(name = "fdelta")]
#[command(author = "FDelta Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Line and byte level file content comparison", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two files line by line
    Text {
        original: PathBuf,
        revised: PathBuf,

        /// Charset for both files
        #[arg(short, long, value_parser = parse_encoding)]
        encoding: Option<Encoding>,

        /// Charset for the original file (overrides --encoding)
        #[arg(long, value_parser = parse_encoding)]
        original_encoding: Option<Encoding>,

        /// Charset for the revised file (overrides --encoding)
        #[arg(long, value_parser = parse_encoding)]
        revised_encoding: Option<Encoding>,

        /// Diff algorithm
        #[arg(short, long, value_enum)]
        algorithm: Option<AlgorithmArg>,

        /// Treat CR, LF and CRLF terminators as different
        #[arg(long)]
        strict_line_endings: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two files byte by byte
    Binary {
        original: PathBuf,
        revised: PathBuf,

        /// Read buffer size in bytes
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a file has the same content as an expected file
    Files {
        actual: PathBuf,
        expected: PathBuf,

        /// Charset for both files
        #[arg(short, long, value_parser = parse_encoding)]
        encoding: Option<Encoding>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pick text or binary mode from the file contents
    Auto {
        original: PathBuf,
        revised: PathBuf,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Myers,
    Patience,
    Lcs,
}

impl From<AlgorithmArg> for DiffAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Myers => DiffAlgorithm::Myers,
            AlgorithmArg::Patience => DiffAlgorithm::Patience,
            AlgorithmArg::Lcs => DiffAlgorithm::Lcs,
        }
    }
}

fn parse_encoding(value: &str) -> std::result::Result<Encoding, String> {
    Encoding::from_str(value).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    let loaded = load_config(cli.config.as_deref());

    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    let fallback_filter = loaded
        .as_ref()
        .ok()
        .and_then(|l| l.config.log_filter.clone())
        .unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_filter)),
        )
        .init();

    let outcome = loaded
        .context("Failed to load configuration")
        .and_then(|loaded| {
            debug!(
                "Using configuration from {} (exists: {})",
                loaded.path.display(),
                loaded.exists
            );
            let settings = ComparatorSettings::from_config(&loaded.config.compare)
                .context("Invalid comparison settings")?;
            run(cli.command, settings, &loaded.config.compare)
        });

    match outcome {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("fdelta: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Run a subcommand; `Ok(true)` means the inputs are equivalent
fn run(
    command: Commands,
    mut settings: ComparatorSettings,
    compare: &fdelta_common::CompareConfig,
) -> Result<bool> {
    match command {
        Commands::Text {
            original,
            revised,
            encoding,
            original_encoding,
            revised_encoding,
            algorithm,
            strict_line_endings,
            json,
        } => {
            if let Some(encoding) = encoding {
                settings.original_encoding = encoding;
                settings.revised_encoding = encoding;
            }
            if let Some(encoding) = original_encoding {
                settings.original_encoding = encoding;
            }
            if let Some(encoding) = revised_encoding {
                settings.revised_encoding = encoding;
            }
            if let Some(algorithm) = algorithm {
                settings.line_diff.algorithm = algorithm.into();
            }
            if strict_line_endings {
                settings.line_diff.line_endings = fdelta_common::LineEndingPolicy::Strict;
            }
            let diff = compare_with_mode(ComparisonMode::Text, &settings, &original, &revised)?;
            emit(&original, &revised, ComparisonMode::Text, &diff, json)
        }
        Commands::Binary {
            original,
            revised,
            chunk_size,
            json,
        } => {
            if let Some(chunk_size) = chunk_size {
                settings.chunk_size = chunk_size;
            }
            let diff = compare_with_mode(ComparisonMode::Binary, &settings, &original, &revised)?;
            emit(&original, &revised, ComparisonMode::Binary, &diff, json)
        }
        Commands::Files {
            actual,
            expected,
            encoding,
            json,
        } => {
            let encoding = encoding.unwrap_or(settings.original_encoding);
            let files = FileComparison::from_config(compare)?;
            let diff = files.same_content_as(&actual, encoding, &expected, encoding)?;
            let mode = match diff {
                ContentDiff::Lines(_) => ComparisonMode::Text,
                ContentDiff::Bytes(_) => ComparisonMode::Binary,
            };
            emit(&actual, &expected, mode, &diff, json)
        }
        Commands::Auto {
            original,
            revised,
            json,
        } => {
            let mode = match (sniff_file(&original)?, sniff_file(&revised)?) {
                (ComparisonMode::Text, ComparisonMode::Text) => ComparisonMode::Text,
                _ => ComparisonMode::Binary,
            };
            info!("Auto-selected {:?} comparison", mode);
            let diff = compare_with_mode(mode, &settings, &original, &revised)?;
            emit(&original, &revised, mode, &diff, json)
        }
    }
}

fn compare_with_mode(
    mode: ComparisonMode,
    settings: &ComparatorSettings,
    original: &Path,
    revised: &Path,
) -> Result<ContentDiff> {
    let comparator = comparator_for(mode, settings)?;
    let mut original_file = File::open(original)
        .with_context(|| format!("Original path is not readable: {}", original.display()))?;
    let mut revised_file = File::open(revised)
        .with_context(|| format!("Revised path is not readable: {}", revised.display()))?;

    info!("Comparing {} with {}", original.display(), revised.display());
    let diff = comparator.compare_readers(&mut original_file, &mut revised_file)?;
    Ok(diff)
}

fn sniff_file(path: &Path) -> Result<ComparisonMode> {
    let file = File::open(path)
        .with_context(|| format!("Path is not readable: {}", path.display()))?;
    let mut prefix = Vec::new();
    file.take(SNIFF_LEN)
        .read_to_end(&mut prefix)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ComparisonMode::sniff(&prefix))
}

fn emit(
    original: &Path,
    revised: &Path,
    mode: ComparisonMode,
    diff: &ContentDiff,
    json: bool,
) -> Result<bool> {
    let equivalent = diff.is_equivalent();

    if json {
        let report = JsonReport {
            original: original.display().to_string(),
            revised: revised.display().to_string(),
            mode,
            equivalent,
            diff,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in render(diff) {
            println!("{line}");
        }
    }

    Ok(equivalent)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    original: String,
    revised: String,
    mode: ComparisonMode,
    equivalent: bool,
    diff: &'a ContentDiff,
}

/// Human-readable lines for a comparison result.
/// "expected" is the revised side and "was" the original side.
fn render(diff: &ContentDiff) -> Vec<String> {
    match diff {
        ContentDiff::Lines(script) if script.is_equivalent() => {
            vec!["Content is equivalent".to_string()]
        }
        ContentDiff::Lines(script) => {
            let mut out: Vec<String> = script.iter().map(render_operation).collect();
            let (removed, added) = script.line_counts();
            out.push(format!(
                "{} difference(s): {} line(s) removed, {} line(s) added",
                script.len(),
                removed,
                added
            ));
            out
        }
        ContentDiff::Bytes(ByteDivergence::Identical) => vec!["Content is identical".to_string()],
        ContentDiff::Bytes(ByteDivergence::DiffersAt {
            offset,
            original,
            revised,
        }) => vec![format!(
            "binary content differs at offset {}, expecting: {} but was: {}",
            offset, revised, original
        )],
    }
}

fn render_operation(op: &EditOperation) -> String {
    match op {
        EditOperation::Change { original, revised } => format!(
            "{}: expected {}, was {}",
            line_label(original.position, original.len()),
            quote_lines(&revised.lines),
            quote_lines(&original.lines)
        ),
        EditOperation::Delete { original, .. } => format!(
            "{}: unexpected {}",
            line_label(original.position, original.len()),
            quote_lines(&original.lines)
        ),
        EditOperation::Insert { revised, .. } => format!(
            "{}: missing {}",
            line_label(revised.position, revised.len()),
            quote_lines(&revised.lines)
        ),
    }
}

fn line_label(position: usize, len: usize) -> String {
    if len <= 1 {
        format!("line {}", position + 1)
    } else {
        format!("lines {}-{}", position + 1, position + len)
    }
}

fn quote_lines(lines: &[Line]) -> String {
    match lines {
        [single] => format!("{:?}", single.content()),
        _ => {
            let quoted: Vec<String> = lines.iter().map(|l| format!("{:?}", l.content())).collect();
            format!("[{}]", quoted.join(", "))
        }
    }
}
