// form26as CLI - extract tax-credit records from annual tax statements

mod exit_codes;
mod export;
mod parse;
mod pdftotext;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use form26as_extract::{ExtractConfig, ExtractError};

use exit_codes::{extract_exit_code, EXIT_CONFIG, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "form26as")]
#[command(about = "Extract tax-credit records from annual tax statements (Form 26AS)")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FORM26AS_COMMIT"), ")"))]
struct Cli {
    /// Log more to stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// How the input file is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// JSON page dump (`{"pages": [...]}` or a bare array)
    Json,
    /// Plain text, pages separated by form feeds
    Text,
    /// PDF, converted with `pdftotext -layout`
    Pdf,
}

impl InputFormat {
    /// `.json` and `.pdf` by extension, anything else is text.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("pdf") => Self::Pdf,
            _ => Self::Text,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a statement into taxpayer info and transactions
    #[command(after_help = "\
Examples:
  form26as parse statement.pdf
  form26as parse pages.json --json
  form26as parse pages.json --json --diagnostics -v
  form26as parse statement.txt --csv --output transactions.csv
  form26as parse statement.pdf --config strict.toml --fail-on-empty")]
    Parse {
        /// Input file (page dump, text dump or PDF)
        input: PathBuf,

        /// Input format (default: from the file extension)
        #[arg(long, short = 'f')]
        format: Option<InputFormat>,

        /// Heuristics config (TOML)
        #[arg(long, env = "FORM26AS_CONFIG")]
        config: Option<PathBuf>,

        /// Print the statement as JSON instead of a human summary
        #[arg(long)]
        json: bool,

        /// Print the transaction table as CSV
        #[arg(long, conflicts_with = "json")]
        csv: bool,

        /// Write JSON (or CSV with --csv) to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Include run metadata and diagnostics in the JSON output
        #[arg(long)]
        diagnostics: bool,

        /// Exit with code 6 when no transactions are found
        #[arg(long)]
        fail_on_empty: bool,
    },

    /// Inspect and validate heuristics configs
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Validate a config file without parsing anything
    #[command(after_help = "\
Examples:
  form26as config validate strict.toml")]
    Validate {
        /// Path to the TOML config
        file: PathBuf,
    },

    /// Print the default config as TOML
    Show,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Parse {
            input,
            format,
            config,
            json,
            csv,
            output,
            diagnostics,
            fail_on_empty,
        } => parse::cmd_parse(parse::ParseArgs {
            input,
            format,
            config,
            json,
            csv,
            output,
            diagnostics,
            fail_on_empty,
        }),
        Commands::Config(ConfigCommands::Validate { file }) => cmd_config_validate(file),
        Commands::Config(ConfigCommands::Show) => cmd_config_show(),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    /// Engine error with its registry exit code.
    pub fn extract(err: &ExtractError) -> Self {
        Self { code: extract_exit_code(err), message: err.to_string(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// config
// ============================================================================

/// Read and validate a config file, or fall back to the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ExtractConfig, CliError> {
    let Some(path) = path else {
        return Ok(ExtractConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    ExtractConfig::from_toml(&text).map_err(|e| {
        CliError::extract(&e).with_hint("see `form26as config show` for the accepted keys")
    })
}

fn cmd_config_validate(file: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&file))?;
    let h = &config.heuristics;
    println!(
        "ok: {} (lookahead_lines={}, fallback_threshold={}, hyphen_means_zero={}, isolated_capital_status={}, default_status={})",
        config.name,
        h.lookahead_lines,
        h.fallback_threshold,
        h.hyphen_means_zero,
        h.isolated_capital_status,
        h.default_status,
    );
    Ok(())
}

fn cmd_config_show() -> Result<(), CliError> {
    let text = ExtractConfig::default()
        .to_toml()
        .map_err(|e| CliError::config(e.to_string()))?;
    print!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a/pages.json")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("STATEMENT.PDF")), InputFormat::Pdf);
        assert_eq!(InputFormat::from_path(Path::new("statement.txt")), InputFormat::Text);
        assert_eq!(InputFormat::from_path(Path::new("statement")), InputFormat::Text);
    }

    #[test]
    fn engine_errors_map_to_registry_codes() {
        assert_eq!(CliError::extract(&ExtractError::Io("x".into())).code, EXIT_IO);
        assert_eq!(CliError::extract(&ExtractError::PageDump("x".into())).code, EXIT_PARSE);
        assert_eq!(CliError::extract(&ExtractError::ConfigValidation("x".into())).code, EXIT_CONFIG);
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.name, "default");
    }
}
