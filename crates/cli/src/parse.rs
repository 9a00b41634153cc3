// `form26as parse` - load pages, run the engine, render the result.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use form26as_extract::{JsonPageDump, Page, PageSource, ParseReport, TextDump};

use crate::exit_codes::EXIT_EMPTY;
use crate::pdftotext::{self, PdftotextSource};
use crate::{load_config, CliError, InputFormat};

pub struct ParseArgs {
    pub input: PathBuf,
    pub format: Option<InputFormat>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub csv: bool,
    pub output: Option<PathBuf>,
    pub diagnostics: bool,
    pub fail_on_empty: bool,
}

pub fn cmd_parse(args: ParseArgs) -> Result<(), CliError> {
    if args.diagnostics && args.csv {
        return Err(CliError::args("--diagnostics applies to JSON output, not --csv")
            .with_hint("use --json --diagnostics, or drop --diagnostics"));
    }
    if !args.input.exists() {
        return Err(CliError::io(format!("input not found: {}", args.input.display())));
    }

    let config = load_config(args.config.as_deref())?;
    let format = args.format.unwrap_or_else(|| InputFormat::from_path(&args.input));
    log::info!("parse: {} as {:?} with config '{}'", args.input.display(), format, config.name);

    let pages = load_pages(&args.input, format)?;
    let report = form26as_extract::run(&pages, &config);

    let count = report.statement.count;
    if args.csv {
        emit_csv(&report, args.output.as_deref())?;
    } else if args.json || args.output.is_some() {
        emit_json(&report, args.diagnostics, args.output.as_deref())?;
    } else {
        print_summary(&report);
    }

    if args.fail_on_empty && count == 0 {
        return Err(CliError {
            code: EXIT_EMPTY,
            message: format!("no transactions found in {}", args.input.display()),
            hint: None,
        });
    }
    Ok(())
}

fn load_pages(input: &Path, format: InputFormat) -> Result<Vec<Page>, CliError> {
    match format {
        InputFormat::Json => JsonPageDump::new(input)
            .load_pages()
            .map_err(|e| CliError::extract(&e)),
        InputFormat::Text => TextDump::new(input)
            .load_pages()
            .map_err(|e| CliError::extract(&e)),
        InputFormat::Pdf => {
            let source = PdftotextSource::new(input);
            source.load_pages().map_err(|e| {
                let err = CliError::extract(&e);
                if pdftotext::available() {
                    err
                } else {
                    err.with_hint(pdftotext::INSTALL_HINT)
                }
            })
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn emit_json(report: &ParseReport, diagnostics: bool, output: Option<&Path>) -> Result<(), CliError> {
    let rendered = if diagnostics {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string_pretty(&report.statement)
    }
    .map_err(|e| CliError::parse(format!("JSON encoding failed: {e}")))?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{rendered}\n"))
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn emit_csv(report: &ParseReport, output: Option<&Path>) -> Result<(), CliError> {
    let records = &report.statement.transactions;
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .map_err(|e| CliError::io(format!("cannot create {}: {e}", path.display())))?;
            crate::export::write_csv(records, std::io::BufWriter::new(file))?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            crate::export::write_csv(records, stdout.lock())?;
        }
    }
    Ok(())
}

fn print_summary(report: &ParseReport) {
    let statement = &report.statement;
    let info = &statement.taxpayer_info;
    let entities = statement
        .transactions
        .iter()
        .map(|r| r.entity_tax_id.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    println!("Taxpayer:  {} ({})", info.name, info.tax_id);
    println!("Year:      FY {} / AY {}", info.financial_year, info.assessment_year);
    println!("Address:   {}", info.address);
    println!();
    println!("{} transactions from {} entities", statement.count, entities);
    if statement.transactions.is_empty() {
        return;
    }

    println!();
    println!(
        "{:>4}  {:<10}  {:<7}  {:<11}  {:>14}  {:>12}  {:>6}  {:>4}",
        "#", "TAN", "Section", "Date", "Gross", "Tax", "Rate", "Page"
    );
    for r in &statement.transactions {
        println!(
            "{:>4}  {:<10}  {:<7}  {:<11}  {:>14.2}  {:>12.2}  {:>6.2}  {:>4}",
            r.serial_number,
            r.entity_tax_id,
            r.section,
            r.transaction_date,
            r.gross_amount,
            r.tax_amount,
            r.rate,
            r.page_number,
        );
    }
}
