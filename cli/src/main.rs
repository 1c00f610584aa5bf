//! pdfsheet CLI - Chinese PDF to spreadsheet conversion tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfsheet::{
    render, ConvertOptions, ExtractMode, ExtractionResult, JsonFormat, PageSelection,
    ResultLayout, SanitizeOptions,
};

#[derive(Parser)]
#[command(name = "pdfsheet")]
#[command(version)]
#[command(about = "Extract text and tables from Chinese PDF documents into spreadsheet sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert PDF to CSV sheets and JSON
    Convert {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// What to extract
        #[arg(short, long, value_enum, default_value = "combined")]
        mode: Mode,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Print the extracted text
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Print the extraction result as JSON
    Json {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// What to extract
        #[arg(short, long, value_enum, default_value = "combined")]
        mode: Mode,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args, Clone)]
struct ExtractArgs {
    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Join lines that wrap mid-sentence
    #[arg(long)]
    merge_lines: bool,

    /// Allow merged paragraphs to continue across pages
    #[arg(long)]
    no_split_pages: bool,

    /// Collapse whitespace inside lines
    #[arg(long)]
    compact_whitespace: bool,

    /// Keep table rows whose cells are all blank
    #[arg(long)]
    keep_empty_rows: bool,

    /// List all text before all tables
    #[arg(long)]
    sectioned: bool,

    /// Redact e-mails, phone, card and ID numbers
    #[arg(long)]
    redact: bool,

    /// Also redact every run of four or more digits
    #[arg(long)]
    redact_numbers: bool,

    /// Password for encrypted documents
    #[arg(long, env = "PDFSHEET_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Maximum input size in MiB (0 = unlimited)
    #[arg(long, env = "PDFSHEET_MAX_SIZE_MB", default_value = "50")]
    max_size_mb: usize,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Text only
    Text,
    /// Tables only
    Table,
    /// Text and tables
    Combined,
}

impl From<Mode> for ExtractMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Text => ExtractMode::Text,
            Mode::Table => ExtractMode::Table,
            Mode::Combined => ExtractMode::Combined,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            mode,
            extract,
        } => cmd_convert(&input, output.as_deref(), mode, &extract),
        Commands::Text {
            input,
            output,
            extract,
        } => cmd_text(&input, output.as_deref(), &extract),
        Commands::Json {
            input,
            output,
            mode,
            compact,
            extract,
        } => cmd_json(&input, output.as_deref(), mode, compact, &extract),
        Commands::Info { input, json } => cmd_info(&input, json),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_options(args: &ExtractArgs) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let pages = match args.pages.as_deref() {
        Some(p) => PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?,
        None => PageSelection::All,
    };

    let mut options = ConvertOptions::new()
        .with_pages(pages)
        .with_merge_wrapped_lines(args.merge_lines)
        .with_split_by_page(!args.no_split_pages)
        .with_preserve_formatting(!args.compact_whitespace)
        .with_remove_empty_rows(!args.keep_empty_rows);

    if args.sectioned {
        options = options.with_layout(ResultLayout::Sectioned);
    }
    if args.redact || args.redact_numbers {
        options = options.with_sanitize(SanitizeOptions {
            redact_sensitive: args.redact,
            redact_numbers: args.redact_numbers,
        });
    }
    if let Some(ref password) = args.password {
        options = options.with_password(password.clone());
    }
    if args.max_size_mb > 0 {
        options = options.with_max_file_size(args.max_size_mb * 1024 * 1024);
    }

    Ok(options)
}

fn run_conversion(
    input: &Path,
    mode: ExtractMode,
    args: &ExtractArgs,
) -> Result<ExtractionResult, Box<dyn std::error::Error>> {
    let options = build_options(args)?;
    let result = pdfsheet::convert_file(input, mode, &options)?;
    print_warnings(&result);
    Ok(result)
}

fn print_warnings(result: &ExtractionResult) {
    for warning in &result.warnings {
        eprintln!("{}: {}", "Warning".yellow().bold(), warning);
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    mode: Mode,
    args: &ExtractArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let stem = input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(format!("{}_sheets", stem)));

    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    pb.set_message("Extracting PDF...");
    let result = run_conversion(input, mode.into(), args)?;
    pb.inc(1);

    pb.set_message("Writing sheets...");
    let source_name = input
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let workbook = render::to_workbook(&result, &source_name);
    let written = workbook.write_csv_dir(&output_dir, &stem)?;
    pb.inc(1);

    pb.set_message("Writing JSON...");
    let json = render::to_json(&result, JsonFormat::Pretty)?;
    let json_path = output_dir.join(format!("{}.json", stem));
    fs::write(&json_path, json)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!(
        "\n{} {} pages, {} tables",
        "Converted".green().bold(),
        result.page_count,
        result.table_count()
    );
    println!("{}", "Output files:".green().bold());
    for path in &written {
        println!("  {} {}", "├─".dimmed(), path.display());
    }
    println!("  {} {}", "└─".dimmed(), json_path.display());

    Ok(())
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    args: &ExtractArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = run_conversion(input, ExtractMode::Text, args)?;
    let text = render::to_text(&result);

    if let Some(path) = output {
        fs::write(path, &text)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    mode: Mode,
    compact: bool,
    args: &ExtractArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = run_conversion(input, mode.into(), args)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = render::to_json(&result, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let info = pdfsheet::inspect_file(input)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let metadata = &info.metadata;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), metadata.page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if metadata.encrypted { "Yes" } else { "No" }
    );

    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref subject) = metadata.subject {
        println!("{}: {}", "Subject".bold(), subject);
    }
    if let Some(ref creator) = metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Characters".bold(), info.total_characters);
    println!("{}: {}", "Pages with text".bold(), format_pages(&info.pages_with_text));
    println!("{}: {}", "Tables".bold(), info.table_count);
    println!(
        "{}: {}",
        "Pages with tables".bold(),
        format_pages(&info.pages_with_tables)
    );

    Ok(())
}

fn format_pages(pages: &[u32]) -> String {
    if pages.is_empty() {
        return "none".to_string();
    }
    pages
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn cmd_version() {
    println!("{} {}", "pdfsheet".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Chinese PDF to spreadsheet conversion tool");
    println!();
    println!("License: MIT");
}
