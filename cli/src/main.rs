//! relayout CLI - layout reconstruction from extraction dumps

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use relayout::model::PageStatus;
use relayout::render::{self, JsonFormat};
use relayout::{LayoutOptions, PageSelection, Relayout, RelayoutResult};

#[derive(Parser)]
#[command(name = "relayout")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Rebuild document layout into chunks, Markdown, text, and JSON", long_about = None)]
struct Cli {
    /// Input dump file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a dump to all formats (Markdown, text, JSON, chunks)
    Convert {
        /// Input dump file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Convert a dump to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input dump file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Convert a dump to plain text
    Text {
        /// Input dump file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Convert a dump to the JSON layout tree
    Json {
        /// Input dump file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Emit the grounded chunk list as JSON
    Chunks {
        /// Input dump file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Use the flat legacy schema (percent boxes)
        #[arg(long)]
        legacy: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Show per-page coverage and document metrics
    Info {
        /// Input dump file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Show version information
    Version,
}

/// Options shared by every command that runs the engine.
#[derive(Args, Clone, Default)]
struct LayoutArgs {
    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// JSON file with layout thresholds
    #[arg(long, value_name = "FILE", env = "RELAYOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Looser row grouping for native-grade positions
    #[arg(long)]
    legacy_grouping: bool,

    /// Infer headings and lists
    #[arg(long)]
    infer_types: bool,

    /// Process pages one at a time
    #[arg(long)]
    sequential: bool,
}

impl LayoutArgs {
    fn builder(&self) -> Result<Relayout, Box<dyn std::error::Error>> {
        let mut options = match self.config {
            Some(ref path) => {
                log::debug!("loading layout options from {}", path.display());
                LayoutOptions::from_json(&fs::read_to_string(path)?)?
            }
            None => LayoutOptions::default(),
        };
        if let Some(ref p) = self.pages {
            let selection =
                PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?;
            options = options.with_pages(selection);
        }
        if self.legacy_grouping {
            options = options.legacy_grouping();
        }
        if self.infer_types {
            options = options.infer_block_types();
        }
        if self.sequential {
            options = options.sequential();
        }
        Ok(Relayout::new().with_options(options))
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            layout,
        }) => cmd_convert(&input, output.as_deref(), &layout),
        Some(Commands::Markdown {
            input,
            output,
            frontmatter,
            layout,
        }) => cmd_markdown(&input, output.as_deref(), frontmatter, &layout),
        Some(Commands::Text {
            input,
            output,
            layout,
        }) => cmd_text(&input, output.as_deref(), &layout),
        Some(Commands::Json {
            input,
            output,
            compact,
            layout,
        }) => cmd_json(&input, output.as_deref(), compact, &layout),
        Some(Commands::Chunks {
            input,
            output,
            compact,
            legacy,
            layout,
        }) => cmd_chunks(&input, output.as_deref(), compact, legacy, &layout),
        Some(Commands::Info { input, layout }) => cmd_info(&input, &layout),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(&input, cli.output.as_deref(), &LayoutArgs::default())
            } else {
                println!("{}", "Usage: relayout <FILE> [OUTPUT]".yellow());
                println!("       relayout --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    layout: &LayoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    });

    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Reconstructing layout...");
    let bar = pb.clone();
    let result = layout
        .builder()?
        .with_frontmatter()
        .on_progress(move |p| bar.set_position(p.percent.round() as u64))
        .open(input)?;

    pb.set_message("Writing outputs...");
    let projection = result.projection()?;
    fs::write(output_dir.join("extract.md"), &projection.markdown)?;
    fs::write(output_dir.join("extract.txt"), &projection.text)?;
    fs::write(
        output_dir.join("document.json"),
        result.to_json(JsonFormat::Pretty)?,
    )?;
    fs::write(
        output_dir.join("chunks.json"),
        render::chunks_to_json(&projection.chunks, JsonFormat::Pretty)?,
    )?;

    pb.finish_with_message("Done!");

    print_degraded(&result);

    println!("\n{}", "Output files:".green().bold());
    println!("  {} extract.md", "├─".dimmed());
    println!("  {} extract.txt", "├─".dimmed());
    println!("  {} document.json", "├─".dimmed());
    println!("  {} chunks.json", "└─".dimmed());

    Ok(())
}

fn cmd_markdown(
    input: &Path,
    output: Option<&Path>,
    frontmatter: bool,
    layout: &LayoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = layout.builder()?;
    if frontmatter {
        builder = builder.with_frontmatter();
    }
    let markdown = builder.open(input)?.to_markdown()?;
    write_or_print(output, &markdown)
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    layout: &LayoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = layout.builder()?.open(input)?.to_text()?;
    write_or_print(output, &text)
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    layout: &LayoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = layout.builder()?.open(input)?.to_json(json_format(compact))?;
    write_or_print(output, &json)
}

fn cmd_chunks(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    legacy: bool,
    layout: &LayoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = layout.builder()?.open(input)?;
    let format = json_format(compact);
    let json = if legacy {
        let records = result.legacy_chunks();
        if compact {
            serde_json::to_string(&records)?
        } else {
            serde_json::to_string_pretty(&records)?
        }
    } else {
        result.chunks_json(format)?
    };
    write_or_print(output, &json)
}

fn cmd_info(input: &Path, layout: &LayoutArgs) -> Result<(), Box<dyn std::error::Error>> {
    let result = layout.builder()?.open(input)?;
    let doc = result.document();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    if let Some(ref source) = doc.metadata.source {
        println!("{}: {}", "Source".bold(), source);
    }
    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    println!("{}: {}", "Pages".bold(), doc.metadata.page_count);

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for page in &doc.pages {
        let status = match page.status {
            PageStatus::Ok => "ok".green(),
            PageStatus::Degraded => "degraded".yellow(),
            PageStatus::Failed => "failed".red(),
        };
        println!(
            "{:>4}  {:<9} {:<16} native {:>4}  ocr {:>4}  kept {:>4}  {:>5.1}%",
            page.number,
            status,
            format!("{:?}", page.method),
            page.coverage.native_token_count,
            page.coverage.ocr_token_count,
            page.coverage.reconciled_token_count,
            page.coverage.coverage_percent
        );
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let m = &doc.metrics;
    println!("{}: {}", "Words".bold(), m.total_words);
    println!("{}: {}", "Lines".bold(), m.total_lines);
    println!("{}: {}", "Blocks".bold(), m.total_blocks);
    println!("{}: {}", "Chunks".bold(), result.chunks().len());
    println!("{}: {:.1}%", "Coverage".bold(), m.coverage_percent);
    println!("{}: {}", "Degraded pages".bold(), m.degraded_pages);
    println!("{}: {}", "Failed pages".bold(), m.failed_pages);

    Ok(())
}

fn print_degraded(result: &RelayoutResult) {
    let metrics = &result.document().metrics;
    if metrics.degraded_pages > 0 || metrics.failed_pages > 0 {
        println!(
            "{} {} degraded, {} failed",
            "Warning:".yellow().bold(),
            metrics.degraded_pages,
            metrics.failed_pages
        );
    }
}

fn cmd_version() {
    println!("{} {}", "relayout".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Layout reconstruction tool");
    println!();
    println!("License: MIT");
}
