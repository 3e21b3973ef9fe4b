use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dep_parser::config::Config;
use dep_parser::file_types::FileType;
use dep_parser::reports::{generate_markdown_report, generate_summary};
use dep_parser::types::ParseOutput;

#[derive(Parser)]
#[command(name = "dep-parser")]
#[command(
    about = "Extract pinned libraries and dependency edges from manifest files",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Detect from the file name
    Auto,
    Requirements,
    SbtLock,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
    Summary,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse dependency files and print the libraries found
    Parse {
        /// Paths to the dependency files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Input format
        #[arg(short, long, value_enum, default_value = "auto")]
        format: Format,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        output: OutputFormat,

        /// Configuration file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Profile dependency file parsing (for use with cargo-flamegraph)
    ProfileParse {
        /// Path to the dependency file to parse
        #[arg(short, long)]
        file: PathBuf,

        /// Input format
        #[arg(long, value_enum, default_value = "auto")]
        format: Format,

        /// Number of iterations (for meaningful profiling)
        #[arg(short, long, default_value = "1000")]
        iterations: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Parse {
            files,
            format,
            output,
            config,
        } => run_parse(files, format, output, config).await,
        Commands::ProfileParse {
            file,
            format,
            iterations,
        } => run_profile_parse(file, format, iterations).await,
    }
}

fn file_type_for(path: &Path, format: Format) -> anyhow::Result<FileType> {
    match format {
        Format::Requirements => Ok(FileType::Requirements),
        Format::SbtLock => Ok(FileType::SbtLock),
        Format::Auto => FileType::detect(path)
            .ok_or_else(|| anyhow!("Unsupported file type: {}", path.display())),
    }
}

fn parse_file(path: &Path, format: Format, config: &Config) -> anyhow::Result<ParseOutput> {
    let file_type = file_type_for(path, format)?;
    let parser = file_type.parser(config, path.parent());

    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    tracing::debug!("Parsing {} as {}", path.display(), file_type.name());
    parser
        .parse(&mut file)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

async fn run_parse(
    files: Vec<PathBuf>,
    format: Format,
    output: OutputFormat,
    config_path: Option<PathBuf>,
) -> ExitCode {
    let config = match config_path {
        Some(path) => match Config::load(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    let config = Arc::new(config);

    // Parsing is blocking IO + CPU work
    let tasks = files.iter().cloned().map(|path| {
        let config = Arc::clone(&config);
        tokio::task::spawn_blocking(move || parse_file(&path, format, &config))
    });
    let results = futures::future::join_all(tasks).await;

    let mut failed = false;
    let mut json_reports = Vec::new();

    for (path, joined) in files.iter().zip(results) {
        let result = joined
            .map_err(anyhow::Error::from)
            .and_then(|r| r);

        let parsed = match result {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                failed = true;
                continue;
            }
        };

        let name = path.display().to_string();
        match output {
            OutputFormat::Json => json_reports.push(serde_json::json!({
                "File": name,
                "Libraries": parsed.libraries,
                "Dependencies": parsed.dependencies,
            })),
            OutputFormat::Markdown => println!("{}\n", generate_markdown_report(&name, &parsed)),
            OutputFormat::Summary => println!("{}", generate_summary(&name, &parsed)),
        }
    }

    if !json_reports.is_empty() {
        match serde_json::to_string_pretty(&json_reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run_profile_parse(file: PathBuf, format: Format, iterations: usize) -> ExitCode {
    let content = match tokio::fs::read(&file).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let file_type = match file_type_for(&file, format) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let parser = file_type.parser(&Config::default(), file.parent());

    eprintln!("Profiling parse operations for: {}", file.display());
    eprintln!("Iterations: {}", iterations);
    eprintln!("File size: {} bytes", content.len());

    let start = Instant::now();

    for _ in 0..iterations {
        if let Err(e) = std::hint::black_box(parser.parse_bytes(&content)) {
            eprintln!("Parse failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let elapsed = start.elapsed();
    eprintln!("\nProfiling complete!");
    eprintln!("Total time: {:?}", elapsed);
    if iterations > 0 {
        eprintln!("Average per iteration: {:?}", elapsed / iterations as u32);
    }

    ExitCode::SUCCESS
}
