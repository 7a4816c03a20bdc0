use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::{FileConfig, Overrides, Settings};
use report::SortOrder;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tally_core::{BatchCoordinator, ByteSource, FileSource};

mod config;
mod http;
mod report;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Aggregate `name, count` documents into one case-insensitive tally", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file (defaults to ./tally.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate local files (directories expand to the files directly inside them)
    Files(FilesArgs),

    /// Fetch and aggregate remote documents
    Urls(UrlsArgs),
}

impl Commands {
    fn batch(&self) -> &BatchArgs {
        match self {
            Commands::Files(args) => &args.batch,
            Commands::Urls(args) => &args.batch,
        }
    }
}

#[derive(Args)]
struct BatchArgs {
    /// Maximum number of sources read and parsed at once
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Text encoding label applied to every source (utf-8, utf-16le, windows-1251, ...)
    #[arg(short, long)]
    encoding: Option<String>,

    /// Output JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, requires = "json")]
    pretty: bool,

    /// Display order of the items
    #[arg(long, value_enum, default_value_t = SortOrder::Insertion)]
    sort: SortOrder,
}

impl BatchArgs {
    fn overrides(&self, timeout_secs: Option<u64>) -> Overrides {
        Overrides {
            concurrency: self.concurrency,
            encoding: self.encoding.clone(),
            timeout_secs,
        }
    }
}

#[derive(Args)]
struct FilesArgs {
    /// Files or directories to aggregate
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    batch: BatchArgs,
}

#[derive(Args)]
struct UrlsArgs {
    /// URLs to fetch
    urls: Vec<String>,

    /// Newline-separated URL list ("-" reads stdin)
    #[arg(long)]
    from: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(flatten)]
    batch: BatchArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers.
    if cli.command.batch().json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let file_config = FileConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Files(args) => run_files(args, file_config).await?,
        Commands::Urls(args) => run_urls(args, file_config).await?,
    }

    Ok(())
}

async fn run_files(args: FilesArgs, file_config: FileConfig) -> Result<()> {
    let settings = Settings::resolve(file_config, &args.batch.overrides(None))?;
    let sources: Vec<Box<dyn ByteSource>> = expand_paths(&args.paths)?
        .into_iter()
        .map(|path| Box::new(FileSource::new(path)) as Box<dyn ByteSource>)
        .collect();
    run_batch(sources, &settings, &args.batch).await
}

async fn run_urls(args: UrlsArgs, file_config: FileConfig) -> Result<()> {
    let settings = Settings::resolve(file_config, &args.batch.overrides(args.timeout_secs))?;

    let mut urls: Vec<String> = args
        .urls
        .iter()
        .flat_map(|raw| http::parse_url_list(raw))
        .collect();
    if let Some(list) = &args.from {
        urls.extend(http::parse_url_list(&read_url_list(list)?));
    }
    if urls.is_empty() {
        anyhow::bail!("No URLs given (pass them as arguments or with --from)");
    }

    let client = http::build_client(settings.http_timeout, &settings.user_agent)?;
    let sources: Vec<Box<dyn ByteSource>> = urls
        .into_iter()
        .map(|url| Box::new(http::HttpSource::new(client.clone(), url)) as Box<dyn ByteSource>)
        .collect();
    run_batch(sources, &settings, &args.batch).await
}

async fn run_batch(
    sources: Vec<Box<dyn ByteSource>>,
    settings: &Settings,
    batch: &BatchArgs,
) -> Result<()> {
    let coordinator = BatchCoordinator::new(settings.concurrency, settings.encoding)?;
    let outcome = coordinator.run(sources).await;

    let output = if batch.json {
        report::render_json(&outcome, batch.sort, batch.pretty)?
    } else {
        report::render_text(&outcome, batch.sort)
    };
    print_stdout(output.trim_end())
}

fn read_url_list(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read URL list from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Directories contribute the regular files directly inside them, sorted by name.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut expanded = Vec::with_capacity(paths.len());
    for path in paths {
        if !path.is_dir() {
            expanded.push(path.clone());
            continue;
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)
            .with_context(|| format!("Failed to list {}", path.display()))?
        {
            let entry = entry.with_context(|| format!("Failed to list {}", path.display()))?;
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                files.push(entry.path());
            }
        }
        files.sort();
        log::debug!("{} expands to {} files", path.display(), files.len());
        expanded.extend(files);
    }
    Ok(expanded)
}
