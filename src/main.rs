use clap::{Args, Parser, Subcommand};
use engagement_lens::{
    api::{ApiAnalysisResponse, ApiMetrics}, extract, format_float, format_optional, server, Analyzer,
    EngagementMetrics, Extractor, ServiceConfig, SourceKind,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "engagement-lens",
    about = "Social post engagement analyzer for text, PDFs, and images"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Analyze text, a PDF, or an image from the command line
    Analyze(AnalyzeArgs),
    /// Check that the external OCR tools are reachable
    Tools(ConfigArgs),
    /// Print the effective configuration, or write it to a file
    Config(ConfigDumpArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct ConfigArgs {
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    web_root: Option<String>,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug, Clone, Default)]
struct AnalyzeArgs {
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug, Clone, Default)]
struct ConfigDumpArgs {
    #[arg(long)]
    write: Option<PathBuf>,
    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_serve(args).await,
        Command::Analyze(args) => run_analyze(args).await,
        Command::Tools(args) => run_tools(args),
        Command::Config(args) => run_config(args),
    }
}

async fn run_serve(args: ServeArgs) -> Result<(), String> {
    let (mut config, path) = ServiceConfig::load(args.config.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(web_root) = args.web_root {
        config.server.web_root = Some(web_root);
    }
    if let Some(path) = path.filter(|path| path.exists()) {
        tracing::info!(path = %path.display(), "Loaded config");
    }
    server::serve(config).await
}

async fn run_analyze(args: AnalyzeArgs) -> Result<(), String> {
    let (config, _) = ServiceConfig::load(args.config.config)?;
    let analyzer = Analyzer::with_vader();

    let response = match args.file {
        Some(path) => {
            let kind = file_kind(&path)?;
            let bytes = std::fs::read(&path)
                .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
            let extractor = Extractor::from_config(&config.extraction)
                .map_err(|err| format!("failed to initialise extractor: {}", err))?;
            let extraction = tokio::task::spawn_blocking(move || extractor.extract(&bytes, kind))
                .await
                .map_err(|err| format!("extraction worker failed: {}", err))?
                .map_err(|err| err.to_string())?;
            if extraction.is_empty() {
                ApiAnalysisResponse::no_text(extraction)
            } else {
                let metrics = analyzer.analyze(&extraction.text);
                ApiAnalysisResponse::analyzed(kind, extraction.text, metrics)
            }
        }
        None => {
            let text = read_text(args.text)?;
            let metrics = analyzer.analyze(&text);
            ApiAnalysisResponse::analyzed(SourceKind::RawText, text, metrics)
        }
    };

    if args.json {
        let payload = serde_json::to_string_pretty(&response)
            .map_err(|err| format!("failed to serialize report: {}", err))?;
        println!("{}", payload);
        return Ok(());
    }

    println!("Source: {}", response.source);
    match &response.metrics {
        ApiMetrics::Full(metrics) => print_report(metrics),
        ApiMetrics::Empty(_) => {
            println!("{}", response.warning.as_deref().unwrap_or(extract::NO_TEXT_WARNING));
        }
    }
    Ok(())
}

fn print_report(metrics: &EngagementMetrics) {
    println!(
        "Words: {} | characters: {} | avg sentence length: {}",
        metrics.word_count,
        metrics.char_count,
        format_float(metrics.avg_sentence_len, 2)
    );
    println!(
        "Readability: Flesch {} | grade {}",
        format_optional(metrics.flesch_reading_ease, 2),
        metrics.readability_grade.as_deref().unwrap_or("n/a")
    );
    println!(
        "Sentiment: compound {} | pos {} | neu {} | neg {}",
        format_float(metrics.sentiment.compound, 3),
        format_float(metrics.sentiment.pos, 3),
        format_float(metrics.sentiment.neu, 3),
        format_float(metrics.sentiment.neg, 3)
    );
    println!(
        "Hashtags: {} | mentions: {} | links: {} | emoji: {}",
        join_or_none(&metrics.hashtags),
        join_or_none(&metrics.mentions),
        join_or_none(&metrics.links),
        metrics.emoji_count
    );

    if !metrics.suggestions.is_empty() {
        println!("\nSuggestions:");
        for suggestion in &metrics.suggestions {
            println!("- {}", suggestion);
        }
    }
}

fn run_tools(args: ConfigArgs) -> Result<(), String> {
    let (config, _) = ServiceConfig::load(args.config)?;
    let mut missing = 0;
    for (tool, available) in extract::check_tools(&config.extraction) {
        let status = if available { "ok" } else { "missing" };
        println!("{:<12} {}", tool, status);
        if !available {
            missing += 1;
        }
    }
    if missing > 0 {
        return Err(format!("{} required tool(s) not found on PATH", missing));
    }
    Ok(())
}

fn run_config(args: ConfigDumpArgs) -> Result<(), String> {
    let (config, _) = ServiceConfig::load(args.config.config)?;
    match args.write {
        Some(path) => {
            config.write(&path)?;
            println!("Wrote {}", path.display());
        }
        None => {
            let payload = toml::to_string_pretty(&config)
                .map_err(|err| format!("failed to serialize config: {}", err))?;
            print!("{}", payload);
        }
    }
    Ok(())
}

fn file_kind(path: &Path) -> Result<SourceKind, String> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    SourceKind::from_filename(name)
        .ok_or_else(|| format!("unsupported file type: {}", path.display()))
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

fn read_text(arg: Option<String>) -> Result<String, String> {
    if let Some(text) = arg {
        if !text.trim().is_empty() {
            return Ok(text.trim().to_string());
        }
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("failed reading stdin: {}", err))?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Err("missing text: pass --text, --file, or pipe stdin".to_string());
    }
    Ok(trimmed.to_string())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
