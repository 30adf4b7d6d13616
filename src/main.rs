use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wikiticker::config::{DecoderConfig, DEFAULT_CHANNEL};
use wikiticker::decoder::EditDecoder;
use wikiticker::stream::{self, MessageSource};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikiticker")]
#[command(about = "Decode the Wikipedia recent-changes IRC feed into JSON rows")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode feed lines into one JSON row per edit
    Decode(DecodeArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// One raw feed line per line, stamped on arrival
    Raw,
    /// One JSON message (timestamp, channel, text) per line
    Json,
}

#[derive(Args)]
struct DecodeArgs {
    /// Input file ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output file for JSON rows ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Decoder config (JSON with "namespaces" and "geoDbFile")
    #[arg(long)]
    config: Option<PathBuf>,

    /// Geo database CSV, overrides "geoDbFile" from the config
    #[arg(long)]
    geo_db: Option<PathBuf>,

    /// Channel the raw lines were read from
    #[arg(long, default_value = DEFAULT_CHANNEL)]
    channel: String,

    /// Input line format
    #[arg(long, value_enum, default_value_t = InputFormat::Raw)]
    input_format: InputFormat,
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => DecoderConfig::from_path(path)?,
        None => DecoderConfig::default(),
    };
    if args.geo_db.is_some() {
        config.geo_db_file = args.geo_db;
    }
    let decoder = EditDecoder::from_config(config)?;

    let reader: Box<dyn BufRead> = if args.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("Failed to open input: {}", args.input))?;
        Box::new(BufReader::with_capacity(128 * 1024, file))
    };

    let writer: Box<dyn Write> = if args.output == "-" {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        let file = File::create(&args.output)
            .with_context(|| format!("Failed to create output: {}", args.output))?;
        Box::new(BufWriter::with_capacity(128 * 1024, file))
    };

    let source = match args.input_format {
        InputFormat::Raw => MessageSource::Raw {
            channel: args.channel,
        },
        InputFormat::Json => MessageSource::Json,
    };

    info!(input = args.input, output = args.output, "Starting decode");
    let start = Instant::now();
    let stats = stream::decode_stream(reader, writer, &decoder, &source)?;
    let duration = start.elapsed();

    eprintln!();
    eprintln!("=== Summary ===");
    eprintln!("Decode time:        {:.2}s", duration.as_secs_f64());
    eprintln!("Lines read:         {}", stats.lines());
    eprintln!("Rows decoded:       {}", stats.rows());
    eprintln!("Malformed lines:    {}", stats.malformed());
    eprintln!("Anonymous edits:    {}", stats.anonymous());
    eprintln!("Located edits:      {}", stats.located());

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG directives win over the -v default
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Decode(args) => run_decode(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
