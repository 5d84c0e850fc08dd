//! Imsoniack CLI - Command-line interface for the sleep scoring pipeline
//!
//! Commands:
//! - score: Score NDJSON samples into enriched records (batch mode)
//! - validate: Report which samples would be rejected
//! - serve: Run the authenticated HTTP ingest endpoint
//! - simulate: Generate (or upload) a night of synthetic sleep samples
//! - push: Upload one fixed sample to smoke-test a deployment

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use imsoniack::client::{ClientError, IngestClient, UploadReport};
use imsoniack::config::{IngestConfig, DEFAULT_BIND};
use imsoniack::pipeline::{enrich, SleepProcessor};
use imsoniack::schema::Validator;
use imsoniack::server::ServerError;
use imsoniack::simulate::{dummy_sample, NightWindow, SleepNightGenerator};
use imsoniack::store::NdjsonStore;
use imsoniack::{IngestError, StoreError, IMSONIACK_VERSION, PRODUCER_NAME};

/// Imsoniack - Per-sample sleep scoring for wearable sensors
#[derive(Parser)]
#[command(name = "imsoniack")]
#[command(version = IMSONIACK_VERSION)]
#[command(about = "Score wearable samples for sleep quality and stage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score NDJSON samples into enriched records (batch mode)
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Also append every record to this NDJSON store
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Report which samples would be rejected and why
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP ingest endpoint
    Serve {
        /// Shared secret expected in the x-api-key header
        #[arg(long, env = "IOT_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Listen address
        #[arg(long, env = "IMSONIACK_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,

        /// NDJSON file records are appended to (in-memory when absent)
        #[arg(long, env = "IMSONIACK_STORE")]
        store: Option<PathBuf>,
    },

    /// Generate a Friday night of "good sleep" samples
    Simulate {
        /// Output file path (use - for stdout); ignored with --send
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Upload to this ingest URL instead of writing a file
        #[arg(long)]
        send: Option<String>,

        /// API key for --send
        #[arg(long, env = "IOT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Maximum uploads in flight
        #[arg(long, default_value = "10")]
        concurrency: usize,

        /// Seed for reproducible samples
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Upload one fixed sample to an ingest URL
    Push {
        /// Ingest URL
        #[arg(long)]
        url: String,

        /// Shared secret for the x-api-key header
        #[arg(long, env = "IOT_API_KEY", hide_env_values = true)]
        api_key: String,
    },
}

fn main() -> ExitCode {
    if let Err(error) = dotenv::dotenv() {
        log::debug!("No .env file loaded: {}", error);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ImsoniackCliError> {
    match cli.command {
        Commands::Score {
            input,
            output,
            store,
        } => cmd_score(&input, &output, store.as_deref()),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Serve {
            api_key,
            bind,
            store,
        } => cmd_serve(IngestConfig::new(api_key, bind, store)),

        Commands::Simulate {
            output,
            send,
            api_key,
            concurrency,
            seed,
        } => cmd_simulate(&output, send, api_key, concurrency, seed),

        Commands::Push { url, api_key } => cmd_push(url, api_key),
    }
}

fn read_input(input: &Path) -> Result<String, ImsoniackCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, lines: &[String]) -> Result<(), ImsoniackCliError> {
    let mut data = lines.join("\n");
    if !data.is_empty() {
        data.push('\n');
    }

    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn cmd_score(input: &Path, output: &Path, store: Option<&Path>) -> Result<(), ImsoniackCliError> {
    let bodies = Validator::parse_ndjson(&read_input(input)?)?;
    if bodies.is_empty() {
        return Err(ImsoniackCliError::NoSamples);
    }

    let processor = match store {
        Some(path) => Some(SleepProcessor::new(std::sync::Arc::new(NdjsonStore::open(path)?))),
        None => None,
    };

    let mut lines = Vec::with_capacity(bodies.len());
    let mut rejected = 0;

    for numbered in &bodies {
        let line = match &processor {
            Some(processor) => processor
                .ingest(Some(&numbered.body))
                .and_then(|ingested| {
                    let stored = imsoniack::types::StoredRecord {
                        id: ingested.id,
                        record: ingested.record,
                    };
                    Ok(serde_json::to_string(&stored)?)
                }),
            None => enrich(Some(&numbered.body), chrono::Utc::now())
                .and_then(|record| Ok(serde_json::to_string(&record)?)),
        };

        match line {
            Ok(line) => lines.push(line),
            Err(e) => {
                log::warn!("Line {} rejected: {}", numbered.line, e);
                rejected += 1;
            }
        }
    }

    write_output(output, &lines)?;
    log::info!("Scored {} of {} samples", lines.len(), bodies.len());

    if rejected > 0 {
        Err(ImsoniackCliError::SamplesRejected(rejected))
    } else {
        Ok(())
    }
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), ImsoniackCliError> {
    let bodies = Validator::parse_ndjson(&read_input(input)?)?;
    let results = Validator::validate_batch(&bodies);

    let report = ValidationReport {
        total_samples: bodies.len(),
        valid_samples: bodies.len() - results.len(),
        invalid_samples: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                line: r.line,
                code: r.error.code().to_string(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total samples:   {}", report.total_samples);
        println!("Valid samples:   {}", report.valid_samples);
        println!("Invalid samples: {}", report.invalid_samples);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Line {} [{}]: {}", err.line, err.code, err.error);
            }
        }
    }

    if report.invalid_samples > 0 {
        Err(ImsoniackCliError::ValidationFailed(report.invalid_samples))
    } else {
        Ok(())
    }
}

fn cmd_serve(config: IngestConfig) -> Result<(), ImsoniackCliError> {
    log::info!("{} {} starting", PRODUCER_NAME, IMSONIACK_VERSION);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(imsoniack::server::serve(config))?;
    Ok(())
}

fn cmd_simulate(
    output: &Path,
    send: Option<String>,
    api_key: Option<String>,
    concurrency: usize,
    seed: Option<u64>,
) -> Result<(), ImsoniackCliError> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let window = NightWindow::previous_friday(chrono::Local::now());
    let samples = SleepNightGenerator::new(rng).generate(&window);
    log::info!(
        "Generated {} samples from {} to {}",
        samples.len(),
        window.start,
        window.end
    );

    let Some(url) = send else {
        let lines = samples
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        return write_output(output, &lines);
    };

    let api_key = api_key.ok_or(ImsoniackCliError::MissingApiKey)?;
    let client = IngestClient::new(url, api_key);

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(client.send_all(&samples, concurrency));
    println!("{}", serde_json::to_string(&report)?);

    if report.failed > 0 {
        Err(ImsoniackCliError::UploadFailed(report))
    } else {
        log::info!("All {} samples uploaded", report.sent);
        Ok(())
    }
}

fn cmd_push(url: String, api_key: String) -> Result<(), ImsoniackCliError> {
    let client = IngestClient::new(url, api_key);
    let runtime = tokio::runtime::Runtime::new()?;
    let doc_id = runtime.block_on(client.send(&dummy_sample()))?;

    println!("{}", serde_json::json!({ "docId": doc_id }));
    log::info!("Dummy sample stored as {} at {}", doc_id, client.endpoint());
    Ok(())
}

// Error types

#[derive(Debug)]
enum ImsoniackCliError {
    Io(io::Error),
    Ingest(IngestError),
    Store(StoreError),
    Json(serde_json::Error),
    Server(ServerError),
    Client(ClientError),
    NoSamples,
    MissingApiKey,
    SamplesRejected(usize),
    ValidationFailed(usize),
    UploadFailed(UploadReport),
}

impl From<io::Error> for ImsoniackCliError {
    fn from(e: io::Error) -> Self {
        ImsoniackCliError::Io(e)
    }
}

impl From<IngestError> for ImsoniackCliError {
    fn from(e: IngestError) -> Self {
        ImsoniackCliError::Ingest(e)
    }
}

impl From<StoreError> for ImsoniackCliError {
    fn from(e: StoreError) -> Self {
        ImsoniackCliError::Store(e)
    }
}

impl From<serde_json::Error> for ImsoniackCliError {
    fn from(e: serde_json::Error) -> Self {
        ImsoniackCliError::Json(e)
    }
}

impl From<ServerError> for ImsoniackCliError {
    fn from(e: ServerError) -> Self {
        ImsoniackCliError::Server(e)
    }
}

impl From<ClientError> for ImsoniackCliError {
    fn from(e: ClientError) -> Self {
        ImsoniackCliError::Client(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ImsoniackCliError> for CliError {
    fn from(e: ImsoniackCliError) -> Self {
        match e {
            ImsoniackCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ImsoniackCliError::Ingest(e) => CliError {
                code: e.code().to_string(),
                message: e.to_string(),
                hint: Some("Run 'imsoniack validate' for details".to_string()),
            },
            ImsoniackCliError::Store(e) => CliError {
                code: "STORAGE_FAILURE".to_string(),
                message: e.to_string(),
                hint: Some("Check that the store path is writable".to_string()),
            },
            ImsoniackCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            ImsoniackCliError::Server(e) => CliError {
                code: "SERVER_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the bind address and API key".to_string()),
            },
            ImsoniackCliError::Client(e) => CliError {
                code: "UPLOAD_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the ingest URL and API key".to_string()),
            },
            ImsoniackCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            ImsoniackCliError::MissingApiKey => CliError {
                code: "MISSING_API_KEY".to_string(),
                message: "--send requires an API key".to_string(),
                hint: Some("Pass --api-key or set IOT_API_KEY".to_string()),
            },
            ImsoniackCliError::SamplesRejected(count) => CliError {
                code: "SAMPLES_REJECTED".to_string(),
                message: format!("{} samples were rejected", count),
                hint: Some("Run 'imsoniack validate' for details".to_string()),
            },
            ImsoniackCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} samples failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            ImsoniackCliError::UploadFailed(report) => CliError {
                code: "UPLOAD_FAILED".to_string(),
                message: format!(
                    "{} of {} uploads failed",
                    report.failed,
                    report.failed + report.sent
                ),
                hint: Some("See the log for per-sample errors".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_samples: usize,
    valid_samples: usize,
    invalid_samples: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    line: usize,
    code: String,
    error: String,
}
