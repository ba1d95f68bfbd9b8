//! threatscore CLI - Command-line interface for threat score aggregation
//!
//! Commands:
//! - variance: User-weighted variance score
//! - mean: Importance-weighted mean score, clamped
//! - generate: Emit synthetic threat data
//! - doctor: Diagnose configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use threatscore::config::EngineConfig;
use threatscore::records::{self, UserThreatRecord};
use threatscore::types::{DepartmentRecord, ScoreReport, WeightedDepartment};
use threatscore::{ScoreProcessor, ThreatScoreGenerator, PRODUCER_NAME, THREATSCORE_VERSION};

/// threatscore - Aggregate per-department telemetry into one threat score
#[derive(Parser)]
#[command(name = "threatscore")]
#[command(version = THREATSCORE_VERSION)]
#[command(about = "Aggregate department threat telemetry into a single score", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User-weighted average of department variances
    Variance {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Importance-weighted mean of department means, clamped to the score range
    Mean {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Emit synthetic threat data for testing
    Generate {
        /// What to generate
        #[arg(value_enum, default_value = "records")]
        kind: GenerateKind,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Number of user records (records only)
        #[arg(long, default_value = "100")]
        count: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Configuration file to check
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON user records
    Ndjson,
    /// JSON array of user records
    Json,
    /// Department JSON (object of records for variance, array for mean)
    Departments,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum GenerateKind {
    /// User-level records as NDJSON
    Records,
    /// Departments for the variance engine
    Departments,
    /// Weighted departments for the mean engine
    Weighted,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&ErrorReport::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging on stderr; RUST_LOG overrides the verbosity flags.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Variance {
            input,
            input_format,
            output_format,
            config,
        } => {
            let processor = load_processor(config.as_deref())?;
            let input_data = read_input(&input)?;
            let report = match input_format {
                InputFormat::Departments => {
                    let departments: BTreeMap<String, DepartmentRecord> =
                        serde_json::from_str(&input_data)?;
                    processor.variance_report(&departments)?
                }
                format => processor.variance_from_records(&parse_records(&input_data, format)?)?,
            };
            write_report(&report, &output_format)
        }

        Commands::Mean {
            input,
            input_format,
            output_format,
            config,
        } => {
            let processor = load_processor(config.as_deref())?;
            let input_data = read_input(&input)?;
            let report = match input_format {
                InputFormat::Departments => {
                    let departments: Vec<WeightedDepartment> = serde_json::from_str(&input_data)?;
                    processor.mean_report(&departments)?
                }
                format => processor.mean_from_records(&parse_records(&input_data, format)?)?,
            };
            write_report(&report, &output_format)
        }

        Commands::Generate {
            kind,
            output,
            count,
            seed,
            config,
        } => cmd_generate(kind, &output, count, seed, config.as_deref()),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            Ok(EngineConfig::load(path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_processor(path: Option<&Path>) -> Result<ScoreProcessor, CliError> {
    Ok(ScoreProcessor::with_config(load_config(path)?)?)
}

fn read_input(input: &Path) -> Result<String, CliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(input_data: &str, format: InputFormat) -> Result<Vec<UserThreatRecord>, CliError> {
    let records = match format {
        InputFormat::Ndjson => records::parse_ndjson(input_data)?,
        InputFormat::Json | InputFormat::Departments => records::parse_array(input_data)?,
    };

    if records.is_empty() {
        return Err(CliError::NoRecords);
    }

    info!(records = records.len(), "parsed user records");
    Ok(records)
}

fn write_output(output: &Path, data: &str) -> Result<(), CliError> {
    if output.to_string_lossy() == "-" {
        let mut stdout = io::stdout();
        stdout.write_all(data.as_bytes())?;
        stdout.flush()?;
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn write_report(report: &ScoreReport, format: &OutputFormat) -> Result<(), CliError> {
    let rendered = match format {
        OutputFormat::Text => format_text(report),
        OutputFormat::Json => serde_json::to_string(report)? + "\n",
        OutputFormat::JsonPretty => serde_json::to_string_pretty(report)? + "\n",
    };
    write_output(Path::new("-"), &rendered)
}

fn format_text(report: &ScoreReport) -> String {
    let mut lines = vec![
        "Threat Score Report".to_string(),
        "===================".to_string(),
        format!("Method:       {}", report.method.as_str()),
        format!("Score:        {:.2}", report.score),
    ];

    if let Some(range) = report.range {
        lines.push(format!("Range:        {} - {}", range.min, range.max));
    }
    lines.push(format!("Total weight: {}", report.total_weight));

    if !report.departments.is_empty() {
        lines.push(String::new());
        lines.push("Departments:".to_string());
        for dept in &report.departments {
            let status = if dept.included { "[OK]  " } else { "[SKIP]" };
            let statistic = dept
                .statistic
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "  {} {:<16} weight {:<8} {} {}",
                status,
                dept.name,
                dept.weight,
                report.method.as_str(),
                statistic
            ));
        }
    }

    lines.join("\n") + "\n"
}

fn cmd_generate(
    kind: GenerateKind,
    output: &Path,
    count: usize,
    seed: Option<u64>,
    config: Option<&Path>,
) -> Result<(), CliError> {
    let mut generator_config = load_config(config)?.generator;
    if seed.is_some() {
        generator_config.seed = seed;
    }
    let mut generator = ThreatScoreGenerator::from_config(&generator_config);

    let data = match kind {
        GenerateKind::Records => {
            let mut lines = Vec::with_capacity(count);
            for record in generator.random_user_records(count) {
                lines.push(serde_json::to_string(&record)?);
            }
            lines.join("\n") + "\n"
        }
        GenerateKind::Departments => {
            serde_json::to_string_pretty(&generator.random_departments()?)? + "\n"
        }
        GenerateKind::Weighted => {
            serde_json::to_string_pretty(&generator.random_weighted_departments()?)? + "\n"
        }
    };

    write_output(output, &data)
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), CliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("threatscore version {}", THREATSCORE_VERSION),
    });

    match config {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Configuration file does not exist".to_string(),
        }),
        Some(path) => match EngineConfig::load(path) {
            Ok(cfg) => {
                let range = cfg.score.range();
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Configuration valid (score range {} - {}, {} weighted departments)",
                        range.min,
                        range.max,
                        cfg.weights.importance.len()
                    ),
                });
            }
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            }),
        },
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "No configuration file given, using defaults".to_string(),
        }),
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (pass --input <file>)"
    } else {
        "stdin is a pipe (--input - ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: THREATSCORE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("threatscore Doctor Report");
        println!("=========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(CliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Compute(threatscore::ComputeError),
    Json(serde_json::Error),
    NoRecords,
    DoctorFailed,
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<threatscore::ComputeError> for CliError {
    fn from(e: threatscore::ComputeError) -> Self {
        CliError::Compute(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct ErrorReport {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CliError> for ErrorReport {
    fn from(e: CliError) -> Self {
        match e {
            CliError::Io(e) => ErrorReport {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CliError::Compute(e) => {
                let (code, hint) = match e {
                    threatscore::ComputeError::ConfigError(_)
                    | threatscore::ComputeError::InvalidScoreRange { .. } => {
                        ("CONFIG_ERROR", "Run 'threatscore doctor --config <file>'")
                    }
                    threatscore::ComputeError::ParseError(_)
                    | threatscore::ComputeError::JsonError(_)
                    | threatscore::ComputeError::MissingField(_) => {
                        ("PARSE_ERROR", "Ensure each record has user_id, department and threat_score")
                    }
                    _ => ("INVALID_INPUT", "Weights must be non-negative and scores finite"),
                };
                ErrorReport {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            CliError::Json(e) => ErrorReport {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CliError::NoRecords => ErrorReport {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            CliError::DoctorFailed => ErrorReport {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
