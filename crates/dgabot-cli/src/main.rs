mod display;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use dgabot_ai::{ClassifierOptions, DgaClassifier};
use dgabot_core::{EncodingConfig, Prediction, encode_domain};
use tracing_subscriber::EnvFilter;

use display::{FileReport, Format};

/// Domains scored by `demo` before the sample files.
const DEMO_DOMAINS: [&str; 3] = ["google.com", "asdhcvuagq.com", "correcthorsebatterystaple.com"];

#[derive(Parser)]
#[command(name = "dgabot", version, about = "Score domain names for DGA likelihood with a pretrained model")]
struct Cli {
    /// ONNX model file.
    #[arg(long, global = true, env = "DGABOT_MODEL", default_value = "models/dga-bot.onnx")]
    model: PathBuf,

    /// JSON encoding config (max_len, pad_value, padding, truncating, ordinals, max_ordinal).
    #[arg(long, global = true, env = "DGABOT_CONFIG")]
    config: Option<PathBuf>,

    /// Intra-op threads for ONNX Runtime.
    #[arg(long, global = true, env = "DGABOT_THREADS")]
    threads: Option<usize>,

    #[arg(long, global = true, env = "DGABOT_FORMAT", value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score domains given on the command line.
    Predict {
        #[arg(required = true)]
        domains: Vec<String>,
    },
    /// Score every line of one or more domain files.
    File {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print encoded model input rows without loading a model.
    Encode {
        #[arg(required = true)]
        domains: Vec<String>,
    },
    /// Score three example domains, then the two sample files.
    Demo {
        #[arg(long, default_value = "sample_dga.txt")]
        dga_file: PathBuf,
        #[arg(long, default_value = "sample_legit.txt")]
        legit_file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("dgabot v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let encoding = load_encoding(cli.config.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Encode { domains } => {
            let rows = domains
                .iter()
                .map(|d| encode_domain(d, &encoding).with_context(|| format!("encoding {d:?}")))
                .collect::<anyhow::Result<Vec<_>>>()?;
            display::write_encoded(&mut out, &domains, &rows, cli.format)?;
        }
        Command::Predict { domains } => {
            let mut classifier = load_classifier(&cli.model, encoding, cli.threads)?;
            let predictions = classifier
                .classify(domains.as_slice())
                .context("scoring domains")?;
            display::write_predictions(&mut out, &predictions, cli.format)?;
        }
        Command::File { paths } => {
            let mut classifier = load_classifier(&cli.model, encoding, cli.threads)?;
            let reports = paths
                .iter()
                .map(|path| score_file(&mut classifier, path))
                .collect::<anyhow::Result<Vec<_>>>()?;
            display::write_reports(&mut out, &reports, cli.format)?;
        }
        Command::Demo {
            dga_file,
            legit_file,
        } => {
            // Loading is the slow step; the scoring calls after it are fast.
            let mut classifier = load_classifier(&cli.model, encoding, cli.threads)?;
            let (predictions, reports) = run_demo(&mut classifier, &dga_file, &legit_file)?;
            display::write_predictions(&mut out, &predictions, cli.format)?;
            display::write_reports(&mut out, &reports, cli.format)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn load_encoding(path: Option<&Path>) -> anyhow::Result<EncodingConfig> {
    match path {
        Some(path) => EncodingConfig::from_json_file(path).context("loading encoding config"),
        None => Ok(EncodingConfig::default()),
    }
}

fn load_classifier(
    model: &Path,
    encoding: EncodingConfig,
    intra_threads: Option<usize>,
) -> anyhow::Result<DgaClassifier> {
    let options = ClassifierOptions {
        encoding,
        intra_threads,
    };
    DgaClassifier::load_with(model, options).with_context(|| format!("loading model {}", model.display()))
}

fn score_file(classifier: &mut DgaClassifier, path: &Path) -> anyhow::Result<FileReport> {
    let predictions = classifier
        .classify_file(path)
        .with_context(|| format!("scoring {}", path.display()))?;
    Ok(FileReport {
        path: path.display().to_string(),
        predictions,
    })
}

/// Score [`DEMO_DOMAINS`], then both sample files.
fn run_demo(
    classifier: &mut DgaClassifier,
    dga_file: &Path,
    legit_file: &Path,
) -> anyhow::Result<(Vec<Prediction>, Vec<FileReport>)> {
    let predictions = classifier
        .classify(&DEMO_DOMAINS)
        .context("scoring example domains")?;
    let reports = [dga_file, legit_file]
        .into_iter()
        .map(|path| score_file(classifier, path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok((predictions, reports))
}
