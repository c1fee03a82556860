mod calc;
mod report;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use calc::{Request, evaluate};
use dma_values::{EngineConfig, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Mixed fractions such as "1 1/2"
    Rational,
    /// Dice expressions such as "2d6+1"
    Dice,
    Distance,
    Area,
    Duration,
    Volume,
    Weight,
    Money,
    /// Cost and adjustment expressions such as "[magic armor(2)]"
    Expression,
    /// Leading comment blocks
    Comment,
}

impl Mode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rational => "rational",
            Self::Dice => "dice",
            Self::Distance => "distance",
            Self::Area => "area",
            Self::Duration => "duration",
            Self::Volume => "volume",
            Self::Weight => "weight",
            Self::Money => "money",
            Self::Expression => "expression",
            Self::Comment => "comment",
        }
    }

    /// The value kind read by measurement modes.
    pub const fn value_kind(self) -> Option<ValueKind> {
        match self {
            Self::Distance => Some(ValueKind::Distance),
            Self::Area => Some(ValueKind::Area),
            Self::Duration => Some(ValueKind::Duration),
            Self::Volume => Some(ValueKind::Volume),
            Self::Weight => Some(ValueKind::Weight),
            Self::Money => Some(ValueKind::Money),
            Self::Rational | Self::Dice | Self::Expression | Self::Comment => None,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "dma-calc", version = "0.1.0")]
#[command(about = "Read, convert and roll DMA values from the command line")]
struct Args {
    /// How to read the input
    #[arg(long, value_enum, default_value_t = Mode::Rational)]
    mode: Mode,

    /// Text to evaluate
    input: String,

    /// Convert measurements to this unit set (e.g. metric, feet, gallons)
    #[arg(long)]
    to: Option<String>,

    /// Redistribute measurements over the units of their set
    #[arg(long)]
    simplify: bool,

    /// Number of times to roll dice (dice mode only)
    #[arg(long, default_value_t = 0)]
    rolls: usize,

    /// Seed for dice rolls, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Base price that expressions apply to (expression mode only)
    #[arg(long)]
    base: Option<String>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let request = Request {
        input: args.input.clone(),
        to: args.to.clone(),
        simplify: args.simplify,
        rolls: args.rolls,
        seed: args.seed,
        base: args.base.clone(),
    };
    let calculation = evaluate(args.mode, &request, &config)?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => report::generate_json_report(output_target.writer(), &calculation)?,
        _ => report::generate_console_report(output_target.writer(), &calculation)?,
    }
    output_target.flush_inner()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = EngineConfig::from_json(&json)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    log::debug!("loaded configuration from {}", path.display());
    Ok(config)
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
