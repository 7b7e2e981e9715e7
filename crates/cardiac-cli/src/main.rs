use anyhow::{anyhow, Context, Result};
use cardiac_lib::{
    config::AnalysisConfig,
    detectors::{beats::detect_beats_with_config, segment::segment_with_config},
    io::{csv as csv_io, text as text_io},
    metrics::rhythm::aggregate_with_config,
    pipeline::{analyze, AnalysisReport},
    signal::{label_agreement, point_at, BeatIndices, SegmentSummary, Signal},
    synth::{generate, Archetype},
};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufWriter, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "cardiac",
    version,
    about = "Single-lead ECG beat detection, segmentation and rhythm statistics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the signal comes from: a CSV/text file, stdin, or the synthetic generator.
#[derive(Args)]
struct InputArgs {
    /// Two-column time/voltage CSV (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Input is one voltage value per line, sampled at --fs
    #[arg(long)]
    voltage_only: bool,
    #[arg(long, default_value_t = 250.0)]
    fs: f64,
    /// Analyse a generated signal instead of reading input
    #[arg(long, conflicts_with = "input")]
    synthetic: Option<Archetype>,
    #[arg(long, default_value_t = 10.0)]
    duration: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Args)]
struct ConfigArgs {
    /// TOML file with [detector], [segmenter] and [statistics] tables
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    threshold_scale: Option<f64>,
    #[arg(long)]
    refractory_s: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect beat sample indices
    Detect {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Label every sample as baseline, p, qrs or t
    Segment {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Rhythm statistics (rate, SDNN, RMSSD, RR range)
    Stats {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Run detection → segmentation → statistics in one shot
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        config: ConfigArgs,
        /// Newline-delimited beat indices to use instead of detection
        #[arg(long)]
        beats: Option<PathBuf>,
        /// Omit the per-sample arrays
        #[arg(long)]
        summary: bool,
    },
    /// Show the sample nearest to a time
    Inspect {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        config: ConfigArgs,
        /// Query time in seconds
        #[arg(long)]
        at: f64,
    },
    /// Write a synthetic recording as time,voltage,segment CSV
    Synth {
        #[arg(long, default_value = "normal")]
        archetype: Archetype,
        #[arg(long, default_value_t = 10.0)]
        duration: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Compare heuristic segmentation against synthetic ground truth
    Compare {
        #[arg(long, default_value = "normal")]
        archetype: Archetype,
        #[arg(long, default_value_t = 10.0)]
        duration: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Detect { input, config } => cmd_detect(&input, &config)?,
        Commands::Segment { input, config } => cmd_segment(&input, &config)?,
        Commands::Stats { input, config } => cmd_stats(&input, &config)?,
        Commands::Analyze {
            input,
            config,
            beats,
            summary,
        } => cmd_analyze(&input, &config, beats.as_deref(), summary)?,
        Commands::Inspect { input, config, at } => cmd_inspect(&input, &config, at)?,
        Commands::Synth {
            archetype,
            duration,
            seed,
            out,
        } => cmd_synth(archetype, duration, seed, out.as_deref())?,
        Commands::Compare {
            archetype,
            duration,
            seed,
            config,
        } => cmd_compare(archetype, duration, seed, &config)?,
    }
    Ok(())
}

fn read_text(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn load_signal(args: &InputArgs) -> Result<Signal> {
    if let Some(archetype) = args.synthetic {
        info!(
            "generating {} for {} s (seed {})",
            archetype, args.duration, args.seed
        );
        return Ok(generate(archetype, args.duration, args.seed).signal);
    }
    let text = read_text(args.input.as_deref())?;
    if args.voltage_only {
        text_io::parse_voltage_signal(&text, args.fs)
    } else {
        let parsed = csv_io::parse_signal_csv(&text)?;
        if parsed.dropped_rows > 0 {
            info!("dropped {} malformed rows", parsed.dropped_rows);
        }
        Ok(parsed.signal)
    }
}

fn load_config(args: &ConfigArgs) -> Result<AnalysisConfig> {
    let mut cfg = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(scale) = args.threshold_scale {
        cfg.detector.threshold_scale = scale;
    }
    if let Some(refractory) = args.refractory_s {
        cfg.detector.refractory_s = refractory;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn cmd_detect(input: &InputArgs, config: &ConfigArgs) -> Result<()> {
    let cfg = load_config(config)?;
    let signal = load_signal(input)?;
    let beats = detect_beats_with_config(&signal, &cfg.detector);
    print_json(&beats)
}

fn cmd_segment(input: &InputArgs, config: &ConfigArgs) -> Result<()> {
    let cfg = load_config(config)?;
    let signal = load_signal(input)?;
    let beats = detect_beats_with_config(&signal, &cfg.detector);
    let segments = segment_with_config(&signal, &beats, &cfg.segmenter);
    print_json(&segments)
}

fn cmd_stats(input: &InputArgs, config: &ConfigArgs) -> Result<()> {
    let cfg = load_config(config)?;
    let signal = load_signal(input)?;
    let beats = detect_beats_with_config(&signal, &cfg.detector);
    let stats = aggregate_with_config(&beats, signal.time(), &cfg.statistics);
    print_json(&stats)
}

fn cmd_analyze(
    input: &InputArgs,
    config: &ConfigArgs,
    beats: Option<&Path>,
    summary: bool,
) -> Result<()> {
    let cfg = load_config(config)?;
    let signal = load_signal(input)?;
    let report = match beats {
        Some(path) => {
            let indices = text_io::read_beat_indices(path)?;
            if let Some(&last) = indices.last() {
                if last >= signal.len() {
                    return Err(anyhow!(
                        "beat index {} out of range for {} samples",
                        last,
                        signal.len()
                    ));
                }
            }
            AnalysisReport::from_beats(&signal, BeatIndices::from_indices(indices), &cfg)
        }
        None => analyze(&signal, &cfg),
    };
    if summary {
        print_json(&report.summary())
    } else {
        print_json(&report)
    }
}

fn cmd_inspect(input: &InputArgs, config: &ConfigArgs, at: f64) -> Result<()> {
    if !at.is_finite() {
        return Err(anyhow!("--at must be a finite time in seconds, got {at}"));
    }
    let cfg = load_config(config)?;
    let signal = load_signal(input)?;
    let report = analyze(&signal, &cfg);
    let point = point_at(&signal, &report.segments, at)
        .ok_or_else(|| anyhow!("signal has no samples to inspect"))?;
    print_json(&point)
}

fn cmd_synth(archetype: Archetype, duration: f64, seed: u64, out: Option<&Path>) -> Result<()> {
    let rec = generate(archetype, duration, seed);
    match out {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            csv_io::write_signal_csv(BufWriter::new(file), &rec.signal, &rec.segments)?;
            info!("wrote {} samples to {}", rec.signal.len(), path.display());
        }
        None => csv_io::write_signal_csv(io::stdout().lock(), &rec.signal, &rec.segments)?,
    }
    Ok(())
}

#[derive(Serialize)]
struct Comparison {
    archetype: Archetype,
    sample_count: usize,
    detected_beats: usize,
    agreement: f64,
    truth: SegmentSummary,
    detected: SegmentSummary,
}

fn cmd_compare(archetype: Archetype, duration: f64, seed: u64, config: &ConfigArgs) -> Result<()> {
    let cfg = load_config(config)?;
    let rec = generate(archetype, duration, seed);
    let report = analyze(&rec.signal, &cfg);
    print_json(&Comparison {
        archetype,
        sample_count: rec.signal.len(),
        detected_beats: report.beats.len(),
        agreement: label_agreement(&report.segments, &rec.segments),
        truth: SegmentSummary::from_labels(&rec.segments),
        detected: SegmentSummary::from_labels(&report.segments),
    })
}
