use anyhow::Context;
use clap::Parser;
use generator::profile::FeedConfig;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::RecorderConfig;
use workflow::runner::SessionRunner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Rear-view radar detection recorder")]
struct Args {
    /// Print the live detection stream to the console
    #[arg(long, default_value_t = false)]
    print_stream: bool,
    /// Append the live detection stream to the trace file
    #[arg(long, default_value_t = false)]
    write_stream: bool,
    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long, value_parser = parse_runtime)]
    runtime: Option<f64>,
    /// YAML file holding calibration, thresholds and output paths
    #[arg(long, default_value = "recorder.yaml")]
    config: PathBuf,
    #[arg(long, allow_hyphen_values = true)]
    calib_slope: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    calib_offset: Option<f64>,
    #[arg(long)]
    dist_low: Option<f64>,
    #[arg(long)]
    dist_high: Option<f64>,
    /// Newline-delimited JSON summaries are appended here
    #[arg(long)]
    summary_path: Option<PathBuf>,
    #[arg(long)]
    trace_path: Option<PathBuf>,
    /// Write the merged configuration back to --config before starting
    #[arg(long, default_value_t = false)]
    save_config: bool,
    /// Maximum simultaneous vehicles in the synthetic feed
    #[arg(long, default_value_t = 3)]
    targets: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl Args {
    fn overrides(&self) -> RecorderConfig {
        RecorderConfig {
            calib_slope: self.calib_slope,
            calib_offset: self.calib_offset,
            dist_low: self.dist_low,
            dist_high: self.dist_high,
            summary_path: self.summary_path.clone(),
            trace_path: self.trace_path.clone(),
        }
    }
}

fn parse_runtime(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("`{}` is not a number", raw))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err("runtime must be positive".to_string())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = RecorderConfig::load_or_default(&args.config)?;
    config.merge(args.overrides());
    if args.save_config {
        config.save(&args.config)?;
    }

    let settings = config.to_pipeline_settings(args.print_stream, args.write_stream);
    let feed = FeedConfig {
        max_targets: args.targets,
        seed: args.seed,
        ..Default::default()
    };
    let runner = SessionRunner::new(settings, feed, args.runtime.map(Duration::from_secs_f64));

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating recorder runtime")?;
    let report = runtime.block_on(runner.execute())?;

    println!(
        "Session finished -> accepted {}, rejected {}, summaries {}, write failures {}{}",
        report.metrics.accepted,
        report.metrics.rejected,
        report.metrics.summaries_written,
        report.metrics.write_failures,
        if report.interrupted { " (interrupted)" } else { "" }
    );

    Ok(())
}
