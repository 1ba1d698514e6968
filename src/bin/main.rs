use std::{fs::File, path::PathBuf};

use anyhow::Context;
use ngsim_trajectories::{frame, NormalizerConfig, TrajectoryNormalizer};
use polars::prelude::*;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "ngsim-transform",
    about = "Elapsed time, preceding vehicle and metric units for NGSIM trajectories"
)]
struct Opt {
    /// Path to the trajectories parquet file
    #[structopt(short, long, parse(from_os_str))]
    input: PathBuf,
    /// TOML configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Keep the original units
    #[structopt(long)]
    keep_units: bool,
    /// Carry the lateral position of the preceding vehicle
    #[structopt(long)]
    preceding_local_x: bool,
    /// Print the trajectory of a vehicle
    #[structopt(short, long)]
    vehicle: Option<i64>,
    /// Print a summary of the normalized table
    #[structopt(short, long)]
    summary: bool,
    /// Path to the normalized parquet file
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let mut config = match &opt.config {
        Some(path) => NormalizerConfig::from_path(path)
            .with_context(|| format!("Failed to load configuration from {path:?}"))?,
        None => NormalizerConfig::default(),
    };
    if opt.keep_units {
        config = config.unit_conversion(None);
    }
    if opt.preceding_local_x {
        config = config.preceding_local_x(true);
    }

    log::info!("Loading {:?}...", opt.input);
    let file =
        File::open(&opt.input).with_context(|| format!("Failed to open {:?}", opt.input))?;
    let df = frame::clean_names(ParquetReader::new(file).finish()?)?;
    log::info!("... {:?} records", df.shape());

    let observations = frame::observations_from_frame(&df, &config.columns)?;
    let table = TrajectoryNormalizer::new(config).normalize(observations)?;

    if opt.summary {
        table.summary();
    }
    if let Some(vehicle_id) = opt.vehicle {
        let trajectory = table
            .vehicle(vehicle_id)
            .with_context(|| format!("Vehicle #{vehicle_id} is not in the table"))?;
        println!("{:>8} {:>10} {:>10}", "TIME", "VELOCITY", "PRECEDING");
        for record in trajectory.records() {
            println!(
                "{:>8.1} {:>10.2} {:>10}",
                record.time().unwrap_or_default(),
                record.observation.velocity,
                record
                    .preceding_velocity()
                    .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
            );
        }
    }

    let mut out = table.to_frame()?;
    println!("{}", out.head(None));
    if let Some(path) = opt.output {
        let mut file = File::create(&path).with_context(|| format!("Failed to create {path:?}"))?;
        ParquetWriter::new(&mut file).finish(&mut out)?;
        log::info!("Normalized table written to {path:?}");
    }

    Ok(())
}
