use std::path::PathBuf;

use clap::{AppSettings, Parser};
use log::{debug, info, warn};

use oifits::{Dataset, DuplicatePolicy, MergeConfig, OifitsError};

#[derive(Parser)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_long_args = true)]
struct Args {
    /// The OIFITS files to read. Each is validated, then they are merged left
    /// to right.
    inputs: Vec<PathBuf>,

    /// Where to write the merged data. If not given, nothing is written.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Treat targets with the same name as the same target when merging.
    #[clap(long)]
    match_target_by_name: bool,

    /// Treat stations with the same name (in arrays with the same name) as
    /// the same station when merging.
    #[clap(long)]
    match_station_by_name: bool,

    /// Measurements that differ only by their timestamps are duplicates when
    /// merging.
    #[clap(long)]
    ignore_time_duplicates: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), OifitsError> {
    let args = Args::parse();
    setup_logging(args.verbosity);

    let config = MergeConfig {
        match_target_by_name: args.match_target_by_name,
        match_station_by_name: args.match_station_by_name,
        duplicates: if args.ignore_time_duplicates {
            DuplicatePolicy::IgnoreTime
        } else {
            DuplicatePolicy::ExactValue
        },
    };
    debug!("Merge config: {config:?}");

    let mut merged: Option<Dataset> = None;
    for input in &args.inputs {
        info!("Reading {}", input.display());
        let dataset = Dataset::from_file(input)?;
        info!(
            "{}: {} wavelength tables, {} targets, {} arrays, {} measurements",
            input.display(),
            dataset.wavelengths.len(),
            dataset.targets.len(),
            dataset.arrays.len(),
            dataset.num_measurements()
        );
        let validation = dataset.validate();
        if !validation.is_valid() {
            warn!(
                "{} isn't valid ({} errors, {} warnings)",
                input.display(),
                validation.errors.len(),
                validation.warnings.len()
            );
        }

        merged = Some(match merged {
            None => dataset,
            Some(base) => base.combine(&dataset, &config)?,
        });
    }

    let merged = match merged {
        Some(merged) => merged,
        None => {
            info!("No inputs; nothing to do");
            return Ok(());
        }
    };
    if args.inputs.len() > 1 {
        info!(
            "Merged: {} wavelength tables, {} targets, {} arrays, {} measurements",
            merged.wavelengths.len(),
            merged.targets.len(),
            merged.arrays.len(),
            merged.num_measurements()
        );
        if !merged.validate().is_valid() {
            warn!("The merged data isn't valid; it will still be written if consistent");
        }
    }

    if let Some(output) = args.output {
        merged.to_file(&output)?;
        info!("Wrote {}", output.display());
    }
    Ok(())
}

fn setup_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.init();
}
