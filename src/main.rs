use clap::{Parser, ValueEnum};
use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};
use log::{error, info};
use std::env;
use std::process::ExitCode;
use std::rc::Rc;

use dslab_multicluster::config::SimulationConfig;
use dslab_multicluster::error::GymError;
use dslab_multicluster::metrics::printer::print_metrics;
use dslab_multicluster::simulation_callbacks::{
    EpisodeCallbacks, FirstFeasibleCallbacks, RandomMaskedCallbacks, RejectAllCallbacks,
};
use dslab_multicluster::simulator::MultiClusterSimulation;

const MAX_LOG_FILE_SIZE: usize = 100 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    Random,
    FirstFit,
    Reject,
}

#[derive(Parser)]
struct Args {
    #[clap(short, long)]
    config_file: std::path::PathBuf,
    #[clap(short, long, default_value_t = 1)]
    episodes: u64,
    #[clap(short, long, value_enum, default_value_t = Policy::Random)]
    policy: Policy,
}

fn init_logger(logs_filepath: &Option<String>) {
    // log level INFO by default
    let mut env_logger_builder = env_logger::builder();
    if env::var("RUST_LOG").is_err() {
        env_logger_builder.filter_level(log::LevelFilter::Info);
    }
    if let Some(path) = logs_filepath {
        let log_file = FileRotate::new(
            path,
            AppendCount::new(MAX_LOG_FILES),
            ContentLimit::Bytes(MAX_LOG_FILE_SIZE),
            Compression::None,
            #[cfg(unix)]
            None,
        );
        env_logger_builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    env_logger_builder.init();
}

fn run(args: Args) -> Result<(), GymError> {
    let config_yaml = std::fs::read_to_string(&args.config_file)?;
    let config = Rc::new(SimulationConfig::from_yaml(&config_yaml)?);
    init_logger(&config.logs_filepath);

    info!(
        "Path to config file: {:?}",
        args.config_file.canonicalize()?
    );
    info!(
        "Simulation {}: {} episodes with {:?} policy",
        config.sim_name, args.episodes, args.policy
    );

    let mut callbacks: Box<dyn EpisodeCallbacks> = match args.policy {
        Policy::Random => Box::new(RandomMaskedCallbacks {}),
        Policy::FirstFit => Box::new(FirstFeasibleCallbacks {}),
        Policy::Reject => Box::new(RejectAllCallbacks {}),
    };

    let mut simulation = MultiClusterSimulation::new(config.clone())?;
    simulation.run_with_callbacks(callbacks.as_mut(), args.episodes);

    if let Some(printer_config) = &config.metrics_printer {
        print_metrics(simulation.summaries(), printer_config)?;
        info!("Metrics written to {:?}", printer_config.output_file);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // logger may be not initialized if config failed to load
            if log::log_enabled!(log::Level::Error) {
                error!("{}", err);
            } else {
                eprintln!("error: {}", err);
            }
            ExitCode::FAILURE
        }
    }
}
