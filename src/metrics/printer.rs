use prettytable::{row, Table};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Write};

use crate::error::GymError;
use crate::metrics::collector::EstimatorWrapper;
use crate::metrics::results::EpisodeSummary;

#[derive(Debug, Default, Deserialize, PartialEq)]
pub enum OutputFormat {
    #[default]
    JSON,
    PrettyTable,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct MetricsPrinterConfig {
    pub format: OutputFormat,
    pub output_file: std::path::PathBuf,
}

pub fn print_metrics(
    summaries: &[EpisodeSummary],
    config: &MetricsPrinterConfig,
) -> Result<(), GymError> {
    match config.format {
        OutputFormat::PrettyTable => print_metrics_as_pretty_table(summaries, &config.output_file),
        OutputFormat::JSON => print_metrics_as_json(summaries, &config.output_file),
    }
}

/// Statistics of one episode metric across all printed episodes.
#[derive(Serialize)]
struct MetricStats {
    min: f64,
    max: f64,
    mean: f64,
    variance: f64,
}

impl MetricStats {
    fn collect<F: Fn(&EpisodeSummary) -> f64>(summaries: &[EpisodeSummary], metric: F) -> Self {
        let mut stats = EstimatorWrapper::new();
        for summary in summaries {
            stats.add(metric(summary));
        }
        Self {
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            variance: stats.population_variance(),
        }
    }
}

#[derive(Serialize)]
struct AggregatedStats {
    reward: MetricStats,
    ep_block_prob: MetricStats,
    avg_latency: MetricStats,
    avg_cost: MetricStats,
    avg_cpu_cluster_selected: MetricStats,
    gini: MetricStats,
    execution_time: MetricStats,
}

impl AggregatedStats {
    fn new(summaries: &[EpisodeSummary]) -> Self {
        Self {
            reward: MetricStats::collect(summaries, |s| s.reward),
            ep_block_prob: MetricStats::collect(summaries, |s| s.ep_block_prob),
            avg_latency: MetricStats::collect(summaries, |s| s.avg_latency),
            avg_cost: MetricStats::collect(summaries, |s| s.avg_cost),
            avg_cpu_cluster_selected: MetricStats::collect(summaries, |s| s.avg_cpu_cluster_selected),
            gini: MetricStats::collect(summaries, |s| s.gini),
            execution_time: MetricStats::collect(summaries, |s| s.execution_time),
        }
    }

    fn named(&self) -> [(&'static str, &MetricStats); 7] {
        [
            ("Reward", &self.reward),
            ("Block probability", &self.ep_block_prob),
            ("Latency", &self.avg_latency),
            ("Cost", &self.avg_cost),
            ("Cpu usage of selected clusters", &self.avg_cpu_cluster_selected),
            ("Gini", &self.gini),
            ("Execution time", &self.execution_time),
        ]
    }
}

pub fn print_metrics_as_pretty_table(
    summaries: &[EpisodeSummary],
    output_file: &std::path::PathBuf,
) -> Result<(), GymError> {
    let mut metrics_file = File::create(output_file)?;

    let mut episodes_table = Table::new();
    episodes_table.add_row(row![
        "Episode", "Reward", "Block prob", "Accepted", "Rejected", "All", "FFD", "FFI", "BF1B1",
        "Latency", "Cost", "Cpu %", "Gini", "Time"
    ]);
    for s in summaries {
        episodes_table.add_row(row![
            s.episode,
            format!("{:.2}", s.reward),
            format!("{:.2}", s.ep_block_prob),
            s.ep_accepted_requests,
            s.ep_rejected_requests,
            s.ep_deploy_all,
            s.ep_ffd,
            s.ep_ffi,
            s.ep_bf1b1,
            format!("{:.2}", s.avg_latency),
            format!("{:.2}", s.avg_cost),
            format!("{:.2}", s.avg_cpu_cluster_selected),
            format!("{:.2}", s.gini),
            format!("{:.3}", s.execution_time)
        ]);
    }

    let mut stats_table = Table::new();
    stats_table.add_row(row!["Metric", "Min", "Max", "Mean", "Variance"]);
    for (name, stats) in AggregatedStats::new(summaries).named() {
        stats_table.add_row(row![name, stats.min, stats.max, stats.mean, stats.variance]);
    }

    episodes_table.print(&mut metrics_file)?;
    stats_table.print(&mut metrics_file)?;
    Ok(())
}

#[derive(Serialize)]
struct MetricsJSON<'a> {
    episodes: &'a [EpisodeSummary],
    stats: AggregatedStats,
}

pub fn print_metrics_as_json(
    summaries: &[EpisodeSummary],
    output_file: &std::path::PathBuf,
) -> Result<(), GymError> {
    let mut metrics_file = File::create(output_file)?;

    let metrics = MetricsJSON {
        episodes: summaries,
        stats: AggregatedStats::new(summaries),
    };

    let serialized_json = serde_json::to_string_pretty(&metrics)?;
    metrics_file.write_all(serialized_json.as_bytes())?;
    Ok(())
}
