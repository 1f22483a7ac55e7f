// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Marketbasket CLI
//!
//! Mine association rules from transaction tables and export rule graphs
//! and heatmaps as plot-ready JSON.

mod config;
mod logging;
mod output;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::{AppConfig, LayoutKind};
use logging::LogFormat;
use marketbasket_core::{
    demo_config, demo_dataset, run_demo, EncodedMatrix, Metric, MiningConfig, MiningPipeline,
    PrepareStats, RawTable, RuleTable,
};
use marketbasket_tasks::{MiningExecutor, TaskExecutor};
use marketbasket_viz::{
    circular_layout, ArrowPosition, Heatmap, KindStyler, RuleGraph, SpringLayout,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "marketbasket")]
#[command(author, version, about = "Association rule mining for transaction data", long_about = None)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, env = "MARKETBASKET_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Output as JSON (machine-readable)
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Mining settings that override the config file and environment
#[derive(clap::Args, Debug, Clone, Default)]
struct MiningArgs {
    /// Minimum itemset support
    #[arg(long)]
    min_support: Option<f64>,

    /// Metric threshold for the selected table
    #[arg(long)]
    threshold: Option<f64>,

    /// Largest itemset size to mine
    #[arg(long)]
    max_len: Option<usize>,

    /// Substring marking credit invoices
    #[arg(long)]
    credit_marker: Option<String>,

    /// Seconds to wait for the mining run
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mine a transaction table (JSON or .csv) and print the selected rule table
    Mine {
        /// Transactions file (JSON or .csv), or - for JSON on stdin
        input: PathBuf,

        /// Metric the rule table is filtered by
        #[arg(long, default_value = "confidence")]
        metric: Metric,

        #[command(flatten)]
        mining: MiningArgs,
    },

    /// Mine the built-in grocery dataset
    Demo {
        /// Print only this metric's table
        #[arg(long)]
        metric: Option<Metric>,
    },

    /// Export a rule graph as plot-ready JSON
    Graph {
        /// Transactions file (JSON or .csv), or - for JSON on stdin. The demo
        /// dataset when omitted
        input: Option<PathBuf>,

        #[arg(long, default_value = "lift")]
        metric: Metric,

        /// Number of rules to draw
        #[arg(long)]
        rules_to_show: Option<usize>,

        #[arg(long, value_enum)]
        layout: Option<LayoutKind>,

        /// Spring layout seed
        #[arg(long)]
        seed: Option<u64>,

        /// Arrowhead position (middle or end)
        #[arg(long)]
        arrow: Option<ArrowPosition>,

        /// Write the graph here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        mining: MiningArgs,
    },

    /// Pivot a rule table into an antecedent x consequent grid
    Heatmap {
        /// Transactions file (JSON or .csv), or - for JSON on stdin. The demo
        /// dataset when omitted
        input: Option<PathBuf>,

        #[arg(long, default_value = "lift")]
        metric: Metric,

        #[command(flatten)]
        mining: MiningArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format, cli.verbose)?;

    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Mine {
            input,
            metric,
            mining,
        } => {
            apply_mining_args(&mut config.mining, metric, &mining);
            let table = mine_file(&input, metric, &config, mining.timeout_secs).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                print!("{}", output::rule_table(&table));
            }
        }

        Commands::Demo { metric } => {
            let outcome = run_demo()?;
            if cli.json {
                match metric {
                    Some(m) => println!("{}", serde_json::to_string_pretty(outcome.table(m))?),
                    None => println!("{}", serde_json::to_string_pretty(&outcome.tables)?),
                }
            } else {
                print!("{}", output::itemsets(&outcome.itemsets));
                let metrics = metric.map_or(Metric::ALL.to_vec(), |m| vec![m]);
                for m in metrics {
                    println!();
                    print!("{}", output::rule_table(outcome.table(m)));
                }
            }
        }

        Commands::Graph {
            input,
            metric,
            rules_to_show,
            layout,
            seed,
            arrow,
            output: out_path,
            mining,
        } => {
            apply_mining_args(&mut config.mining, metric, &mining);
            if let Some(n) = rules_to_show {
                config.graph.rules_to_show = n;
            }
            if let Some(kind) = layout {
                config.graph.layout = kind;
            }
            if let Some(seed) = seed {
                config.graph.seed = seed;
            }
            if let Some(position) = arrow {
                config.graph.edge.arrow_position = Some(position);
            }

            let table = load_table(input.as_deref(), metric, &config, &mining).await?;
            let graph = RuleGraph::from_table(&table, config.graph.rules_to_show);
            let positions = match config.graph.layout {
                LayoutKind::Circular => circular_layout(&graph),
                LayoutKind::Spring => SpringLayout::default()
                    .with_seed(config.graph.seed)
                    .with_iterations(config.graph.iterations)
                    .layout(&graph),
            };
            let render = graph.render(&positions, &KindStyler::default(), &config.graph.edge)?;
            info!(
                nodes = render.nodes.len(),
                skipped_edges = render.skipped_edges,
                "Rendered rule graph"
            );

            let json = serde_json::to_string_pretty(&render)?;
            match out_path {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write graph to {:?}", path))?;
                    println!("✓ Graph written to {:?}", path);
                }
                None => println!("{}", json),
            }
        }

        Commands::Heatmap {
            input,
            metric,
            mining,
        } => {
            apply_mining_args(&mut config.mining, metric, &mining);
            let table = load_table(input.as_deref(), metric, &config, &mining).await?;
            let heatmap = Heatmap::from_table(&table)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&heatmap)?);
            } else {
                print!("{}", output::heatmap(&heatmap));
            }
        }
    }

    Ok(())
}

fn apply_mining_args(mining: &mut MiningConfig, metric: Metric, args: &MiningArgs) {
    if let Some(v) = args.min_support {
        mining.min_support = v;
    }
    if let Some(v) = args.threshold {
        *mining = std::mem::take(mining).with_threshold(metric, v);
    }
    if let Some(v) = args.max_len {
        mining.max_len = Some(v);
    }
    if let Some(marker) = &args.credit_marker {
        mining.credit_marker = marker.clone();
    }
}

/// Rule table for a transactions file, or the demo dataset's table
async fn load_table(
    input: Option<&Path>,
    metric: Metric,
    config: &AppConfig,
    args: &MiningArgs,
) -> Result<RuleTable> {
    match input {
        Some(path) => mine_file(path, metric, config, args.timeout_secs).await,
        None => {
            info!("No input given, using the demo dataset");
            Ok(mine_demo(metric, args)?)
        }
    }
}

/// Demo baskets mined with the demo thresholds, overridden by any flags
fn mine_demo(metric: Metric, args: &MiningArgs) -> marketbasket_core::Result<RuleTable> {
    let mut mining = demo_config();
    apply_mining_args(&mut mining, metric, args);
    let matrix = EncodedMatrix::from_baskets(demo_dataset())?;
    let outcome = MiningPipeline::new(mining)?.run_matrix(&matrix, PrepareStats::default())?;
    Ok(outcome.tables.into_table(metric))
}

async fn mine_file(
    path: &Path,
    metric: Metric,
    config: &AppConfig,
    timeout_secs: Option<u64>,
) -> Result<RuleTable> {
    let payload = read_input(path)?;
    if payload.trim().is_empty() {
        bail!("Input {:?} is empty", path);
    }

    let executor = MiningExecutor::new(config.mining.clone(), config.tasks.clone())?;
    let timeout = timeout_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.tasks.default_timeout());

    info!(?path, %metric, bytes = payload.len(), "Submitting mining run");
    let handle = executor.submit(payload, metric);
    let result = executor.wait(handle, timeout).await?;
    let table: RuleTable =
        serde_json::from_str(&result).context("Failed to decode mining result")?;
    Ok(table)
}

/// Serialized transactions for the executor. `.csv` files are converted
/// to the JSON column layout; anything else is read as JSON.
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read transactions from stdin")?;
        return Ok(buf);
    }

    if is_csv(path) {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open transactions {:?}", path))?;
        let table = RawTable::from_csv_reader(file)
            .with_context(|| format!("Failed to parse CSV transactions {:?}", path))?;
        return Ok(table.to_json_string()?);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read transactions {:?}", path))
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
