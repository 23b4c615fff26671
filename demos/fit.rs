//! Fits a rule list on a whitespace-separated 0/1 matrix.
//!
//! Each line of the input is one sample; the last column is the label.
//! With `--header`, the first line holds the feature names followed by the
//! name of the label column.
//!
//! Run with:
//! ```bash
//! cargo run --release --example fit -- data.txt --header --c 0.005 --max-card 2
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{bail, eyre};
use corels_rs::classifier::{Corels, Verbosity};
use corels_rs::config::{Ablation, MapType, Policy};

#[derive(Debug, Parser)]
#[command(author, version, about = "Learn a certifiably optimal rule list")]
struct Cli {
    /// Input matrix, label in the last column
    input: PathBuf,

    /// First line holds column names
    #[arg(long)]
    header: bool,

    /// Regularization per rule
    #[arg(long, default_value = "0.01")]
    c: f64,

    /// Cap on live search-tree nodes
    #[arg(long, default_value = "10000")]
    n_iter: usize,

    /// Search policy (bfs, curious, lower_bound, objective, dfs)
    #[arg(long, default_value = "lower_bound")]
    policy: Policy,

    /// Prefix map (none, prefix, captured)
    #[arg(long, default_value = "prefix")]
    map_type: MapType,

    /// Disabled bounds: 1 = support, 2 = lookahead, 4 = equivalent points
    #[arg(long, default_value = "0")]
    ablation: u8,

    /// Maximum literals per antecedent
    #[arg(long, default_value = "2")]
    max_card: usize,

    /// Minimum support fraction of an antecedent
    #[arg(long, default_value = "0.01")]
    min_support: f64,

    /// Comma-separated verbosity flags (rule, label, samples, progress, log, loud)
    #[arg(long, value_delimiter = ',', default_value = "progress")]
    verbosity: Vec<Verbosity>,

    /// Save the fitted model here
    #[arg(long)]
    save: Option<PathBuf>,
}

struct Dataset {
    features: Vec<String>,
    prediction_name: String,
    samples: Vec<Vec<u8>>,
    labels: Vec<u8>,
}

fn read_dataset(cli: &Cli) -> color_eyre::Result<Dataset> {
    let text = fs::read_to_string(&cli.input)?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let mut features = Vec::new();
    let mut prediction_name = "prediction".to_string();
    if cli.header {
        let header = lines.next().ok_or_else(|| eyre!("missing header line"))?;
        features = header.split_whitespace().map(str::to_string).collect();
        prediction_name = features.pop().ok_or_else(|| eyre!("empty header line"))?;
    }

    let mut samples = Vec::new();
    let mut labels = Vec::new();
    for (i, line) in lines.enumerate() {
        let mut row = line
            .split_whitespace()
            .map(|t| t.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| eyre!("sample {}: {}", i, e))?;
        let Some(label) = row.pop() else {
            bail!("sample {} is empty", i);
        };
        samples.push(row);
        labels.push(label);
    }

    Ok(Dataset {
        features,
        prediction_name,
        samples,
        labels,
    })
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let cli = Cli::parse();
    let data = read_dataset(&cli)?;
    println!(
        "samples = {}, features = {}",
        data.samples.len(),
        data.samples.first().map_or(0, |r| r.len())
    );

    let corels = Corels {
        c: cli.c,
        n_iter: cli.n_iter,
        map_type: cli.map_type,
        policy: cli.policy,
        verbosity: cli.verbosity.clone(),
        ablation: Ablation::from_bits(cli.ablation)?,
        max_card: cli.max_card,
        min_support: cli.min_support,
    };

    let time_fit = Instant::now();
    let model = corels.fit(&data.samples, &data.labels, &data.features, &data.prediction_name)?;
    let time_fit = time_fit.elapsed();

    println!("{}", model);
    if let Some(objective) = model.objective() {
        println!("objective = {:.6}", objective);
    }
    if let Some(stats) = model.stats() {
        println!("stats = {:?}", stats);
    }
    println!("accuracy = {:.4}", model.score(&data.samples, &data.labels)?);
    println!("fit time: {:.3} s", time_fit.as_secs_f64());

    if let Some(path) = &cli.save {
        model.save(path)?;
        println!("model saved to {}", path.display());
    }

    Ok(())
}
