use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use medoids_cluster::{ClaraConfig, InitStrategy, KMedoidsConfig, KMedoidsModel, Method, OptimizeConfig};
use medoids_distance::Metric;
use medoids_io::{ExperimentName, FeatureDataset, FeatureReader, ResultWriter};

#[derive(Parser)]
#[command(name = "medoids")]
#[command(about = "Partition samples into clusters around representative medoids")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Shared input and output locations.
#[derive(Args, Debug, Clone)]
struct IoArgs {
    /// Path to the input CSV file (sample_id followed by feature columns)
    #[arg(long)]
    data: PathBuf,

    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

/// Shared tuning parameters for medoid fitting.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// Distance metric: euclidean, sqeuclidean, manhattan, cosine, chebyshev, or precomputed
    #[arg(long, default_value = "euclidean")]
    metric: String,

    /// Initialization strategy: random, heuristic, or k-medoids++
    #[arg(long, default_value = "heuristic")]
    init: String,

    /// Maximum refinement iterations
    #[arg(long, default_value_t = 300)]
    max_iter: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Cluster samples into k groups around medoids
    Cluster {
        #[command(flatten)]
        io: IoArgs,

        /// Number of clusters
        #[arg(long)]
        k: usize,

        /// Medoid update rule: alternating or pam
        #[arg(long, default_value = "alternating")]
        method: String,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Cluster a large dataset by running PAM on random subsamples
    Clara {
        #[command(flatten)]
        io: IoArgs,

        /// Number of clusters
        #[arg(long)]
        k: usize,

        /// Rows per subsample (defaults to min(n, 40 + 2k))
        #[arg(long)]
        n_sampling: Option<usize>,

        /// Number of subsampling rounds
        #[arg(long, default_value_t = 5)]
        n_sampling_iter: usize,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Run clustering for a range of k values to find the cluster count
    Optimize {
        #[command(flatten)]
        io: IoArgs,

        /// Minimum number of clusters to try
        #[arg(long)]
        min_k: usize,

        /// Maximum number of clusters to try
        #[arg(long)]
        max_k: usize,

        /// Medoid update rule: alternating or pam
        #[arg(long, default_value = "alternating")]
        method: String,

        /// Compute silhouette scores alongside inertia
        #[arg(long, default_value_t = false)]
        silhouette: bool,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Assign new samples to the clusters of a saved model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        io: IoArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct ClusterOutput {
    experiment: String,
    k: usize,
    metric: String,
    method: String,
    inertia: f64,
    n_samples: usize,
    converged: bool,
    iterations: usize,
    medoid_ids: Vec<String>,
    cluster_sizes: Vec<usize>,
    n_warnings: usize,
    artifact: PathBuf,
    model: PathBuf,
}

#[derive(Serialize)]
struct OptimizeOutput {
    experiment: String,
    n_samples: usize,
    best_k: Option<usize>,
    best_k_by_silhouette: Option<usize>,
    results: Vec<KResultOutput>,
}

#[derive(Serialize)]
struct KResultOutput {
    k: usize,
    inertia: f64,
    silhouette: Option<f64>,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_samples: usize,
    model_k: usize,
    model_metric: String,
    cluster_counts: Vec<usize>,
}

fn read_dataset(io: &IoArgs) -> Result<(ExperimentName, FeatureDataset)> {
    let experiment = ExperimentName::new(io.experiment.clone())?;
    let dataset = FeatureReader::new(&io.data)
        .read()
        .context("failed to read input CSV")?;
    info!(n_samples = dataset.n_samples(), n_features = dataset.n_features(), "dataset loaded");
    Ok((experiment, dataset))
}

/// Write the cluster artifact and model binary, then print the stdout summary.
fn finish_fit(
    io: IoArgs,
    experiment: ExperimentName,
    dataset: &FeatureDataset,
    model: &KMedoidsModel,
) -> Result<()> {
    let writer = ResultWriter::new(&io.output_dir, experiment)?;
    let artifact = writer.write_cluster(dataset.sample_ids(), model)?;
    let model_path = writer.model_path();
    model.save(&model_path).context("failed to save model")?;

    let output = ClusterOutput {
        experiment: io.experiment,
        k: model.n_clusters(),
        metric: model.metric().to_string(),
        method: model.method().to_string(),
        inertia: model.inertia().value(),
        n_samples: dataset.n_samples(),
        converged: model.converged(),
        iterations: model.n_iter(),
        medoid_ids: dataset
            .ids_of(model.medoid_indices())?
            .into_iter()
            .map(ToString::to_string)
            .collect(),
        cluster_sizes: model.cluster_sizes(),
        n_warnings: model.warnings().len(),
        artifact,
        model: model_path,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Cluster { io, k, method, tuning } => {
            let (experiment, dataset) = read_dataset(&io)?;

            let config = KMedoidsConfig::new(k)?
                .with_metric(tuning.metric.parse::<Metric>()?)
                .with_method(method.parse::<Method>()?)
                .with_init(tuning.init.parse::<InitStrategy>()?)
                .with_max_iter(tuning.max_iter)
                .with_seed(cli.seed);

            let model = config.fit(dataset.features()).context("clustering failed")?;
            finish_fit(io, experiment, &dataset, &model)?;
        }

        Command::Clara { io, k, n_sampling, n_sampling_iter, tuning } => {
            let (experiment, dataset) = read_dataset(&io)?;

            let mut config = ClaraConfig::new(k)?
                .with_metric(tuning.metric.parse::<Metric>()?)
                .with_init(tuning.init.parse::<InitStrategy>()?)
                .with_max_iter(tuning.max_iter)
                .with_n_sampling_iter(n_sampling_iter)
                .with_seed(cli.seed);
            if let Some(n_sampling) = n_sampling {
                config = config.with_n_sampling(n_sampling);
            }

            let model = config.fit(dataset.features()).context("CLARA clustering failed")?;
            finish_fit(io, experiment, &dataset, &model)?;
        }

        Command::Optimize { io, min_k, max_k, method, silhouette, tuning } => {
            let (experiment, dataset) = read_dataset(&io)?;

            let config = OptimizeConfig::new(min_k, max_k)?
                .with_metric(tuning.metric.parse::<Metric>()?)
                .with_method(method.parse::<Method>()?)
                .with_init(tuning.init.parse::<InitStrategy>()?)
                .with_max_iter(tuning.max_iter)
                .with_silhouette(silhouette)
                .with_seed(cli.seed);

            let result = config.fit(dataset.features()).context("optimization failed")?;

            let writer = ResultWriter::new(&io.output_dir, experiment)?;
            writer.write_optimize(dataset.n_samples(), &result)?;

            let output = OptimizeOutput {
                experiment: io.experiment,
                n_samples: dataset.n_samples(),
                best_k: result.best_k(),
                best_k_by_silhouette: result.best_k_by_silhouette(),
                results: result
                    .results
                    .iter()
                    .map(|r| KResultOutput {
                        k: r.k,
                        inertia: r.inertia.value(),
                        silhouette: r.silhouette,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict { model, io } => {
            let (experiment, dataset) = read_dataset(&io)?;

            let fitted = KMedoidsModel::load(&model).context("failed to load model")?;
            info!(k = fitted.n_clusters(), metric = %fitted.metric(), "model loaded");

            let predictions = fitted
                .predict_with_distance(dataset.features())
                .context("prediction failed")?;

            let writer = ResultWriter::new(&io.output_dir, experiment)?;
            writer.write_predictions(dataset.sample_ids(), &predictions)?;

            let mut cluster_counts = vec![0usize; fitted.n_clusters()];
            for (label, _) in &predictions {
                cluster_counts[label.index()] += 1;
            }

            let output = PredictOutput {
                experiment: io.experiment,
                n_samples: dataset.n_samples(),
                model_k: fitted.n_clusters(),
                model_metric: fitted.metric().to_string(),
                cluster_counts,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
