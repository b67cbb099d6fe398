use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use ctr_forest::RankedFeature;
use ctr_io::{DatasetWriter, ExperimentName, InteractionReader, ResultWriter};
use ctr_model::{ClickModel, ModelConfig};
use ctr_synth::analytics::{self, DatasetSummary};
use ctr_synth::{Dataset, ExitPolicy, GeneratorConfig, Vocabulary};

#[derive(Parser)]
#[command(name = "ctr")]
#[command(about = "Synthetic click-through data, click model training, and scoring")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for generation, the held-out split, and the forest
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

#[derive(ValueEnum, Debug, Clone, Copy)]
enum VocabularyArg {
    Ecommerce,
    SiteSearch,
}

impl From<VocabularyArg> for Vocabulary {
    fn from(arg: VocabularyArg) -> Self {
        match arg {
            VocabularyArg::Ecommerce => Vocabulary::Ecommerce,
            VocabularyArg::SiteSearch => Vocabulary::SiteSearch,
        }
    }
}

/// Synthetic dataset parameters.
#[derive(Args, Debug, Clone)]
struct GeneratorArgs {
    /// Number of sessions to generate
    #[arg(long, default_value_t = 1000)]
    n_samples: usize,

    /// Search-term list
    #[arg(long, value_enum, default_value = "ecommerce")]
    vocabulary: VocabularyArg,

    /// Only lower the click probability on exit instead of forbidding clicks
    #[arg(long, default_value_t = false)]
    loose: bool,

    /// Probability that a session exits
    #[arg(long, default_value_t = 0.3)]
    exit_probability: f64,

    /// Length of the timestamp window ending now, in days
    #[arg(long, default_value_t = 30)]
    window_days: u32,
}

impl GeneratorArgs {
    fn generate(&self, seed: u64) -> Result<Dataset> {
        let policy = if self.loose { ExitPolicy::Loose } else { ExitPolicy::Strict };
        let config = GeneratorConfig::new(self.n_samples)
            .context("invalid sample size")?
            .with_seed(seed)
            .with_vocabulary(self.vocabulary.into())
            .with_exit_policy(policy)
            .with_exit_probability(self.exit_probability)
            .context("invalid exit probability")?
            .with_window_days(self.window_days)
            .context("invalid window")?;
        Ok(config.generate())
    }
}

/// Click model parameters.
#[derive(Args, Debug, Clone)]
struct ModelArgs {
    /// Number of trees in the Random Forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum tree depth (unlimited if not set)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Share of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,
}

impl ModelArgs {
    fn train(&self, seed: u64, dataset: &Dataset) -> Result<ClickModel> {
        let config = ModelConfig::new()
            .with_n_trees(self.n_trees)
            .context("invalid tree count")?
            .with_max_depth(self.max_depth)
            .with_test_fraction(self.test_fraction)
            .context("invalid test fraction")?
            .with_seed(seed);
        let mut model = ClickModel::with_config(config);
        model.train(dataset).context("training failed")?;
        Ok(model)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Generate a synthetic interaction dataset and write it as CSV
    Generate {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Train the click model and write the report and training-set scores
    Train {
        #[command(flatten)]
        generator: GeneratorArgs,

        #[command(flatten)]
        model: ModelArgs,

        /// Train on this CSV instead of a generated dataset
        #[arg(long)]
        data: Option<PathBuf>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Train on a generated dataset, then score the rows of a CSV file
    Score {
        #[command(flatten)]
        generator: GeneratorArgs,

        #[command(flatten)]
        model: ModelArgs,

        /// Path to the CSV file to score
        #[arg(long)]
        input: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct GenerateOutput {
    experiment: String,
    dataset_path: PathBuf,
    summary: DatasetSummary,
}

#[derive(Serialize)]
struct TrainOutput {
    experiment: String,
    n_samples: usize,
    accuracy: f64,
    n_trees: usize,
    top_features: Vec<RankedFeature>,
    report_path: PathBuf,
    predictions_path: PathBuf,
}

#[derive(Serialize)]
struct ScoreOutput {
    experiment: String,
    n_training_samples: usize,
    training_accuracy: f64,
    n_scored: usize,
    mean_probability: f64,
    predictions_path: PathBuf,
}

fn result_writer(output_dir: &std::path::Path, experiment: String) -> Result<ResultWriter> {
    let experiment = ExperimentName::new(experiment).context("invalid experiment name")?;
    ResultWriter::new(output_dir, experiment).context("failed to prepare output directory")
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
        Command::Generate {
            generator,
            experiment,
            output_dir,
        } => {
            let writer = result_writer(&output_dir, experiment.clone())?;
            let dataset = generator.generate(cli.seed)?;

            let dataset_path = writer.dataset_path();
            DatasetWriter::new(&dataset_path)
                .write(&dataset)
                .context("failed to write dataset")?;

            let output = GenerateOutput {
                experiment,
                dataset_path,
                summary: analytics::summary(&dataset),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Train {
            generator,
            model,
            data,
            experiment,
            output_dir,
        } => {
            let writer = result_writer(&output_dir, experiment.clone())?;
            let dataset = match &data {
                Some(path) => InteractionReader::new(path)
                    .read()
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let dataset = generator.generate(cli.seed)?;
                    DatasetWriter::new(&writer.dataset_path())
                        .write(&dataset)
                        .context("failed to write dataset")?;
                    dataset
                }
            };

            let click_model = model.train(cli.seed, &dataset)?;
            let evaluation = click_model
                .evaluation()
                .context("trained model has no evaluation")?;
            info!(accuracy = evaluation.accuracy, "held-out evaluation complete");

            let report_path = writer
                .write_report(&dataset, evaluation, click_model.feature_importance())
                .context("failed to write report")?;
            let probabilities = click_model.predict(&dataset).context("scoring failed")?;
            let predictions_path = writer
                .write_predictions(&dataset, &probabilities)
                .context("failed to write predictions")?;

            let output = TrainOutput {
                experiment,
                n_samples: dataset.len(),
                accuracy: evaluation.accuracy,
                n_trees: click_model.config().n_trees(),
                top_features: click_model.feature_importance().iter().take(3).cloned().collect(),
                report_path,
                predictions_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Score {
            generator,
            model,
            input,
            experiment,
            output_dir,
        } => {
            let writer = result_writer(&output_dir, experiment.clone())?;
            let to_score = InteractionReader::new(&input)
                .read()
                .with_context(|| format!("failed to read {}", input.display()))?;

            let training = generator.generate(cli.seed)?;
            let click_model = model.train(cli.seed, &training)?;
            let probabilities = click_model
                .predict(&to_score)
                .context("scoring failed")?;
            let predictions_path = writer
                .write_predictions(&to_score, &probabilities)
                .context("failed to write predictions")?;

            let output = ScoreOutput {
                experiment,
                n_training_samples: training.len(),
                training_accuracy: click_model.score().unwrap_or(0.0),
                n_scored: probabilities.len(),
                mean_probability: probabilities.iter().sum::<f64>() / probabilities.len() as f64,
                predictions_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
