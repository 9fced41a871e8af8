use anyhow::{bail, Result};
use clap::Parser;
use movierec::algorithms::Strategy;
use movierec::services::training::{ComputeBackend, TrainingService};
use movierec::utils::metrics::MetricsCalculator;
use movierec::utils::validation::validate_config;
use movierec::{init_tracing, Config, RawId, RecError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Train a recommender offline and inspect its rankings",
    long_about = None
)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Ratings CSV; overrides `data.ratings_path`.
    #[arg(short, long)]
    ratings: Option<String>,

    /// `factorization` or `embedding_network`.
    #[arg(short, long)]
    strategy: Option<String>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Spread training work over all cores.
    #[arg(long)]
    accelerated: bool,

    /// Print recommendations for this user after training.
    #[arg(short, long)]
    user: Option<RawId>,

    #[arg(short, long, default_value_t = 10)]
    k: usize,

    /// Report precision/recall@k against each user's highly rated items.
    #[arg(long)]
    evaluate: bool,

    /// Minimum rating that counts as relevant when evaluating.
    #[arg(long, default_value_t = 4.0)]
    relevance_threshold: f32,
}

fn parse_strategy(name: &str) -> Result<Strategy> {
    match name {
        "factorization" | "als" => Ok(Strategy::Factorization),
        "embedding_network" | "neural" => Ok(Strategy::EmbeddingNetwork),
        other => bail!("unknown strategy {:?}", other),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    info!("Starting MovieRec offline trainer");

    let mut config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    if let Some(ratings) = args.ratings {
        config.data.ratings_path = Some(ratings);
    }
    if let Some(strategy) = &args.strategy {
        config.model.strategy = parse_strategy(strategy)?;
    }
    if let Some(epochs) = args.epochs {
        config.model.embedding.epochs = epochs;
    }
    if args.seed.is_some() {
        config.model.seed = args.seed;
    }
    if args.accelerated {
        config.model.factorization.backend = ComputeBackend::Accelerated;
        config.model.embedding.backend = ComputeBackend::Accelerated;
    }
    validate_config(&config)?;

    info!("Training configuration: {:?}", config.model);

    let training_service = TrainingService::new(Arc::new(config));
    let records = training_service.load_records()?;
    let (ranking, report) = training_service.train(&records)?;

    info!(
        "Vocabulary: {} users, {} movies",
        ranking.users().size(),
        ranking.items().size()
    );
    if let Some(loss) = report.final_loss() {
        info!("Final {} loss: {:.6}", report.strategy, loss);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(user) = args.user {
        match ranking.recommend(user, args.k) {
            Ok(recommendations) if recommendations.is_empty() => {
                println!("No recommendations for user {}", user);
            }
            Ok(recommendations) => {
                for (rank, rec) in recommendations.iter().enumerate() {
                    println!("{:>3}. movie {:<8} score {:.4}", rank + 1, rec.item_id, rec.score);
                }
            }
            Err(RecError::UnknownId { .. }) => warn!("User {} was not in the training data", user),
            Err(err) => return Err(err.into()),
        }
    }

    if args.evaluate {
        let mut relevant: HashMap<RawId, Vec<RawId>> = HashMap::new();
        for record in &records {
            if record.rating >= args.relevance_threshold {
                relevant.entry(record.user_id).or_default().push(record.item_id);
            }
        }

        let mut per_user = Vec::with_capacity(relevant.len());
        for (&user, items) in &relevant {
            let recommended: Vec<RawId> = ranking
                .recommend(user, args.k)?
                .into_iter()
                .map(|rec| rec.item_id)
                .collect();
            per_user.push((recommended, items.as_slice()));
        }

        let metrics = MetricsCalculator::new(args.k)
            .evaluate(per_user.iter().map(|(rec, rel)| (rec.as_slice(), *rel)));
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    }

    Ok(())
}
