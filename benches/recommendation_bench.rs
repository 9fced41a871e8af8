use criterion::{black_box, criterion_group, criterion_main, Criterion};
use movierec::algorithms::{AlternatingLeastSquares, LatentFactorModel};
use movierec::config::{EmbeddingConfig, FactorizationConfig};
use movierec::data::InteractionDataset;
use movierec::services::recommendation::RankingService;
use movierec::services::training::TrainingLoop;
use movierec::utils::top_k_by_score;
use movierec::RatingRecord;

fn synthetic_dataset(users: i64, items: i64, per_user: i64) -> InteractionDataset {
    let records: Vec<RatingRecord> = (0..users)
        .flat_map(|u| {
            (0..per_user).map(move |j| {
                let item = (u * 31 + j * 17) % items;
                RatingRecord::new(u, item, 1.0 + ((u + item) % 5) as f32)
            })
        })
        .collect();
    InteractionDataset::from_records(&records).unwrap()
}

fn benchmark_training(c: &mut Criterion) {
    let dataset = synthetic_dataset(200, 500, 20);

    c.bench_function("als_fit_rank_10", |b| {
        b.iter(|| {
            black_box(
                AlternatingLeastSquares::fit(&dataset, &FactorizationConfig::default(), Some(1))
                    .unwrap(),
            );
        });
    });

    c.bench_function("embedding_network_10_epochs", |b| {
        let training_loop = TrainingLoop::new(EmbeddingConfig::default());
        b.iter(|| {
            black_box(training_loop.run(&dataset, Some(1)).unwrap());
        });
    });
}

fn benchmark_ranking(c: &mut Criterion) {
    let dataset = synthetic_dataset(500, 5000, 20);
    let (model, _) =
        AlternatingLeastSquares::fit(&dataset, &FactorizationConfig::default(), Some(1)).unwrap();

    c.bench_function("als_score_items_5000", |b| {
        b.iter(|| black_box(model.score_items(black_box(42))));
    });

    let scores = model.score_items(42);
    c.bench_function("top_k_10_of_5000", |b| {
        b.iter(|| black_box(top_k_by_score(&scores, 10, |i| i)));
    });

    let (users, items) = dataset.into_encoders();
    let service = RankingService::new(users, items, Box::new(model), 10).unwrap();
    c.bench_function("recommend_k_10", |b| {
        b.iter(|| black_box(service.recommend(black_box(42), 10).unwrap()));
    });
}

criterion_group!(benches, benchmark_training, benchmark_ranking);
criterion_main!(benches);
