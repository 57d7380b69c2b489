use criterion::{criterion_group, criterion_main, Criterion};
use resource_registry::{
    models::Document,
    repositories::{traits::EntityRepository, MemoryRepository},
};
use std::time::Duration;
use uuid::Uuid;

fn generate_test_documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| Document::new().with_field("index", i as u64))
        .collect()
}

fn benchmark_persist_documents(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("persist_documents");
    group.measurement_time(Duration::from_secs(10));

    for count in [10, 100, 1000].iter() {
        let documents = generate_test_documents(*count);

        group.bench_with_input(format!("persist_{}_documents", count), count, |b, _| {
            b.to_async(&rt).iter(|| {
                let documents = documents.clone();
                async move {
                    let repo = MemoryRepository::<Document, Uuid>::with_uuids();
                    for doc in documents {
                        repo.persist(doc).await.unwrap();
                    }
                }
            })
        });
    }

    group.finish();
}

fn benchmark_find_all(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let repo = MemoryRepository::<Document, Uuid>::with_uuids();
    rt.block_on(async {
        for doc in generate_test_documents(1000) {
            repo.persist(doc).await.unwrap();
        }
    });

    c.bench_function("find_all_1000_documents", |b| {
        b.to_async(&rt).iter(|| {
            let repo = &repo;
            async move { repo.find_all().await.unwrap() }
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_persist_documents, benchmark_find_all
}
criterion_main!(benches);
