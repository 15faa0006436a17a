// benches/ranking_benchmarks.rs
//
// Baseline throughput for the two hot paths of the indexing/search core:
// the serialized lemma write path (the compound find-or-insert-increment)
// and the ranking query path (intersection/union candidate sets plus
// relative-rank scoring). Run with: cargo bench --bench ranking_benchmarks

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sqlx::SqlitePool;
use tokio::runtime::Runtime;

use lumen_search::domain::factory::{PageFactory, SiteFactory};
use lumen_search::lemma_frequency_service::LemmaFrequencyService;
use lumen_search::repository::sqlite::{
    SqliteIndexRepository, SqliteLemmaRepository, SqlitePageRepository, SqliteSiteRepository,
};
use lumen_search::repository::{IndexRepository, LemmaRepository, PageRepository, SiteRepository};

async fn seeded_service(
    page_count: usize,
) -> (LemmaFrequencyService, Arc<dyn PageRepository>, i64) {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let sites: Arc<dyn SiteRepository> = Arc::new(SqliteSiteRepository::new(pool.clone()));
    let pages: Arc<dyn PageRepository> = Arc::new(SqlitePageRepository::new(pool.clone()));
    let lemmas: Arc<dyn LemmaRepository> = Arc::new(SqliteLemmaRepository::new(pool.clone()));
    let indexes: Arc<dyn IndexRepository> = Arc::new(SqliteIndexRepository::new(pool.clone()));

    let mut site = SiteFactory::new_indexing("http://bench.test".into(), "Bench".into());
    sites.save(&mut site).await.unwrap();

    let service = LemmaFrequencyService::new(
        sites.clone(),
        pages.clone(),
        lemmas.clone(),
        indexes.clone(),
        0.30,
    );

    for i in 0..page_count {
        let mut page = PageFactory::new(site.id, format!("/page-{i}"), 200, String::new());
        pages.save(&mut page).await.unwrap();
        let content = format!(
            "the quick brown fox jumps over lazy dog number {i} common word everywhere"
        );
        service
            .save_page_lemmas_and_indexes_thread_safe(site.id, page.id, &content)
            .await
            .unwrap();
    }

    (service, pages, site.id)
}

fn bench_write_path(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("write_path");

    for page_count in [10usize, 100] {
        group.throughput(Throughput::Elements(page_count as u64));
        group.bench_with_input(
            BenchmarkId::new("save_page_lemmas_and_indexes", page_count),
            &page_count,
            |b, &page_count| {
                b.to_async(&rt).iter(|| async move {
                    let (service, pages, site_id) = seeded_service(0).await;
                    for i in 0..page_count {
                        let mut page =
                            PageFactory::new(site_id, format!("/bench-{i}"), 200, String::new());
                        pages.save(&mut page).await.unwrap();
                        let content = format!("lemma{} appears on this page {}", i % 7, i);
                        service
                            .save_page_lemmas_and_indexes_thread_safe(site_id, page.id, &content)
                            .await
                            .unwrap();
                    }
                    black_box(())
                });
            },
        );
    }

    group.finish();
}

fn bench_search_path(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("search_path");

    for page_count in [25usize, 200] {
        let (service, _pages, _site_id) = rt.block_on(seeded_service(page_count));
        group.throughput(Throughput::Elements(page_count as u64));
        group.bench_with_input(
            BenchmarkId::new("rank_and_intersect", page_count),
            &page_count,
            |b, _| {
                b.to_async(&rt).iter(|| async {
                    let (lemmas, ranked) = service
                        .search("quick brown fox", Some("http://bench.test"), 0, 20)
                        .await
                        .unwrap();
                    black_box((lemmas, ranked))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_write_path, bench_search_path);
criterion_main!(benches);
