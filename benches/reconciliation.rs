//! Benchmarks for feed ingestion and level reconciliation.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use feed_lob_reconciler::{
    diff_levels, BookConfig, FeedFormat, FeedReader, OrderBook, PriceQty, Reconciliation,
};

fn create_records(count: usize, shift: i64) -> Vec<(Vec<PriceQty>, Vec<PriceQty>)> {
    let base_price: i64 = 2_700_000;

    (0..count)
        .map(|i| {
            let drift = (i % 20) as i64 * 25 + shift;
            let bids = (0..5)
                .map(|d| PriceQty::new(base_price + drift - d * 25, ((i + d as usize) % 50 + 1) as u64))
                .collect();
            let asks = (0..5)
                .map(|d| PriceQty::new(base_price + drift + 25 + d * 25, ((i * 3 + d as usize) % 40 + 1) as u64))
                .collect();
            (bids, asks)
        })
        .collect()
}

fn build(records: &[(Vec<PriceQty>, Vec<PriceQty>)]) -> OrderBook {
    let mut book = OrderBook::with_config("bench", BookConfig::new(5));
    for (bids, asks) in records {
        book.ingest(bids.iter().copied(), asks.iter().copied());
    }
    book
}

fn log_feed(records: &[(Vec<PriceQty>, Vec<PriceQty>)]) -> String {
    let levels = |pairs: &[PriceQty]| {
        pairs
            .iter()
            .map(|p| format!("{},{}", p.price, p.quantity))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let mut out = String::new();
    for (bids, asks) in records {
        out.push_str(&format!(
            "{{ES}}{{OK}}{{GOOD}}{{0,0}}{{0,0}}{{{}}}{{{}}}\n",
            levels(bids),
            levels(asks)
        ));
    }
    out
}

fn bench_ingest(c: &mut Criterion) {
    let records = create_records(10_000, 0);

    let mut group = c.benchmark_group("ingest");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("order_book", |b| b.iter(|| black_box(build(&records))));

    let feed = log_feed(&records);
    group.bench_function("log_feed", |b| {
        b.iter(|| {
            let ingested = FeedReader::new(FeedFormat::StructuredLog, "bench.log", BookConfig::new(5))
                .read(feed.as_bytes());
            black_box(ingested)
        })
    });

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let a = build(&create_records(10_000, 0));
    let b = build(&create_records(10_000, 5));

    let mut group = c.benchmark_group("reconcile");

    group.bench_function("diff_levels_bids", |bench| {
        bench.iter(|| black_box(diff_levels(a.bids(), b.bids())))
    });

    group.bench_function("between", |bench| {
        bench.iter(|| black_box(Reconciliation::between(&a, &b)))
    });

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_reconcile);
criterion_main!(benches);
