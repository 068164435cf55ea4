//! Layered layout Criterion benchmarks.
//!
//! Measures full layout computation (back-edge reversal, ranking,
//! barycenter ordering, coordinate assignment) over pipeline-shaped
//! topologies of increasing size, plus the decode path that seeds them.
//!
//! Run with: cargo bench --bench layout_bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use flowgraph_core::codec::{self, WorkerRow};
use flowgraph_core::layout::{self, LayoutDirection};
use flowgraph_core::TopologyGraph;

/// Builds a linear pipeline of `stages` workers chained through topics,
/// with a feedback edge from the last worker to the first topic.
fn pipeline_rows(stages: u32) -> Vec<WorkerRow> {
    (1..=stages)
        .map(|i| WorkerRow {
            id: i,
            worker_name: format!("worker{i}"),
            topics_input: format!("topic_{i}"),
            topics_output: if i == stages {
                "topic_1".to_string()
            } else {
                format!("topic_{}", i + 1)
            },
            metadata: String::new(),
            bootstrap_address: String::new(),
        })
        .collect()
}

fn pipeline_graph(stages: u32) -> TopologyGraph {
    codec::decode(&pipeline_rows(stages)).graph
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_compute");
    for stages in [10u32, 50, 200] {
        let graph = pipeline_graph(stages);
        group.throughput(Throughput::Elements(u64::from(stages)));
        group.bench_with_input(BenchmarkId::from_parameter(stages), &graph, |b, graph| {
            b.iter(|| layout::compute(black_box(graph), LayoutDirection::LeftToRight));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_decode");
    for stages in [10u32, 200] {
        let rows = pipeline_rows(stages);
        group.throughput(Throughput::Elements(u64::from(stages)));
        group.bench_with_input(BenchmarkId::from_parameter(stages), &rows, |b, rows| {
            b.iter(|| codec::decode(black_box(rows)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layout, bench_decode);
criterion_main!(benches);
