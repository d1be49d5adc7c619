//! Benchmarks for column resolution and statement generation.
//!
//! Tests:
//! - Resolving long reference chains (deep DFS)
//! - Resolving wide schemas with many independent tables
//! - The full generate pipeline with varying row counts

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sql_synth::generator::{generate, resolve_values, GenerateOptions, GeneratorRegistry};
use sql_synth::schema::{
    ColumnGraph, ColumnKind, ColumnType, IntWidth, Reference, Schema, TableId, TableSchema,
};
use std::hint::black_box;

/// t0.c <- t1.c <- t2.c <- ... declared so every table depends on the next one
fn chain_schema(depth: usize) -> Schema {
    let mut schema = Schema::new();
    for i in 0..depth {
        let mut table = TableSchema::new(format!("t{}", i), TableId(0));
        let column = table.add_column("c", ColumnType::new(ColumnKind::Text).with_size(16));
        if i + 1 < depth {
            column.add_reference(Reference::new(format!("t{}", i + 1), "c"));
        }
        schema.add_table(table);
    }
    schema
}

/// Independent tables, each with an id, a few columns and a reference to the previous table
fn wide_schema(tables: usize) -> Schema {
    let mut schema = Schema::new();
    for i in 0..tables {
        let mut table = TableSchema::new(format!("table_{}", i), TableId(0));
        table
            .add_column("id", ColumnType::new(ColumnKind::Int(IntWidth::Big)))
            .is_auto_generated = true;
        table.add_column("name", ColumnType::new(ColumnKind::Text).with_size(32));
        table.add_column("amount", ColumnType::new(ColumnKind::Int(IntWidth::Standard)));
        table.add_column("created_at", ColumnType::new(ColumnKind::DateTime));
        let parent = table.add_column("parent_name", ColumnType::new(ColumnKind::Text).with_size(32));
        if i > 0 {
            parent.add_reference(Reference::new(format!("table_{}", i - 1), "name"));
        }
        schema.add_table(table);
    }
    schema
}

fn bench_chain_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_resolution");
    let registry = GeneratorRegistry::with_defaults();

    for depth in [10, 100, 1_000] {
        let schema = chain_schema(depth);
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(
            BenchmarkId::new("depth", depth),
            &schema,
            |b, schema| {
                b.iter(|| {
                    let graph = ColumnGraph::from_schema(schema);
                    let mut rng = StdRng::seed_from_u64(42);
                    let values = resolve_values(&graph, &registry, 10, &mut rng).unwrap();
                    black_box(values.len())
                })
            },
        );
    }

    group.finish();
}

fn bench_wide_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_resolution");
    let registry = GeneratorRegistry::with_defaults();

    for tables in [10, 100, 500] {
        let schema = wide_schema(tables);
        group.throughput(Throughput::Elements(schema.column_count() as u64));
        group.bench_with_input(
            BenchmarkId::new("tables", tables),
            &schema,
            |b, schema| {
                b.iter(|| {
                    let graph = ColumnGraph::from_schema(schema);
                    let mut rng = StdRng::seed_from_u64(42);
                    let values = resolve_values(&graph, &registry, 10, &mut rng).unwrap();
                    black_box(values.len())
                })
            },
        );
    }

    group.finish();
}

fn bench_generate_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_rows");
    let schema = wide_schema(20);

    for rows in [10, 100, 1_000] {
        group.throughput(Throughput::Elements((rows * schema.len()) as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, &rows| {
            let options = GenerateOptions {
                rows,
                seed: Some(42),
                ..GenerateOptions::default()
            };
            b.iter(|| {
                let output = generate(black_box(&schema), &options).unwrap();
                black_box(output.statements.len())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_chain_resolution,
    bench_wide_resolution,
    bench_generate_rows
);
criterion_main!(benches);
