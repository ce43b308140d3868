use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use repoman::{EscapeSanitizer, QueryBuilder, Value};
use std::sync::Arc;

/// `n` (column, value) pairs alternating text and integers.
fn fields(n: usize) -> Vec<(String, Value)> {
    (0..n)
        .map(|i| {
            let value = if i % 2 == 0 {
                Value::from(format!("value {i}"))
            } else {
                Value::from(i as i64)
            };
            (format!("col{i}"), value)
        })
        .collect()
}

fn bench_select_where(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/select_where");

    for n in [1, 5, 10, 50, 100] {
        let conditions = fields(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &conditions, |b, conditions| {
            let mut qb = QueryBuilder::new();
            b.iter(|| {
                let sql = qb
                    .init("t")
                    .select_all()
                    .where_clause(conditions.iter().map(|(k, v)| (k, v.clone())))
                    .order("col0")
                    .limit(10)
                    .finalize();
                black_box(sql);
            });
        });
    }

    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/insert");

    for n in [1, 5, 10, 50, 100] {
        let values = fields(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let sql = QueryBuilder::for_table("t").insert(values.clone()).finalize();
                black_box(sql);
            });
        });
    }

    group.finish();
}

fn bench_sanitized_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/sanitized_update");

    for n in [1, 10, 100] {
        let values = fields(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            let mut qb = QueryBuilder::new().with_sanitizer(Arc::new(EscapeSanitizer));
            b.iter(|| {
                let sql = qb
                    .init("t")
                    .update(values.clone(), true)
                    .where_clause([("id", 1)])
                    .limit(1)
                    .finalize();
                black_box(sql);
            });
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/in_list");

    for n in [5, 20, 100, 500] {
        let ids = Value::from((0..n).map(i64::from).collect::<Vec<_>>());
        group.bench_with_input(BenchmarkId::from_parameter(n), &ids, |b, ids| {
            b.iter(|| {
                let sql = QueryBuilder::for_table("t")
                    .select(&["id"])
                    .where_clause([("id", ids.clone())])
                    .finalize();
                black_box(sql);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_select_where,
    bench_insert,
    bench_sanitized_update,
    bench_in_list
);
criterion_main!(benches);
