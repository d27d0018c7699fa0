use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use medialib_sql::{Column, Record, SqlValue, Statement, predicate, sql_row};

/// SELECT with `n` projected columns and `n` equality predicates.
fn build_select(n: usize) -> Statement {
    let columns: Vec<Column> = (0..n).map(|i| Column::new(format!("v.col{i}"))).collect();
    let filters: Vec<_> = (0..n)
        .map(|i| predicate::eq(&format!("v.col{i}"), i as i64))
        .collect();
    Statement::new(("video", "v"))
        .expect("valid table")
        .select(columns)
        .and_all(filters)
        .limit(20)
}

fn bench_render_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/select");

    for n in [1, 5, 10, 50] {
        let stmt = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &stmt, |b, stmt| {
            b.iter(|| black_box(stmt.render()));
        });
    }

    group.finish();
}

fn bench_render_insert_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/insert_rows");

    for n in [1, 10, 100, 1000] {
        let rows: Vec<Vec<SqlValue>> = (0..n).map(|i| sql_row![7, i as i64]).collect();
        let stmt = Statement::new("relation_video_tag")
            .expect("valid table")
            .insert(["video_id", "tag_id"])
            .values(rows);
        group.bench_with_input(BenchmarkId::from_parameter(n), &stmt, |b, stmt| {
            b.iter(|| black_box(stmt.render()));
        });
    }

    group.finish();
}

fn bench_escape_text(c: &mut Criterion) {
    let plain = "Ghost in the Shell".to_string();
    let quoted = r"it's a c:\path".to_string();

    c.bench_function("escape/literal_plain", |b| {
        b.iter(|| black_box(medialib_sql::quote_literal(&SqlValue::from(&plain))));
    });
    c.bench_function("escape/literal_quoted", |b| {
        b.iter(|| black_box(medialib_sql::quote_literal(&SqlValue::from(&quoted))));
    });
    c.bench_function("escape/insert_one", |b| {
        b.iter(|| {
            let record = Record::new()
                .set("title", &plain)
                .set("release_year", 1995)
                .set("path", &quoted);
            black_box(Statement::new("video").map(|s| s.insert_one(record).render()))
        });
    });
}

criterion_group!(
    benches,
    bench_render_select,
    bench_render_insert_rows,
    bench_escape_text
);
criterion_main!(benches);
