use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rope::Rope;
use std::hint::black_box;

fn bench_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("creation");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        let text = "a".repeat(*size);

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("rope", size), size, |b, _| {
            b.iter(|| {
                let rope = Rope::from(black_box(text.as_str()));
                black_box(rope);
            })
        });

        group.bench_with_input(BenchmarkId::new("ropey", size), size, |b, _| {
            b.iter(|| {
                let ropey = ropey::Rope::from_str(black_box(text.as_str()));
                black_box(ropey)
            });
        });

        group.bench_with_input(BenchmarkId::new("string", size), size, |b, _| {
            b.iter(|| {
                let string = black_box(text.clone());
                black_box(string);
            })
        });
    }
    group.finish();
}

fn bench_insert_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    let insert_text = "INSERTED";

    for size in [1_000, 10_000, 100_000] {
        let text = "a".repeat(size);
        group.throughput(Throughput::Elements(1));

        for (place, at) in [("beginning", 0), ("middle", size / 2), ("end", size)] {
            group.bench_function(BenchmarkId::new(format!("rope_{place}"), size), |b| {
                b.iter_batched(
                    || Rope::from(text.as_str()),
                    |mut rope| {
                        let _ = rope.insert(black_box(at), black_box(insert_text));
                        rope
                    },
                    BatchSize::SmallInput,
                )
            });

            group.bench_function(BenchmarkId::new(format!("ropey_{place}"), size), |b| {
                b.iter_batched(
                    || ropey::Rope::from_str(&text),
                    |mut ropey| {
                        ropey.insert(black_box(at), black_box(insert_text));
                        ropey
                    },
                    BatchSize::SmallInput,
                )
            });

            group.bench_function(BenchmarkId::new(format!("string_{place}"), size), |b| {
                b.iter_batched(
                    || text.clone(),
                    |mut string| {
                        string.insert_str(black_box(at), black_box(insert_text));
                        string
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

fn bench_remove_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");

    for size in [1_000, 10_000, 100_000] {
        let text = "a".repeat(size);
        let len = size / 10;
        group.throughput(Throughput::Elements(len as u64));

        for (place, start) in [("beginning", 0), ("middle", size / 2 - len / 2)] {
            group.bench_function(BenchmarkId::new(format!("rope_{place}"), size), |b| {
                b.iter_batched(
                    || Rope::from(text.as_str()),
                    |mut rope| {
                        let removed = rope.remove(black_box(start), black_box(len));
                        (rope, removed)
                    },
                    BatchSize::SmallInput,
                )
            });

            group.bench_function(BenchmarkId::new(format!("ropey_{place}"), size), |b| {
                b.iter_batched(
                    || ropey::Rope::from_str(&text),
                    |mut ropey| {
                        ropey.remove(black_box(start..start + len));
                        ropey
                    },
                    BatchSize::SmallInput,
                )
            });

            group.bench_function(BenchmarkId::new(format!("string_{place}"), size), |b| {
                b.iter_batched(
                    || text.clone(),
                    |mut string| {
                        string.replace_range(black_box(start..start + len), "");
                        string
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

fn bench_slice_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("slice");

    for size in [10_000, 100_000].iter() {
        let text = "a".repeat(*size);
        let rope = Rope::from(text.as_str());
        let ropey = ropey::Rope::from_str(text.as_str());

        group.throughput(Throughput::Elements(*size as u64 / 4));

        let start = size / 4;
        let end = 3 * size / 4;

        group.bench_with_input(BenchmarkId::new("rope", size), &rope, |b, rope| {
            b.iter(|| {
                let slice = rope.substring(black_box(start), black_box(end - start));
                black_box(slice);
            })
        });

        group.bench_with_input(BenchmarkId::new("ropey", size), &ropey, |b, ropey| {
            b.iter(|| {
                let slice = ropey.slice(black_box(start..end));
                black_box(slice);
            })
        });

        group.bench_with_input(BenchmarkId::new("string", size), &text, |b, text| {
            b.iter(|| {
                let slice = &text[black_box(start..end)];
                let owned = slice.to_string();
                black_box(owned);
            })
        });
    }
    group.finish();
}

fn bench_streamed_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("streamed_append");

    for chunks in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*chunks as u64));

        group.bench_with_input(BenchmarkId::new("append", chunks), chunks, |b, &chunks| {
            b.iter(|| {
                let mut rope = Rope::new();
                for _ in 0..chunks {
                    rope.append(black_box("chunk of text\n"));
                }
                black_box(rope);
            })
        });

        group.bench_with_input(
            BenchmarkId::new("append_then_balance", chunks),
            chunks,
            |b, &chunks| {
                b.iter(|| {
                    let mut rope = Rope::new();
                    for _ in 0..chunks {
                        rope.append(black_box("chunk of text\n"));
                    }
                    rope.balance();
                    black_box(rope);
                })
            },
        );
    }
    group.finish();
}

fn bench_line_breaks(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_breaks");

    for lines in [1_000, 10_000].iter() {
        let text = "a line of text\r\n".repeat(*lines);
        let rope = Rope::from(text.as_str());
        let ropey = ropey::Rope::from_str(text.as_str());

        group.throughput(Throughput::Elements(*lines as u64));

        group.bench_with_input(BenchmarkId::new("rope", lines), &rope, |b, rope| {
            b.iter(|| black_box(rope.line_breaks()))
        });

        group.bench_with_input(BenchmarkId::new("ropey", lines), &ropey, |b, ropey| {
            b.iter(|| {
                let starts: Vec<usize> = (0..ropey.len_lines())
                    .map(|line| ropey.line_to_char(line))
                    .collect();
                black_box(starts)
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_creation,
    bench_insert_operations,
    bench_remove_operations,
    bench_slice_operations,
    bench_streamed_append,
    bench_line_breaks
);
criterion_main!(benches);
