use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::{hint::black_box, io::Cursor};

use bet_relay::{
    bets::{BatchSource, Bet, BetBatcher, CsvBetReader},
    codec::{LENGTH_PREFIX_SIZE, decode_batch, encode_batch, encode_bet},
};

fn bets(n: u32) -> Vec<Bet> {
    (0..n)
        .map(|i| {
            Bet::new(
                format!("Name{i}"),
                format!("Surname{i}"),
                (30_000_000 + i).to_string(),
                "1990-01-01",
                i,
            )
        })
        .collect()
}

/// Benchmark encoding a single bet
fn bench_encode_bet(c: &mut Criterion) {
    let bet = Bet::new("Santiago Lionel", "Lorca", "30904465", "1999-03-17", 7574);
    c.bench_function("encode_bet", |b| {
        b.iter(|| encode_bet(black_box(&bet)));
    });
}

/// Benchmark encoding batches of increasing size (all fit one frame)
fn bench_encode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_batch");
    for n in [1u32, 4, 12] {
        let bets = bets(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &bets, |b, bets| {
            b.iter(|| encode_batch(black_box(bets), 1, true));
        });
    }
    group.finish();
}

/// Benchmark decoding a full batch payload
fn bench_decode_batch(c: &mut Criterion) {
    let frame = encode_batch(&bets(12), 1, false).unwrap();
    let payload = &frame[LENGTH_PREFIX_SIZE..];
    c.bench_function("decode_batch_12", |b| {
        b.iter(|| decode_batch(black_box(payload)));
    });
}

/// Benchmark reading and batching a 1000-record file from memory
fn bench_batch_csv(c: &mut Criterion) {
    let records: String = bets(1000)
        .iter()
        .map(|bet| {
            format!(
                "{},{},{},{},{}\n",
                bet.name, bet.surname, bet.identifier, bet.birth_date, bet.number
            )
        })
        .collect();

    c.bench_function("batch_csv_1000", |b| {
        b.iter(|| {
            let reader = CsvBetReader::new(Cursor::new(records.as_bytes()));
            let mut batcher = BetBatcher::new(reader, 100);
            let mut batches = 0;
            while let Ok(Some(_)) = batcher.next_batch() {
                batches += 1;
            }
            batches
        });
    });
}

criterion_group!(codec, bench_encode_bet, bench_encode_batch, bench_decode_batch);

criterion_group!(sources, bench_batch_csv);

criterion_main!(codec, sources);
