use criterion::{criterion_group, criterion_main, Criterion};
use ledger_core::{mine, Block, Ledger, MiningOptions};

fn candidate() -> Block {
    let ledger = Ledger::new(3);
    let mut block = Block::new("alice", "bob", 25, 1, "miner");
    block.timestamp = 1_600_000_000_000;
    ledger.link(block).expect("genesis present")
}

fn bench_pow(c: &mut Criterion) {
    let block = candidate();

    c.bench_function("mine_difficulty_3", |b| {
        b.iter(|| {
            let mut mined = block.clone();
            mined.mine(3)
        });
    });

    let parallel = MiningOptions {
        parallel: true,
        ..Default::default()
    };
    c.bench_function("mine_parallel_difficulty_3", |b| {
        b.iter(|| {
            let mut mined = block.clone();
            mine::search_parallel(&mut mined, 3, &parallel).expect("unbounded search")
        });
    });
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
