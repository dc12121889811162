use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use intrusive_ptr::{dynamic_pointer_cast, upcast, AsAny, Counted, IntrusivePtr, Shareable};
use std::rc::Rc;
use std::time::Duration;

trait Payload: Shareable + AsAny {}

impl Payload for Counted<u64> {}

upcast!(Counted<u64> => dyn Payload);

fn bench_new_drop(c: &mut Criterion) {
    c.bench_function("intrusive_ptr_new_drop", |b| {
        b.iter(|| black_box(IntrusivePtr::new(Counted::new(black_box(7u64)))))
    });
    c.bench_function("rc_new_drop", |b| b.iter(|| black_box(Rc::new(black_box(7u64)))));
}

fn bench_clone_drop(c: &mut Criterion) {
    c.bench_function("intrusive_ptr_clone_drop", |b| {
        let p = IntrusivePtr::new(Counted::new(1u64));
        b.iter(|| {
            let x = p.clone();
            black_box(&x);
            drop(x);
        })
    });
    c.bench_function("rc_clone_drop", |b| {
        let p = Rc::new(1u64);
        b.iter(|| {
            let x = p.clone();
            black_box(&x);
            drop(x);
        })
    });
}

fn bench_dynamic_cast(c: &mut Criterion) {
    c.bench_function("intrusive_ptr_dynamic_cast_hit", |b| {
        let p: IntrusivePtr<dyn Payload> =
            IntrusivePtr::upcast(IntrusivePtr::new(Counted::new(3u64)));
        b.iter(|| black_box(dynamic_pointer_cast::<Counted<u64>, _>(&p)))
    });
    c.bench_function("intrusive_ptr_dynamic_cast_miss", |b| {
        let p: IntrusivePtr<dyn Payload> =
            IntrusivePtr::upcast(IntrusivePtr::new(Counted::new(3u64)));
        b.iter(|| black_box(dynamic_pointer_cast::<Counted<i32>, _>(&p)))
    });
}

fn bench_fanout_teardown(c: &mut Criterion) {
    c.bench_function("intrusive_ptr_fanout_10k", |b| {
        b.iter_batched(
            || IntrusivePtr::new(Counted::new(vec![0u8; 64])),
            |p| {
                let copies: Vec<_> = (0..10_000).map(|_| p.clone()).collect();
                drop(p);
                black_box(copies)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_new_drop, bench_clone_drop, bench_dynamic_cast, bench_fanout_teardown
}
criterion_main!(benches);
