//! Benchmarks for packed state updates and holder transitions.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use packstate_holder::{AtomicHolder, TypedHolder};
use packstate_state::{packed_enum, packed_state};
use std::sync::Arc;
use std::thread;

packed_enum! {
    pub enum Light {
        Red,
        Amber,
        Green,
    }
}

packed_state! {
    pub struct Junction with change_support {
        cars: i32 in 0..=100_000,
        light: Light,
        pedestrians: bool,
    }
}

fn bench_state_updates(c: &mut Criterion) {
    let state = Junction::initial();
    c.bench_function("with_cars", |b| {
        b.iter(|| black_box(&state).with_cars(black_box(4_242)).unwrap())
    });
    c.bench_function("read_light", |b| b.iter(|| black_box(&state).light()));
}

fn bench_holder(c: &mut Criterion) {
    let holder = TypedHolder::<Junction>::new();
    c.bench_function("update_and_get_uncontended", |b| {
        b.iter(|| {
            holder
                .update_and_get(|j| j.with_cars((j.cars() + 1) % 100_000))
                .unwrap()
        })
    });

    let with_listener = AtomicHolder::builder(Arc::clone(Junction::layout()))
        .on_change(|_, changed_to, _| {
            black_box(changed_to.value());
            Ok(())
        })
        .build()
        .unwrap();
    let with_listener = TypedHolder::<Junction>::from_holder(with_listener).unwrap();
    c.bench_function("update_and_get_with_listener", |b| {
        b.iter(|| {
            with_listener
                .update_and_get(|j| j.with_pedestrians(!j.pedestrians()))
                .unwrap()
        })
    });

    c.bench_function("update_and_get_contended_4_threads", |b| {
        b.iter(|| {
            let holder = TypedHolder::<Junction>::new();
            thread::scope(|scope| {
                for _ in 0..4 {
                    scope.spawn(|| {
                        for _ in 0..250 {
                            holder
                                .update_and_get(|j| j.with_cars(j.cars() + 1))
                                .unwrap();
                        }
                    });
                }
            });
            black_box(holder.state().cars())
        })
    });
}

criterion_group!(benches, bench_state_updates, bench_holder);
criterion_main!(benches);
