//! Emission cost versus the boxed-closure baseline a general-purpose
//! standard library would suggest.

use std::{
	hint::black_box,
	sync::{
		atomic::{AtomicI32, Ordering::Relaxed},
		Arc,
	},
};

use chime::{PackedFn, Signal};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const EMITS_PER_ITERATION: i32 = 987;

fn emission(c: &mut Criterion) {
	let mut group = c.benchmark_group("emission");
	for slot_count in [1usize, 4, 8] {
		let sink = Arc::new(AtomicI32::new(0));

		let value_changed: Signal<fn(i32)> = Signal::new();
		for _ in 0..slot_count {
			value_changed.connect({
				let sink = Arc::clone(&sink);
				move |value: i32| sink.store(value, Relaxed)
			});
		}
		group.bench_with_input(
			BenchmarkId::new("signal", slot_count),
			&value_changed,
			|b, signal| {
				b.iter(|| {
					for value in 0..EMITS_PER_ITERATION {
						signal.emit(black_box(value));
					}
				});
			},
		);

		let mut baseline: Vec<Box<dyn FnMut(i32)>> = Vec::new();
		for _ in 0..slot_count {
			let sink = Arc::clone(&sink);
			baseline.push(Box::new(move |value| sink.store(value, Relaxed)));
		}
		group.bench_function(BenchmarkId::new("boxed-closures", slot_count), |b| {
			b.iter(|| {
				for value in 0..EMITS_PER_ITERATION {
					for slot in &mut baseline {
						slot(black_box(value));
					}
				}
			});
		});
	}
	group.finish();
}

fn calls(c: &mut Criterion) {
	let mut group = c.benchmark_group("call");

	let mut packed: PackedFn<fn(i32) -> i32> = PackedFn::new(|x: i32| x.wrapping_mul(x));
	group.bench_function("packed", |b| {
		b.iter(|| packed.call(black_box(7)).unwrap());
	});

	let mut boxed: Box<dyn FnMut(i32) -> i32> = Box::new(|x| x.wrapping_mul(x));
	group.bench_function("boxed", |b| {
		b.iter(|| boxed(black_box(7)));
	});

	group.finish();
}

criterion_group!(benches, emission, calls);
criterion_main!(benches);
