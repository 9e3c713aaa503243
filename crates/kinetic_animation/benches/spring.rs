use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kinetic_animation::{
    AnimatableProperty, AnimationEngine, AnimationSpec, RenderSink, Spring, SpringConfig, TargetId,
};

struct NullSink;

impl RenderSink for NullSink {
    fn current_value(&self, _: TargetId, property: AnimatableProperty) -> Option<f32> {
        Some(property.identity())
    }

    fn apply(&mut self, _: TargetId, _: AnimatableProperty, value: f32) {
        black_box(value);
    }
}

fn spring_step(c: &mut Criterion) {
    c.bench_function("spring_step_60hz", |b| {
        let mut spring = Spring::new(SpringConfig::bouncy(), 0.0);
        spring.set_target(1.0);
        b.iter(|| spring.step(black_box(1.0 / 60.0)))
    });

    // Frame hitch: one quarter-second step split into stable sub-steps
    c.bench_function("spring_step_hitch", |b| {
        let mut spring = Spring::new(SpringConfig::snappy(), 0.0);
        spring.set_target(1.0);
        b.iter(|| spring.step(black_box(0.25)))
    });
}

fn engine_tick(c: &mut Criterion) {
    let mut engine = AnimationEngine::new();
    for i in 0..500 {
        let target = TargetId(i);
        let spec = AnimationSpec::builder(target)
            .animate(AnimatableProperty::Opacity, 0.5)
            .animate(AnimatableProperty::X, 120.0)
            .spring(SpringConfig::default())
            .build();
        if let Ok(spec) = spec {
            engine.start(spec);
        }
        let spec = AnimationSpec::builder(target)
            .animate(AnimatableProperty::Rotate, 15.0)
            .repeat_forever()
            .auto_reverse(true)
            .additive(true)
            .build();
        if let Ok(spec) = spec {
            engine.start(spec);
        }
    }

    let mut sink = NullSink;
    c.bench_function("engine_tick_1000_animations", |b| {
        b.iter(|| engine.tick(black_box(1000.0 / 60.0), &mut sink))
    });
}

criterion_group!(benches, spring_step, engine_tick);
criterion_main!(benches);
