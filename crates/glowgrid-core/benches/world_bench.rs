use criterion::{Criterion, criterion_group, criterion_main};
use glowgrid_core::{GridConfig, World};

fn bench_advance_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance_tick");
    for (width, height) in [(15_usize, 10_usize), (40, 30), (80, 60)] {
        let config = GridConfig {
            grid_width: width,
            grid_height: height,
            rng_seed: Some(0x51EE_D5),
            ..GridConfig::default()
        };
        let mut world = World::new(config).expect("world");
        // Warm the population past the all-zero-energy start.
        world.set_energy_all(50.0);
        group.bench_function(format!("{width}x{height}"), |b| {
            b.iter(|| world.advance_tick());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_advance_tick);
criterion_main!(benches);
