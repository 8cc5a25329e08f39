//! Cost of one learning step at a few network widths.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ddqn::agent::DqnAgentBuilder;
use ddqn::network::Device;
use ddqn::replay_buffer::Experience;
use ndarray::Array1;

fn filled_agent(hidden: usize, device: Device) -> ddqn::agent::DqnAgent {
    let mut agent = DqnAgentBuilder::new()
        .layer_sizes(&[8, hidden, hidden, 4])
        .batch_size(64)
        .memory_size(10_000)
        .target_update_rate(100)
        .device(device)
        .seed(0)
        .build()
        .expect("valid configuration");

    for i in 0..1_000 {
        let x = (i % 97) as f32 / 97.0;
        agent
            .remember(Experience {
                state: Array1::from_elem(8, x),
                action: i % 4,
                reward: x - 0.5,
                next_state: Array1::from_elem(8, 1.0 - x),
                done: i % 50 == 0,
            })
            .expect("valid transition");
    }
    agent
}

fn bench_learn(c: &mut Criterion) {
    let mut group = c.benchmark_group("learn");
    for hidden in [32, 128] {
        for device in [Device::Cpu, Device::Parallel] {
            let mut agent = filled_agent(hidden, device);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", device), hidden),
                &hidden,
                |b, _| b.iter(|| black_box(agent.learn().expect("learning step"))),
            );
        }
    }
    group.finish();
}

fn bench_act(c: &mut Criterion) {
    let mut agent = filled_agent(128, Device::Cpu);
    agent.set_epsilon(0.0);
    let state = Array1::from_elem(8, 0.25);
    c.bench_function("act_greedy", |b| b.iter(|| black_box(agent.act(state.view()).expect("action"))));
}

criterion_group!(benches, bench_learn, bench_act);
criterion_main!(benches);
