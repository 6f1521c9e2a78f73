//! # Ribbon Engine Verification Tests
//!
//! End-to-end checks through the plugin interface:
//!
//! 1. **Capacity**: exhaustion degrades to "no trail", slots are conserved
//! 2. **History**: FIFO window, delayed drain releases exactly once
//! 3. **Hand-off**: the renderer only ever sees the previous tick's side
//!
//! Run with: cargo test -p trailfx_ribbon --test stripe_verification

use std::sync::Arc;

use trailfx_core::BufferMode;
use trailfx_ribbon::{
    AnimatedValue, DrawCommand, DrawOutcome, EmitterConfig, EmitterHandle, ParticleState,
    RibbonConfig, RibbonTrailPlugin, StepContext, StripeBuffers, StripeHandle, StripeState,
    StripeSystem, StripeVertex, SystemConfig, TextureMode,
};
use trailfx_shared::Vec3;

fn system(max_stripes: usize, mode: BufferMode) -> StripeSystem {
    StripeSystem::new(SystemConfig {
        max_stripes,
        max_history_len: 8,
        max_vertices_per_stripe: 64,
        buffer_mode: mode,
        ..Default::default()
    })
    .unwrap()
}

fn emitter_config(ribbon: RibbonConfig) -> EmitterConfig {
    EmitterConfig {
        ribbon,
        emit_rate: AnimatedValue::constant(1.0),
        particle_life: AnimatedValue::constant(100.0),
        ..Default::default()
    }
}

fn ribbon(history_len: usize) -> RibbonConfig {
    RibbonConfig {
        history_len,
        ..Default::default()
    }
}

#[allow(clippy::cast_precision_loss)]
fn particle_at(tick: u64) -> ParticleState {
    ParticleState::at(Vec3::new(tick as f32, 0.0, 0.0)).with_velocity(Vec3::X)
}

/// One host tick over `stripes`, sampling each at `x = tick`.
fn host_tick(sys: &mut StripeSystem, emitter: EmitterHandle, stripes: &[StripeHandle], tick: u64) {
    sys.on_emitter_pre_calculate(emitter, true);
    for &stripe in stripes {
        sys.on_particle_calculate(emitter, stripe, &particle_at(tick), &StepContext::tick(tick));
    }
    sys.on_emitter_post_calculate(emitter);
}

fn empty_tick(sys: &mut StripeSystem, emitter: EmitterHandle) {
    sys.on_emitter_pre_calculate(emitter, true);
    sys.on_emitter_post_calculate(emitter);
}

// ============================================================================
// CAPACITY
// ============================================================================

#[test]
fn verify_fifth_emit_fails_gracefully() {
    let mut sys = system(4, BufferMode::Double);
    let emitter = sys.on_emitter_initialize(&emitter_config(ribbon(8))).unwrap();

    let stripes: Vec<_> = (0..4)
        .map(|_| sys.on_particle_emit(emitter, &particle_at(0)))
        .collect();
    assert!(stripes.iter().all(Option::is_some));

    assert!(sys.on_particle_emit(emitter, &particle_at(0)).is_none());
    let stats = sys.stats();
    assert_eq!(stats.active, 4);
    assert_eq!(stats.misses(), 1);

    // The four live ribbons still work
    let live: Vec<_> = stripes.into_iter().flatten().collect();
    host_tick(&mut sys, emitter, &live, 0);
    host_tick(&mut sys, emitter, &live, 1);
    for &s in &live {
        assert_eq!(sys.stripe(s).unwrap().history_count(), 2);
    }
}

#[test]
fn verify_pool_conservation() {
    let mut sys = system(6, BufferMode::Double);
    let emitter = sys.on_emitter_initialize(&emitter_config(ribbon(4))).unwrap();

    let mut live = Vec::new();
    for round in 0..40u64 {
        if round % 3 == 2 {
            if let Some(s) = live.pop() {
                sys.on_particle_remove(emitter, s);
            }
        } else if let Some(s) = sys.on_particle_emit(emitter, &particle_at(round)) {
            assert!(!live.contains(&s), "slot handed out twice");
            live.push(s);
        }
        host_tick(&mut sys, emitter, &live, round);

        let stats = sys.stats();
        assert!(sys.used_count() <= sys.capacity());
        assert_eq!(sys.used_count(), stats.live());
        assert_eq!(stats.created - stats.released, sys.used_count() as u64);
    }

    for s in live.drain(..) {
        sys.on_particle_remove(emitter, s);
    }
    for _ in 0..4 {
        empty_tick(&mut sys, emitter);
    }
    assert_eq!(sys.used_count(), 0);
    let stats = sys.stats();
    assert_eq!(stats.created, stats.released);
}

#[test]
fn verify_round_robin_reuse() {
    let mut sys = system(4, BufferMode::Double);
    let emitter = sys.on_emitter_initialize(&emitter_config(ribbon(4))).unwrap();

    let a = sys.on_particle_emit(emitter, &particle_at(0)).unwrap();
    sys.on_particle_remove(emitter, a);
    let b = sys.on_particle_emit(emitter, &particle_at(0)).unwrap();
    // The freed slot is not handed straight back
    assert_ne!(a, b);
    assert_eq!(b.index(), a.index() + 1);
}

// ============================================================================
// HISTORY
// ============================================================================

#[test]
fn verify_history_window_after_twenty_steps() {
    let mut sys = system(4, BufferMode::Double);
    let emitter = sys.on_emitter_initialize(&emitter_config(ribbon(8))).unwrap();
    let stripe = sys.on_particle_emit(emitter, &particle_at(1)).unwrap();

    for tick in 1..=20 {
        host_tick(&mut sys, emitter, &[stripe], tick);
    }

    let history = sys.stripe(stripe).unwrap().history();
    assert_eq!(history.len(), 8);
    let xs: Vec<f32> = history.iter().map(|s| s.position.x).collect();
    assert_eq!(xs, vec![13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0, 20.0]);
}

#[test]
fn verify_retired_ribbon_drains_in_history_count_ticks() {
    let mut sys = system(4, BufferMode::Double);
    let emitter = sys.on_emitter_initialize(&emitter_config(ribbon(8))).unwrap();
    let stripe = sys.on_particle_emit(emitter, &particle_at(0)).unwrap();

    for tick in 0..5 {
        host_tick(&mut sys, emitter, &[stripe], tick);
    }
    assert_eq!(sys.stripe(stripe).unwrap().history_count(), 5);

    sys.on_particle_remove(emitter, stripe);
    assert_eq!(sys.stripe(stripe).unwrap().state(), StripeState::Delayed);

    for drained in 1..=5 {
        sys.drain_delayed(emitter);
        if drained < 5 {
            assert_eq!(sys.stripe(stripe).unwrap().history_count(), 5 - drained);
        }
    }
    assert!(sys.stripe(stripe).is_none());
    assert_eq!(sys.used_count(), 0);
    assert_eq!(sys.stats().released, 1);

    sys.drain_delayed(emitter);
    assert_eq!(sys.stats().released, 1);
}

#[test]
fn verify_drain_terminates_for_every_fill_level() {
    for filled in 1..=8u64 {
        let mut sys = system(2, BufferMode::Triple);
        let emitter = sys.on_emitter_initialize(&emitter_config(ribbon(8))).unwrap();
        let stripe = sys.on_particle_emit(emitter, &particle_at(0)).unwrap();
        for tick in 0..filled {
            host_tick(&mut sys, emitter, &[stripe], tick);
        }
        sys.on_particle_remove(emitter, stripe);

        let mut ticks = 0;
        while sys.used_count() > 0 {
            empty_tick(&mut sys, emitter);
            ticks += 1;
            assert!(ticks <= 8, "delayed ribbon never drained");
        }
        assert_eq!(ticks, filled);
        assert_eq!(sys.stats().released, 1);
    }
}

#[test]
fn verify_ribbon_life_drains_while_particle_lives() {
    let mut sys = system(2, BufferMode::Double);
    let config = RibbonConfig {
        life: Some(4.0),
        ..ribbon(8)
    };
    let emitter = sys.on_emitter_initialize(&emitter_config(config)).unwrap();
    let stripe = sys.on_particle_emit(emitter, &particle_at(0)).unwrap();

    for tick in 0..4 {
        host_tick(&mut sys, emitter, &[stripe], tick);
    }
    assert!(sys.stripe(stripe).unwrap().is_expired());
    assert_eq!(sys.stripe(stripe).unwrap().history_count(), 4);

    for tick in 4..8 {
        host_tick(&mut sys, emitter, &[stripe], tick);
    }
    // Still owned by its particle, but fully drained
    let s = sys.stripe(stripe).unwrap();
    assert_eq!(s.state(), StripeState::Active);
    assert_eq!(s.history_count(), 0);

    sys.on_particle_remove(emitter, stripe);
    assert_eq!(sys.used_count(), 0);
}

// ============================================================================
// HAND-OFF
// ============================================================================

fn head_x(vertices: &[StripeVertex]) -> f32 {
    vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max)
}

#[test]
fn verify_draw_reads_previous_tick() {
    for (mode, lag) in [(BufferMode::Double, 1u64), (BufferMode::Triple, 2)] {
        let mut sys = system(2, mode);
        let emitter = sys.on_emitter_initialize(&emitter_config(ribbon(8))).unwrap();
        let stripe = sys.on_particle_emit(emitter, &particle_at(0)).unwrap();
        let buffers = sys.buffers();

        for tick in 0..12u64 {
            host_tick(&mut sys, emitter, &[stripe], tick);

            let mut commands: Vec<DrawCommand> = Vec::new();
            let outcome = sys.on_emitter_draw(emitter, &mut commands);
            let write_side = sys.emitter(emitter).unwrap().side().write_side();

            if tick < lag + 1 {
                // Nothing with two samples has reached the read side yet
                assert_eq!(outcome, DrawOutcome::Handled { commands: 0 });
                continue;
            }
            assert_eq!(outcome, DrawOutcome::Handled { commands: 1 });
            let cmd = commands[0];
            assert_ne!(cmd.side, write_side);

            let vertices = buffers.command_vertices(&cmd);
            #[allow(clippy::cast_precision_loss)]
            let expected = (tick - lag) as f32;
            assert_eq!(head_x(&vertices), expected);
        }
    }
}

#[test]
fn verify_single_mode_reads_current_tick() {
    let mut sys = system(2, BufferMode::Single);
    let emitter = sys.on_emitter_initialize(&emitter_config(ribbon(8))).unwrap();
    let stripe = sys.on_particle_emit(emitter, &particle_at(0)).unwrap();
    let buffers = sys.buffers();

    for tick in 0..4 {
        host_tick(&mut sys, emitter, &[stripe], tick);
    }
    let mut commands = Vec::new();
    sys.on_emitter_draw(emitter, &mut commands);
    assert_eq!(head_x(&buffers.command_vertices(&commands[0])), 3.0);
}

#[test]
fn verify_delayed_ribbons_are_drawn() {
    let mut sys = system(2, BufferMode::Double);
    let emitter = sys.on_emitter_initialize(&emitter_config(ribbon(8))).unwrap();
    let stripe = sys.on_particle_emit(emitter, &particle_at(0)).unwrap();
    for tick in 0..6 {
        host_tick(&mut sys, emitter, &[stripe], tick);
    }
    sys.on_particle_remove(emitter, stripe);
    empty_tick(&mut sys, emitter);
    empty_tick(&mut sys, emitter);

    let mut commands = Vec::new();
    assert_eq!(
        sys.on_emitter_draw(emitter, &mut commands),
        DrawOutcome::Handled { commands: 1 }
    );
    // Read side holds the first drain: 5 samples
    assert_eq!(commands[0].vertex_count, 10);
}

#[test]
fn verify_distance_texture_monotonic_through_system() {
    let mut sys = system(2, BufferMode::Single);
    let config = RibbonConfig {
        texture_mode: TextureMode::Distance,
        texture_length: 2.5,
        subdivisions: 2,
        history_len: 6,
        ..Default::default()
    };
    let emitter = sys.on_emitter_initialize(&emitter_config(config)).unwrap();
    let stripe = sys.on_particle_emit(emitter, &particle_at(0)).unwrap();
    let buffers = sys.buffers();

    for tick in 0..10u64 {
        sys.on_emitter_pre_calculate(emitter, true);
        #[allow(clippy::cast_precision_loss)]
        let t = tick as f32;
        // Accelerating, curving path
        let p = ParticleState::at(Vec3::new(t * t * 0.5, t.sin(), 0.0));
        sys.on_particle_calculate(emitter, stripe, &p, &StepContext::tick(tick));
        sys.on_emitter_post_calculate(emitter);

        let mut commands = Vec::new();
        sys.on_emitter_draw(emitter, &mut commands);
        if let Some(cmd) = commands.first() {
            let vertices = buffers.command_vertices(cmd);
            let vs: Vec<f32> = vertices.iter().step_by(2).map(StripeVertex::tex_v).collect();
            assert!(vs.windows(2).all(|w| w[1] >= w[0]), "V decreased at tick {tick}");
        }
    }
}

#[test]
fn verify_render_thread_hand_off() {
    let mut sys = system(8, BufferMode::Double);
    let emitter = sys.on_emitter_initialize(&emitter_config(ribbon(8))).unwrap();
    let stripes: Vec<_> = (0..3)
        .filter_map(|_| sys.on_particle_emit(emitter, &particle_at(0)))
        .collect();
    let buffers: Arc<StripeBuffers> = sys.buffers();

    let (tx, rx) = crossbeam_channel::unbounded::<DrawCommand>();
    let renderer = std::thread::spawn(move || {
        let mut uploaded = 0usize;
        let mut bytes = Vec::new();
        for cmd in rx {
            bytes.clear();
            buffers.copy_command_bytes(&cmd, &mut bytes);
            assert_eq!(bytes.len(), cmd.vertex_count * StripeVertex::SIZE);
            uploaded += 1;
        }
        uploaded
    });

    let mut sink = tx;
    let mut submitted = 0;
    for tick in 0..10 {
        host_tick(&mut sys, emitter, &stripes, tick);
        if let DrawOutcome::Handled { commands } = sys.on_emitter_draw(emitter, &mut sink) {
            submitted += commands;
        }
    }
    drop(sink);

    let uploaded = renderer.join().unwrap();
    assert_eq!(uploaded, submitted);
    assert_eq!(submitted, 3 * 8);
}
