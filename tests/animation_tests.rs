//! Animation System Tests
//!
//! Tests for:
//! - Chunk-independent determinism of advance_by_time
//! - Completion and removal from the active set
//! - Mixed-duration scenario on a shared target
//! - Insertion-order resolution, cancellation without rollback
//! - Sequences, event-driven passes and time scaling

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use glam::{Quat, Vec2, Vec3};

use lumen::animation::{
    Animation, AnimationEngine, AnimationState, CompletionSignal, Easing, Position, Position2D,
    PropertyAnimation, RotationEuler, RotationQuaternion, Scaling, SequenceBuilder, SharedTarget,
    Transform2D, Transform3D, WaitAnimation,
};
use lumen::scheduler::AnimationSettings;

const EPSILON: f32 = 1e-5;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

/// Engine with a handful of eased animations on one 3D target.
fn scene() -> (AnimationEngine, SharedTarget<Transform3D>) {
    let target = SharedTarget::new(Transform3D::new());
    let mut engine = AnimationEngine::new();
    engine.add_animation(
        PropertyAnimation::<Position, _>::to(target.clone(), Vec3::new(3.0, -1.0, 7.0), ms(400))
            .with_easing(Easing::CubicInOut),
    );
    engine.add_animation(
        PropertyAnimation::<RotationEuler, _>::by(
            target.clone(),
            Vec3::new(0.0, FRAC_PI_2, 0.0),
            ms(300),
        )
        .with_easing(Easing::SineInOut),
    );
    engine.add_animation(PropertyAnimation::<Scaling, _>::to(
        target.clone(),
        Vec3::splat(2.5),
        ms(350),
    ));
    (engine, target)
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn single_chunk_equals_two_halves() {
    let (mut whole, a) = scene();
    let (mut halves, b) = scene();

    whole.advance_by_time(ms(200));
    halves.advance_by_time(ms(100));
    halves.advance_by_time(ms(100));

    // Bit-for-bit, not approximately.
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn replaying_deltas_reproduces_values() {
    let deltas = [ms(16), ms(17), ms(16), ms(33), ms(8), ms(50)];

    let run = || {
        let (mut engine, target) = scene();
        for delta in deltas {
            engine.advance_by_time(delta);
        }
        target.snapshot()
    };

    assert_eq!(run(), run());
}

#[test]
fn uneven_chunking_matches_within_duration() {
    let (mut coarse, a) = scene();
    let (mut fine, b) = scene();

    coarse.advance_by_time(ms(240));
    for _ in 0..24 {
        fine.advance_by_time(ms(10));
    }

    assert_eq!(a.snapshot(), b.snapshot());
}

// ============================================================================
// Completion
// ============================================================================

#[test]
fn animation_fed_its_duration_finishes_and_leaves() {
    let target = SharedTarget::new(Transform3D::new());
    let mut engine = AnimationEngine::new();
    let handle = engine.add_animation(PropertyAnimation::<Position, _>::to(
        target.clone(),
        Vec3::Y,
        ms(90),
    ));

    engine.advance_by_time(ms(30));
    engine.advance_by_time(ms(30));
    let step = engine.advance_by_time(ms(30));
    assert_eq!(step.finished_count, 1);
    assert_eq!(target.lock().position, Vec3::Y);

    assert!(!engine.contains(handle));
    let next = engine.advance_by_time(ms(30));
    assert_eq!(next.animation_count, 0);
}

#[test]
fn mixed_durations_on_shared_target() {
    let target = SharedTarget::new(Transform3D::new());
    let mut engine = AnimationEngine::new();

    let long = engine.add_animation(PropertyAnimation::<Position, _>::to(
        target.clone(),
        Vec3::new(10.0, 0.0, 0.0),
        ms(200),
    ));
    let medium = engine.add_animation(PropertyAnimation::<Scaling, _>::to(
        target.clone(),
        Vec3::splat(2.0),
        ms(100),
    ));
    let instant = engine.add_animation(PropertyAnimation::<RotationQuaternion, _>::to(
        target.clone(),
        Quat::from_rotation_z(1.0),
        Duration::ZERO,
    ));

    let step = engine.advance_by_time(ms(100));

    assert_eq!(step.animation_count, 3);
    assert_eq!(step.finished_count, 2);
    assert!(!engine.contains(instant));
    assert!(!engine.contains(medium));
    assert_eq!(engine.progress(long), Some(0.5));

    let t = target.snapshot();
    assert_eq!(t.scaling, Vec3::splat(2.0));
    assert_eq!(t.rotation_quaternion, Quat::from_rotation_z(1.0));
    assert!(approx_vec3(t.position, Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn zero_duration_applies_on_first_tick_even_with_zero_delta() {
    let target = SharedTarget::new(Transform2D::default());
    let mut engine = AnimationEngine::new();
    engine.add_animation(PropertyAnimation::<Position2D, _>::to(
        target.clone(),
        Vec2::new(-4.0, 8.0),
        Duration::ZERO,
    ));

    let step = engine.advance_by_time(Duration::ZERO);
    assert_eq!(step.finished_count, 1);
    assert_eq!(target.lock().position, Vec2::new(-4.0, 8.0));
    assert!(engine.is_idle());
}

// ============================================================================
// Ordering & Cancellation
// ============================================================================

#[test]
fn later_animation_on_same_property_applies_last() {
    let target = SharedTarget::new(Transform3D::new());
    let mut engine = AnimationEngine::new();
    engine.add_animation(PropertyAnimation::<Position, _>::to(target.clone(), Vec3::X, ms(100)));
    engine.add_animation(PropertyAnimation::<Position, _>::to(target.clone(), Vec3::Z, ms(100)));

    engine.advance_by_time(ms(100));
    assert_eq!(target.lock().position, Vec3::Z);
}

#[test]
fn cancel_keeps_last_value() {
    let target = SharedTarget::new(Transform3D::new());
    let mut engine = AnimationEngine::new();
    let handle = engine.add_animation(PropertyAnimation::<Position, _>::to(
        target.clone(),
        Vec3::new(8.0, 0.0, 0.0),
        ms(100),
    ));

    engine.advance_by_time(ms(25));
    assert!(engine.cancel(handle));
    assert!(!engine.cancel(handle));

    engine.advance_by_time(ms(75));
    assert!((target.lock().position.x - 2.0).abs() < EPSILON);
}

#[test]
fn cancel_target_removes_only_that_target() {
    let a = SharedTarget::new(Transform3D::new());
    let b = SharedTarget::new(Transform3D::new());
    let mut engine = AnimationEngine::new();
    engine.add_animation(PropertyAnimation::<Position, _>::to(a.clone(), Vec3::X, ms(100)));
    engine.add_animation(PropertyAnimation::<Scaling, _>::to(a.clone(), Vec3::ONE * 2.0, ms(100)));
    engine.add_animation(PropertyAnimation::<Position, _>::to(b.clone(), Vec3::Y, ms(100)));
    engine.add_animation(WaitAnimation::new(ms(100)));

    assert_eq!(engine.cancel_target(a.id()), 2);
    assert_eq!(engine.active_count(), 2);

    engine.advance_by_time(ms(100));
    assert_eq!(a.lock().position, Vec3::ZERO);
    assert_eq!(b.lock().position, Vec3::Y);
}

#[test]
fn clear_empties_engine() {
    let (mut engine, _target) = scene();
    assert_eq!(engine.active_count(), 3);
    engine.clear();
    assert!(engine.is_idle());
}

// ============================================================================
// Sequences & Event-Driven Passes
// ============================================================================

#[test]
fn sequence_runs_steps_in_order() {
    let cube = SharedTarget::new(Transform3D::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut engine = AnimationEngine::new();
    let handle = SequenceBuilder::new(cube.clone())
        .move_by(Vec3::new(1.0, 0.0, 0.0), ms(100))
        .call(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .move_by(Vec3::new(0.0, 1.0, 0.0), ms(100))
        .start(&mut engine);

    engine.advance_by_time(ms(50));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    engine.advance_by_time(ms(100));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let pos = cube.lock().position;
    assert_eq!(pos.x, 1.0);
    assert!((pos.y - 0.5).abs() < EPSILON);
    assert_eq!(engine.progress(handle), Some(0.75));

    engine.advance_by_time(ms(50));
    assert!(approx_vec3(cube.lock().position, Vec3::new(1.0, 1.0, 0.0)));
    assert!(!engine.contains(handle));
}

#[test]
fn signalled_sequence_waits_for_external_event() {
    let cube = SharedTarget::new(Transform3D::new());
    let loaded = CompletionSignal::new();
    let mut engine = AnimationEngine::new();

    let handle = SequenceBuilder::new(cube.clone())
        .wait_for(&loaded)
        .scale_to(Vec3::splat(3.0), ms(20))
        .start(&mut engine);

    for _ in 0..5 {
        engine.advance_by_time(ms(100));
    }
    assert_eq!(engine.state(handle), Some(AnimationState::Running));
    assert_eq!(engine.progress(handle), None);

    loaded.signal();
    engine.advance_by_time(ms(20));
    assert_eq!(cube.lock().scaling, Vec3::splat(3.0));
    assert!(engine.is_idle());
}

#[test]
fn event_driven_pass_records_every_boundary() {
    let target = SharedTarget::new(Transform3D::new());
    let mut engine = AnimationEngine::new();
    engine.add_animation(PropertyAnimation::<Position, _>::to(target.clone(), Vec3::X, ms(40)));
    engine.add_animation(WaitAnimation::new(ms(10)));
    engine.add_animation(WaitAnimation::new(ms(25)));

    let pass = engine.advance_event_driven(ms(60));

    let simulated: Vec<_> = pass.steps().iter().map(|s| s.simulated_time).collect();
    assert_eq!(simulated, vec![ms(10), ms(15), ms(15), ms(20)]);
    let counts: Vec<_> = pass.steps().iter().map(|s| s.animation_count).collect();
    assert_eq!(counts, vec![3, 2, 1, 0]);
    assert_eq!(pass.count_steps(), 4);
    assert_eq!(pass.total_time(), pass.steps().iter().map(|s| s.update_time).sum::<Duration>());
    assert_eq!(target.lock().position, Vec3::X);
}

#[test]
fn event_driven_pass_matches_single_step_values() {
    let (mut stepped, a) = scene();
    let (mut split, b) = scene();

    stepped.advance_by_time(ms(500));
    split.advance_event_driven(ms(500));

    assert_eq!(a.snapshot(), b.snapshot());
    assert!(stepped.is_idle());
    assert!(split.is_idle());
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn time_scale_stretches_time() {
    let mut engine = AnimationEngine::with_settings(AnimationSettings {
        time_scale: 0.5,
        ..Default::default()
    });
    let wait = engine.add_animation(WaitAnimation::new(ms(100)));

    engine.advance_by_time(ms(100));
    let progress = engine.progress(wait).unwrap();
    assert!((progress - 0.5).abs() < EPSILON);
}

#[test]
fn scaled_time_is_independent_of_chunking() {
    let run = |deltas: &[Duration]| {
        let target = SharedTarget::new(Transform3D::new());
        let mut engine = AnimationEngine::with_settings(AnimationSettings {
            time_scale: 1.0 / 3.0,
            ..Default::default()
        });
        let handle = engine.add_animation(PropertyAnimation::<Position, _>::to(
            target.clone(),
            Vec3::new(1000.0, 0.0, 0.0),
            Duration::from_secs(10),
        ));
        for delta in deltas {
            engine.advance_by_time(*delta);
        }
        (target.snapshot(), engine.progress(handle))
    };

    let (whole, whole_progress) = run(&[ms(170)]);
    let (chunked, chunked_progress) = run(&[ms(17); 10]);

    assert_eq!(whole, chunked);
    assert_eq!(whole_progress, chunked_progress);
    assert!(whole.position.x > 5.6 && whole.position.x < 5.7);
}

#[test]
fn changing_time_scale_keeps_applied_time() {
    let mut engine = AnimationEngine::with_settings(AnimationSettings {
        time_scale: 0.5,
        ..Default::default()
    });
    let wait = engine.add_animation(WaitAnimation::new(ms(100)));

    engine.advance_by_time(ms(40));
    engine.set_time_scale(2.0).unwrap();
    engine.advance_by_time(ms(10));

    // 20ms at half speed, then 20ms at double speed.
    let progress = engine.progress(wait).unwrap();
    assert!((progress - 0.4).abs() < EPSILON);
}

#[test]
fn paused_engine_leaves_targets_alone() {
    let (mut engine, target) = scene();
    let before = target.snapshot();

    engine.pause();
    let step = engine.advance_by_time(ms(100));
    assert_eq!(step.animation_count, 3);
    assert_eq!(target.snapshot(), before);
    assert!(engine.is_paused());
}

#[test]
fn builtin_wait_reports_labels() {
    let wait = WaitAnimation::new(ms(5));
    assert_eq!(wait.label(), "Wait");
    let anim =
        PropertyAnimation::<Position, _>::to(SharedTarget::new(Transform3D::new()), Vec3::X, ms(1));
    assert_eq!(anim.label(), "Position");
}
