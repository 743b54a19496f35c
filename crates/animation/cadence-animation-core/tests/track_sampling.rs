use cadence_animation_core::{
    AnimationClip, Easing, InterpolationMode, KeyframeTrack, PropertyPath, Value,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn norm4(q: [f32; 4]) -> f32 {
    (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt()
}

fn scalar_track(mode: InterpolationMode, keys: &[(f32, f32)]) -> KeyframeTrack {
    KeyframeTrack::new(
        "x",
        keys.iter().map(|k| k.0).collect(),
        keys.iter().map(|k| Value::Scalar(k.1)).collect(),
        mode,
    )
    .unwrap()
}

#[test]
fn queries_outside_the_keys_clamp_to_the_end_values() {
    for mode in [
        InterpolationMode::Step,
        InterpolationMode::Linear,
        InterpolationMode::Cubic,
        InterpolationMode::Quaternion,
    ] {
        let track = scalar_track(mode, &[(0.5, 3.0), (1.0, 7.0), (2.0, -4.0)]);
        for t in [-100.0, -0.1, 0.0, 0.49] {
            assert_eq!(track.sample(t), Some(Value::Scalar(3.0)), "{mode} at {t}");
        }
        for t in [2.0, 2.01, 1e6, f32::INFINITY] {
            assert_eq!(track.sample(t), Some(Value::Scalar(-4.0)), "{mode} at {t}");
        }
    }
}

#[test]
fn single_keyframe_is_constant() {
    let track = KeyframeTrack::new(
        "position",
        vec![1.0],
        vec![Value::vec3(1.0, 2.0, 3.0)],
        InterpolationMode::Cubic,
    )
    .unwrap();
    for t in [-5.0, 0.0, 1.0, 3.5, 1e9] {
        assert_eq!(track.sample(t), Some(Value::vec3(1.0, 2.0, 3.0)));
    }
}

#[test]
fn linear_scalar_midpoint() {
    let track = scalar_track(InterpolationMode::Linear, &[(0.0, 0.0), (1.0, 10.0)]);
    assert_eq!(track.sample(0.5), Some(Value::Scalar(5.0)));
    assert_eq!(track.sample(0.25), Some(Value::Scalar(2.5)));
}

#[test]
fn step_switches_at_segment_midpoint() {
    let track = scalar_track(InterpolationMode::Step, &[(0.0, 0.0), (1.0, 10.0)]);
    assert_eq!(track.sample(0.49), Some(Value::Scalar(0.0)));
    assert_eq!(track.sample(0.5), Some(Value::Scalar(10.0)));
}

#[test]
fn quaternion_track_hits_endpoints_and_stays_unit() {
    let s = std::f32::consts::FRAC_1_SQRT_2;
    let start = [0.0, 0.0, 0.0, 1.0];
    let end = [s, 0.0, 0.0, s];
    let track = KeyframeTrack::new(
        "rotation",
        vec![0.0, 1.0],
        vec![Value::Quat(start), Value::Quat(end)],
        InterpolationMode::Quaternion,
    )
    .unwrap();

    let Some(Value::Quat(q0)) = track.sample(0.0) else {
        panic!("expected quaternion");
    };
    let Some(Value::Quat(q1)) = track.sample(1.0) else {
        panic!("expected quaternion");
    };
    for i in 0..4 {
        approx(q0[i], start[i], 1e-5);
        approx(q1[i], end[i], 1e-5);
    }

    for step in 0..=20 {
        let t = step as f32 / 20.0;
        let Some(Value::Quat(q)) = track.sample(t) else {
            panic!("expected quaternion");
        };
        approx(norm4(q), 1.0, 1e-5);
    }
}

#[test]
fn quaternion_track_with_easing_stays_unit() {
    let track = KeyframeTrack::new(
        "rotation",
        vec![0.0, 1.0],
        vec![Value::quat(0.0, 0.0, 0.0, 1.0), Value::quat(0.0, 1.0, 0.0, 0.0)],
        InterpolationMode::Quaternion,
    )
    .unwrap()
    .with_easing(Easing::Elastic);
    for step in 1..10 {
        let Some(Value::Quat(q)) = track.sample(step as f32 / 10.0) else {
            panic!("expected quaternion");
        };
        approx(norm4(q), 1.0, 1e-5);
    }
}

#[test]
fn cubic_vec3_is_smooth_through_keys() {
    let track = KeyframeTrack::new(
        "position",
        vec![0.0, 1.0, 2.0],
        vec![
            Value::vec3(0.0, 0.0, 0.0),
            Value::vec3(10.0, 10.0, 0.0),
            Value::vec3(20.0, 0.0, 0.0),
        ],
        InterpolationMode::Cubic,
    )
    .unwrap();
    let Some(Value::Vec3(mid)) = track.sample(0.5) else {
        panic!("expected vec3");
    };
    // Tangents (10,10,0) and (10,0,0): x stays linear, y overshoots the chord.
    approx(mid[0], 5.0, 1e-5);
    approx(mid[1], 6.25, 1e-5);
}

#[test]
fn cloned_clip_does_not_alias_keyframes() {
    let track = KeyframeTrack::new(
        "position",
        vec![0.0, 1.0],
        vec![Value::vec3(0.0, 0.0, 0.0), Value::vec3(1.0, 1.0, 1.0)],
        InterpolationMode::Linear,
    )
    .unwrap();
    let original = AnimationClip::new("c", 1.0).with_track(track);
    let mut copy = original.clone();
    {
        let t = copy.track_mut("position").unwrap();
        t.update_keyframe(0, Value::vec3(5.0, 5.0, 5.0));
        t.add_keyframe(0.5, Value::vec3(2.0, 2.0, 2.0));
    }
    let position = PropertyPath::parse("position").unwrap();
    assert_eq!(
        original.evaluate(0.0).get(&position),
        Some(&Value::vec3(0.0, 0.0, 0.0))
    );
    assert_eq!(original.track("position").unwrap().len(), 2);
    assert_eq!(copy.track("position").unwrap().len(), 3);
}
