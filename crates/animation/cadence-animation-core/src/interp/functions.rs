//! Interpolation kernels:
//! - step_value (discrete switch at the segment midpoint)
//! - linear_value (component-wise; quaternions via shortest-arc NLERP)
//! - slerp_quat (spherical, shortest arc, linear fallback when near-parallel)
//! - hermite_vec3 (cubic Hermite with explicit tangents)
//! - catmull_rom (uniform spline over an arbitrary point list)
//!
//! Every kernel takes an already-eased `t` in [0, 1].

use cadence_api_core::Value;

/// Quaternions whose dot product exceeds this are treated as parallel.
const SLERP_PARALLEL_EPS: f64 = 1e-10;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Component-wise lerp for fixed-size arrays.
#[inline]
pub fn lerp_array<const N: usize>(a: &[f32; N], b: &[f32; N], t: f32) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = lerp_f32(a[i], b[i], t);
    }
    out
}

#[inline]
pub(crate) fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
pub(crate) fn normalize4(mut q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 {
        let inv_len = len2.sqrt().recip();
        q[0] *= inv_len;
        q[1] *= inv_len;
        q[2] *= inv_len;
        q[3] *= inv_len;
    } else {
        q = [0.0, 0.0, 0.0, 1.0];
    }
    q
}

/// Quaternion NLERP with shortest-arc correction.
#[inline]
pub fn nlerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    if dot4(a, b) < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
    }
    normalize4(lerp_array(&a, &b, t))
}

/// Hamilton product `a * b` of quaternions (x, y, z, w).
#[inline]
pub fn quat_mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}

/// Spherical linear interpolation between quaternions (x, y, z, w).
///
/// Takes the shortest arc (negating `end` when the dot product is negative) and
/// falls back to normalized lerp when the inputs are nearly parallel. Evaluated
/// in f64 so the parallel threshold is meaningful; the result is unit length.
pub fn slerp_quat(start: [f32; 4], end: [f32; 4], t: f32) -> [f32; 4] {
    let a = start.map(f64::from);
    let mut b = end.map(f64::from);
    let t = f64::from(t);

    let mut cos_theta = a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3];
    if cos_theta < 0.0 {
        b = b.map(|c| -c);
        cos_theta = -cos_theta;
    }

    if cos_theta > 1.0 - SLERP_PARALLEL_EPS {
        let q = [
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
            a[3] + (b[3] - a[3]) * t,
        ];
        return normalize4(q.map(|c| c as f32));
    }

    let theta = cos_theta.min(1.0).acos();
    let sin_theta = theta.sin();
    let s0 = ((1.0 - t) * theta).sin() / sin_theta;
    let s1 = (t * theta).sin() / sin_theta;
    let q = [
        s0 * a[0] + s1 * b[0],
        s0 * a[1] + s1 * b[1],
        s0 * a[2] + s1 * b[2],
        s0 * a[3] + s1 * b[3],
    ];
    normalize4(q.map(|c| c as f32))
}

/// Step interpolation: the start value below the midpoint, the end value from it on.
#[inline]
pub fn step_value(a: &Value, b: &Value, t: f32) -> Value {
    if t < 0.5 {
        a.clone()
    } else {
        b.clone()
    }
}

/// Linear interpolation across Value kinds. Opaque or mismatched kinds degrade
/// to a discrete step.
pub fn linear_value(a: &Value, b: &Value, t: f32) -> Value {
    match (a, b) {
        (Value::Scalar(va), Value::Scalar(vb)) => Value::Scalar(lerp_f32(*va, *vb, t)),
        (Value::Vec2(va), Value::Vec2(vb)) => Value::Vec2(lerp_array(va, vb, t)),
        (Value::Vec3(va), Value::Vec3(vb)) => Value::Vec3(lerp_array(va, vb, t)),
        (Value::Vec4(va), Value::Vec4(vb)) => Value::Vec4(lerp_array(va, vb, t)),
        (Value::Quat(qa), Value::Quat(qb)) => Value::Quat(nlerp_quat(*qa, *qb, t)),
        _ => step_value(a, b, t),
    }
}

/// Spherical interpolation for quaternion values; other kinds go through `linear_value`.
pub fn spherical_value(a: &Value, b: &Value, t: f32) -> Value {
    match (a, b) {
        (Value::Quat(qa), Value::Quat(qb)) => Value::Quat(slerp_quat(*qa, *qb, t)),
        _ => linear_value(a, b, t),
    }
}

/// Hermite basis functions (h00, h10, h01, h11) evaluated at `t`.
#[inline]
pub fn hermite_basis(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        2.0 * t3 - 3.0 * t2 + 1.0,
        t3 - 2.0 * t2 + t,
        -2.0 * t3 + 3.0 * t2,
        t3 - t2,
    ]
}

/// Cubic Hermite between `p0` and `p1` with tangents `m0`, `m1`.
pub fn hermite_vec3(p0: [f32; 3], m0: [f32; 3], p1: [f32; 3], m1: [f32; 3], t: f32) -> [f32; 3] {
    let [h00, h10, h01, h11] = hermite_basis(t);
    let mut out = [0.0f32; 3];
    for i in 0..3 {
        out[i] = h00 * p0[i] + h10 * m0[i] + h01 * p1[i] + h11 * m1[i];
    }
    out
}

/// Hermite over Values: Vec3 only, any other kind falls back to `linear_value`.
pub fn hermite_value(p0: &Value, m0: &Value, p1: &Value, m1: &Value, t: f32) -> Value {
    match (p0, m0, p1, m1) {
        (Value::Vec3(a), Value::Vec3(ma), Value::Vec3(b), Value::Vec3(mb)) => {
            Value::Vec3(hermite_vec3(*a, *ma, *b, *mb, t))
        }
        _ => linear_value(p0, p1, t),
    }
}

/// Evaluate a uniform Catmull-Rom spline through `points` at global `t` in [0, 1].
///
/// The local window is chosen by `floor(t * (n - 1))`; endpoints are duplicated
/// at the sequence boundaries. Returns `None` for fewer than two points.
pub fn catmull_rom<const N: usize>(points: &[[f32; N]], t: f32) -> Option<[f32; N]> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (n - 1) as f32;
    let i = (scaled.floor() as usize).min(n - 2);
    let u = scaled - i as f32;

    let p0 = &points[i.saturating_sub(1)];
    let p1 = &points[i];
    let p2 = &points[i + 1];
    let p3 = &points[(i + 2).min(n - 1)];

    let u2 = u * u;
    let u3 = u2 * u;
    let mut out = [0.0f32; N];
    for c in 0..N {
        out[c] = 0.5
            * ((2.0 * p1[c])
                + (-p0[c] + p2[c]) * u
                + (2.0 * p0[c] - 5.0 * p1[c] + 4.0 * p2[c] - p3[c]) * u2
                + (-p0[c] + 3.0 * p1[c] - 3.0 * p2[c] + p3[c]) * u3);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "left={a} right={b}");
    }

    #[test]
    fn step_switches_at_midpoint() {
        let a = Value::Scalar(0.0);
        let b = Value::Scalar(10.0);
        assert_eq!(step_value(&a, &b, 0.49), a);
        assert_eq!(step_value(&a, &b, 0.5), b);
    }

    #[test]
    fn linear_opaque_falls_back_to_step() {
        let a = Value::Opaque(serde_json::json!("a"));
        let b = Value::Opaque(serde_json::json!("b"));
        assert_eq!(linear_value(&a, &b, 0.2), a);
        assert_eq!(linear_value(&a, &b, 0.7), b);
    }

    #[test]
    fn slerp_endpoints_and_midpoint() {
        let s = std::f32::consts::FRAC_1_SQRT_2;
        let id = [0.0, 0.0, 0.0, 1.0];
        let z90 = [0.0, 0.0, s, s];
        let q0 = slerp_quat(id, z90, 0.0);
        let q1 = slerp_quat(id, z90, 1.0);
        for i in 0..4 {
            approx(q0[i], id[i]);
            approx(q1[i], z90[i]);
        }
        // Halfway is a 45 degree rotation about z.
        let mid = slerp_quat(id, z90, 0.5);
        approx(mid[2], (std::f32::consts::PI / 8.0).sin());
        approx(dot4(mid, mid), 1.0);
    }

    #[test]
    fn slerp_takes_shortest_arc() {
        let id = [0.0, 0.0, 0.0, 1.0];
        let neg_id = [0.0, 0.0, 0.0, -1.0];
        let q = slerp_quat(id, neg_id, 0.5);
        approx(q[3].abs(), 1.0);
    }

    #[test]
    fn slerp_parallel_inputs_do_not_produce_nan() {
        let q = [0.0, 0.0, 0.0, 1.0];
        let r = slerp_quat(q, q, 0.3);
        assert!(r.iter().all(|c| c.is_finite()));
        approx(r[3], 1.0);
    }

    #[test]
    fn hermite_hits_endpoints() {
        let p0 = [0.0, 0.0, 0.0];
        let p1 = [10.0, 5.0, 0.0];
        let m = [1.0, 1.0, 1.0];
        assert_eq!(hermite_vec3(p0, m, p1, m, 0.0), p0);
        assert_eq!(hermite_vec3(p0, m, p1, m, 1.0), p1);
        let basis = hermite_basis(0.5);
        approx(basis[0] + basis[2], 1.0);
    }

    #[test]
    fn catmull_rom_passes_through_control_points() {
        let pts = [[0.0, 0.0], [1.0, 2.0], [2.0, 0.0], [3.0, 2.0]];
        let start = catmull_rom(&pts, 0.0).unwrap();
        let end = catmull_rom(&pts, 1.0).unwrap();
        let second = catmull_rom(&pts, 1.0 / 3.0).unwrap();
        assert_eq!(start, [0.0, 0.0]);
        assert_eq!(end, [3.0, 2.0]);
        approx(second[0], 1.0);
        approx(second[1], 2.0);
        assert!(catmull_rom::<2>(&pts[..1], 0.5).is_none());
    }
}
