//! Accumulation of per-property contributions and blending into final Values.
//!
//! Normal-mode contributions are combined as `Σ(value·weight) / Σ(weight)`,
//! component-wise. Quaternions are summed in the hemisphere of the first
//! contributor and renormalized. Opaque values are not blended: the first
//! contributor wins. Additive contributions are layered on the normal result
//! (component-wise `value·weight`; rotations are composed).

use indexmap::IndexMap;

use cadence_api_core::{PropertyPath, Value, ValueKind, WriteBatch, WriteOp};

use crate::config::BlendMode;
use crate::interp::functions::{dot4, normalize4, nlerp_quat, quat_mul};

const IDENTITY_QUAT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

#[derive(Clone, Debug)]
enum AccumEntry {
    Numeric {
        kind: ValueKind,
        sum: [f32; 4],
        w: f32,
        /// First normal-mode quaternion; later ones are flipped into its hemisphere.
        reference: Option<[f32; 4]>,
        additive: [f32; 4],
        additive_rot: [f32; 4],
        has_additive: bool,
    },
    Opaque(Value),
}

impl AccumEntry {
    fn from_kind(kind: ValueKind, first: &Value) -> Self {
        match kind {
            ValueKind::Opaque => AccumEntry::Opaque(first.clone()),
            kind => AccumEntry::Numeric {
                kind,
                sum: [0.0; 4],
                w: 0.0,
                reference: None,
                additive: [0.0; 4],
                additive_rot: IDENTITY_QUAT,
                has_additive: false,
            },
        }
    }

    fn add(&mut self, path: &PropertyPath, v: &Value, weight: f32, mode: BlendMode) {
        let AccumEntry::Numeric {
            kind,
            sum,
            w,
            reference,
            additive,
            additive_rot,
            has_additive,
        } = self
        else {
            // Opaque: the first contributor already holds the slot.
            return;
        };
        if v.kind() != *kind {
            log::warn!(
                "blend: '{path}' receives {:?} but is accumulating {kind:?}; ignoring",
                v.kind()
            );
            return;
        }
        let Some(c) = v.components() else {
            return;
        };
        let mut comps = [0.0f32; 4];
        comps[..c.len()].copy_from_slice(c);

        match (mode, *kind) {
            (BlendMode::Normal, ValueKind::Quat) => {
                let r = *reference.get_or_insert(comps);
                if dot4(r, comps) < 0.0 {
                    comps = comps.map(|x| -x);
                }
                for i in 0..4 {
                    sum[i] += comps[i] * weight;
                }
                *w += weight;
            }
            (BlendMode::Normal, _) => {
                for i in 0..c.len() {
                    sum[i] += comps[i] * weight;
                }
                *w += weight;
            }
            (BlendMode::Additive, ValueKind::Quat) => {
                let delta = nlerp_quat(IDENTITY_QUAT, comps, weight);
                *additive_rot = quat_mul(*additive_rot, delta);
                *has_additive = true;
            }
            (BlendMode::Additive, _) => {
                for i in 0..c.len() {
                    additive[i] += comps[i] * weight;
                }
                *has_additive = true;
            }
        }
    }

    /// Final value, or `None` when nothing with weight contributed.
    fn blend(&self) -> Option<Value> {
        match self {
            AccumEntry::Opaque(v) => Some(v.clone()),
            AccumEntry::Numeric {
                kind,
                sum,
                w,
                additive,
                additive_rot,
                has_additive,
                ..
            } => {
                if *w <= 0.0 && !*has_additive {
                    return None;
                }
                if *kind == ValueKind::Quat {
                    let base = if *w > 0.0 { normalize4(*sum) } else { IDENTITY_QUAT };
                    let q = normalize4(quat_mul(base, *additive_rot));
                    return Some(Value::Quat(q));
                }
                let mut out = [0.0f32; 4];
                for i in 0..kind.arity() {
                    let base = if *w > 0.0 { sum[i] / *w } else { 0.0 };
                    out[i] = base + additive[i];
                }
                Value::with_components(*kind, &out)
            }
        }
    }
}

/// Per-frame blend buffer keyed by property path. Entries keep first-seen order.
#[derive(Default, Debug)]
pub struct Accumulator {
    map: IndexMap<PropertyPath, AccumEntry>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries, keeping capacity for the next frame.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Add one action's sample for `path`. Non-positive weights are ignored.
    pub fn add(&mut self, path: &PropertyPath, value: &Value, weight: f32, mode: BlendMode) {
        if weight.is_nan() || weight <= 0.0 {
            return;
        }
        match self.map.get_mut(path) {
            Some(entry) => entry.add(path, value, weight, mode),
            None => {
                let mut entry = AccumEntry::from_kind(value.kind(), value);
                entry.add(path, value, weight, mode);
                self.map.insert(path.clone(), entry);
            }
        }
    }

    /// Blended value for `path`, if it has any contribution.
    pub fn blended(&self, path: &PropertyPath) -> Option<Value> {
        self.map.get(path).and_then(AccumEntry::blend)
    }

    /// Append one write per blended property to `out`.
    pub fn write_into(&self, out: &mut WriteBatch) {
        for (path, entry) in &self.map {
            if let Some(value) = entry.blend() {
                out.push(WriteOp::new(path.clone(), value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> PropertyPath {
        PropertyPath::parse(s).unwrap()
    }

    #[test]
    fn weighted_mean_of_scalars() {
        let mut acc = Accumulator::new();
        acc.add(&path("x"), &Value::Scalar(0.0), 0.5, BlendMode::Normal);
        acc.add(&path("x"), &Value::Scalar(10.0), 0.5, BlendMode::Normal);
        assert_eq!(acc.blended(&path("x")), Some(Value::Scalar(5.0)));
    }

    #[test]
    fn mean_is_normalized_by_total_weight() {
        let mut acc = Accumulator::new();
        acc.add(&path("p"), &Value::vec3(0.0, 0.0, 0.0), 0.2, BlendMode::Normal);
        acc.add(&path("p"), &Value::vec3(10.0, 20.0, 0.0), 0.2, BlendMode::Normal);
        assert_eq!(acc.blended(&path("p")), Some(Value::vec3(5.0, 10.0, 0.0)));
    }

    #[test]
    fn opaque_first_contributor_wins() {
        let mut acc = Accumulator::new();
        let a = Value::Opaque(serde_json::json!({"mode": "a"}));
        let b = Value::Opaque(serde_json::json!({"mode": "b"}));
        acc.add(&path("state"), &a, 0.1, BlendMode::Normal);
        acc.add(&path("state"), &b, 0.9, BlendMode::Normal);
        assert_eq!(acc.blended(&path("state")), Some(a));
    }

    #[test]
    fn zero_weight_writes_nothing() {
        let mut acc = Accumulator::new();
        acc.add(&path("x"), &Value::Scalar(3.0), 0.0, BlendMode::Normal);
        let mut batch = WriteBatch::new();
        acc.write_into(&mut batch);
        assert!(batch.is_empty());
    }

    #[test]
    fn mismatched_kind_is_ignored() {
        let mut acc = Accumulator::new();
        acc.add(&path("x"), &Value::Scalar(2.0), 1.0, BlendMode::Normal);
        acc.add(&path("x"), &Value::vec3(9.0, 9.0, 9.0), 1.0, BlendMode::Normal);
        assert_eq!(acc.blended(&path("x")), Some(Value::Scalar(2.0)));
    }

    #[test]
    fn quaternions_blend_in_one_hemisphere() {
        let mut acc = Accumulator::new();
        acc.add(&path("r"), &Value::quat(0.0, 0.0, 0.0, 1.0), 0.5, BlendMode::Normal);
        acc.add(&path("r"), &Value::quat(0.0, 0.0, 0.0, -1.0), 0.5, BlendMode::Normal);
        let Some(Value::Quat(q)) = acc.blended(&path("r")) else {
            panic!("expected quaternion");
        };
        assert!((q[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn additive_layers_on_top() {
        let mut acc = Accumulator::new();
        acc.add(&path("x"), &Value::Scalar(4.0), 1.0, BlendMode::Normal);
        acc.add(&path("x"), &Value::Scalar(2.0), 0.5, BlendMode::Additive);
        assert_eq!(acc.blended(&path("x")), Some(Value::Scalar(5.0)));

        let mut acc = Accumulator::new();
        acc.add(&path("y"), &Value::Scalar(2.0), 0.5, BlendMode::Additive);
        assert_eq!(acc.blended(&path("y")), Some(Value::Scalar(1.0)));
    }

    #[test]
    fn write_order_follows_first_contribution() {
        let mut acc = Accumulator::new();
        acc.add(&path("b"), &Value::Scalar(1.0), 1.0, BlendMode::Normal);
        acc.add(&path("a"), &Value::Scalar(1.0), 1.0, BlendMode::Normal);
        let mut batch = WriteBatch::new();
        acc.write_into(&mut batch);
        let paths: Vec<String> = batch.iter().map(|op| op.path.to_string()).collect();
        assert_eq!(paths, ["b", "a"]);
    }
}
