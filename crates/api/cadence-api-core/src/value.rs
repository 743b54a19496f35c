//! Value: the typed payload carried by keyframes, clip evaluations and write ops.
//! All numeric types use f32.

use serde::{Deserialize, Serialize};

/// Coarse kind of a [`Value`], used to keep tracks homogeneous and to pick an
/// interpolation kernel once per track.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Opaque,
}

impl ValueKind {
    /// Number of numeric components, or 0 for opaque values.
    #[inline]
    pub fn arity(self) -> usize {
        match self {
            ValueKind::Scalar => 1,
            ValueKind::Vec2 => 2,
            ValueKind::Vec3 => 3,
            ValueKind::Vec4 | ValueKind::Quat => 4,
            ValueKind::Opaque => 0,
        }
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        !matches!(self, ValueKind::Opaque)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Value {
    /// Scalar float
    Scalar(f32),

    /// 2D vector
    Vec2([f32; 2]),

    /// 3D vector
    Vec3([f32; 3]),

    /// 4D vector
    Vec4([f32; 4]),

    /// Unit quaternion (x, y, z, w)
    Quat([f32; 4]),

    /// Heterogeneous payload; step-only, never blended component-wise
    Opaque(serde_json::Value),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::Quat(_) => ValueKind::Quat,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    /// Numeric components in declaration order, `None` for opaque values.
    pub fn components(&self) -> Option<&[f32]> {
        match self {
            Value::Scalar(v) => Some(std::slice::from_ref(v)),
            Value::Vec2(a) => Some(a),
            Value::Vec3(a) => Some(a),
            Value::Vec4(a) | Value::Quat(a) => Some(a),
            Value::Opaque(_) => None,
        }
    }

    /// Rebuild a numeric value of `kind` from a component slice.
    /// Returns `None` for opaque kinds or when the slice is too short.
    pub fn with_components(kind: ValueKind, c: &[f32]) -> Option<Value> {
        if c.len() < kind.arity() {
            return None;
        }
        match kind {
            ValueKind::Scalar => Some(Value::Scalar(c[0])),
            ValueKind::Vec2 => Some(Value::Vec2([c[0], c[1]])),
            ValueKind::Vec3 => Some(Value::Vec3([c[0], c[1], c[2]])),
            ValueKind::Vec4 => Some(Value::Vec4([c[0], c[1], c[2], c[3]])),
            ValueKind::Quat => Some(Value::Quat([c[0], c[1], c[2], c[3]])),
            ValueKind::Opaque => None,
        }
    }

    /// Scalar payload, if this is a scalar.
    #[inline]
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Read one component by selector (`x`, `y`, `z`, `w`) from a numeric vector or quaternion.
    pub fn component(&self, selector: &str) -> Option<f32> {
        let idx = component_index(selector)?;
        match self {
            Value::Scalar(_) | Value::Opaque(_) => None,
            other => other.components().and_then(|c| c.get(idx).copied()),
        }
    }

    /// Overwrite one component by selector. Returns false if the selector does not
    /// address a component of this value.
    pub fn set_component(&mut self, selector: &str, v: f32) -> bool {
        let Some(idx) = component_index(selector) else {
            return false;
        };
        let slot = match self {
            Value::Vec2(a) => a.get_mut(idx),
            Value::Vec3(a) => a.get_mut(idx),
            Value::Vec4(a) | Value::Quat(a) => a.get_mut(idx),
            Value::Scalar(_) | Value::Opaque(_) => None,
        };
        match slot {
            Some(s) => {
                *s = v;
                true
            }
            None => false,
        }
    }

    /// Convenience constructors
    pub fn scalar(v: f32) -> Self {
        Value::Scalar(v)
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn quat(x: f32, y: f32, z: f32, w: f32) -> Self {
        Value::Quat([x, y, z, w])
    }
}

#[inline]
fn component_index(selector: &str) -> Option<usize> {
    match selector {
        "x" => Some(0),
        "y" => Some(1),
        "z" => Some(2),
        "w" => Some(3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_roundtrip_through_kind() {
        let v = Value::vec3(1.0, 2.0, 3.0);
        let c = v.components().unwrap().to_vec();
        assert_eq!(Value::with_components(ValueKind::Vec3, &c), Some(v));
        assert_eq!(Value::with_components(ValueKind::Opaque, &c), None);
        assert_eq!(Value::with_components(ValueKind::Vec4, &c), None);
    }

    #[test]
    fn component_selectors() {
        let mut v = Value::vec3(1.0, 2.0, 3.0);
        assert_eq!(v.component("y"), Some(2.0));
        assert!(v.set_component("z", 9.0));
        assert_eq!(v, Value::vec3(1.0, 2.0, 9.0));
        assert!(!v.set_component("w", 1.0));
        assert_eq!(Value::scalar(1.0).component("x"), None);
    }

    #[test]
    fn tagged_json_shape() {
        let s = serde_json::to_string(&Value::Scalar(0.5)).unwrap();
        assert_eq!(s, r#"{"type":"scalar","data":0.5}"#);
        let parsed: Value = serde_json::from_str(r#"{"type":"opaque","data":{"a":1}}"#).unwrap();
        assert_eq!(parsed.kind(), ValueKind::Opaque);
    }
}
