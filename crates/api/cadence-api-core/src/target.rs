//! Target contract consumed by the animation write-back, plus `PropertyTree`,
//! a nested property store that satisfies it.
//!
//! A target is anything that can read and write nested properties addressed by
//! a [`PropertyPath`]. Writes auto-create missing intermediate containers.

use hashbrown::HashMap;

use crate::error::TargetError;
use crate::path::PropertyPath;
use crate::value::Value;

/// Addressable object whose nested properties are driven by a mixer.
pub trait AnimationTarget {
    fn get_property(&self, path: &PropertyPath) -> Option<Value>;
    fn set_property(&mut self, path: &PropertyPath, value: Value) -> Result<(), TargetError>;
}

/// A node in the tree: either a container of named children or a value leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyNode {
    Container(HashMap<String, PropertyNode>),
    Leaf(Value),
}

impl PropertyNode {
    pub fn value(&self) -> Option<&Value> {
        match self {
            PropertyNode::Leaf(v) => Some(v),
            PropertyNode::Container(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&HashMap<String, PropertyNode>> {
        match self {
            PropertyNode::Container(map) => Some(map),
            PropertyNode::Leaf(_) => None,
        }
    }
}

/// Root of a nested property store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTree {
    root: HashMap<String, PropertyNode>,
}

impl PropertyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `path` and write `value`; malformed paths are reported as `false`.
    pub fn set(&mut self, path: &str, value: Value) -> bool {
        match PropertyPath::parse(path) {
            Ok(p) => self.set_property(&p, value).is_ok(),
            Err(err) => {
                log::warn!("PropertyTree::set ignored: {err}");
                false
            }
        }
    }

    /// Parse `path` and read the value stored there.
    pub fn get(&self, path: &str) -> Option<Value> {
        PropertyPath::parse(path)
            .ok()
            .and_then(|p| self.get_property(&p))
    }

    /// Look up the node at `path` (container or leaf).
    pub fn node(&self, path: &PropertyPath) -> Option<&PropertyNode> {
        let mut segments = path.segments();
        let mut current = self.root.get(segments.next()?)?;
        for seg in segments {
            current = current.as_container()?.get(seg)?;
        }
        Some(current)
    }

    /// Remove and return the node at `path`.
    pub fn remove(&mut self, path: &PropertyPath) -> Option<PropertyNode> {
        let (last, parents) = {
            let segs: Vec<&str> = path.segments().collect();
            let (last, parents) = segs.split_last()?;
            (last.to_string(), parents.iter().map(|s| s.to_string()).collect::<Vec<_>>())
        };
        let mut container = &mut self.root;
        for seg in &parents {
            container = match container.get_mut(seg.as_str())? {
                PropertyNode::Container(map) => map,
                PropertyNode::Leaf(_) => return None,
            };
        }
        container.remove(last.as_str())
    }

    /// All leaves as (path, value) pairs, sorted by path for stable inspection.
    pub fn leaves(&self) -> Vec<(PropertyPath, &Value)> {
        let mut out = Vec::new();
        collect_leaves(&self.root, &mut Vec::new(), &mut out);
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

fn collect_leaves<'a>(
    map: &'a HashMap<String, PropertyNode>,
    prefix: &mut Vec<String>,
    out: &mut Vec<(PropertyPath, &'a Value)>,
) {
    for (name, node) in map {
        prefix.push(name.clone());
        match node {
            PropertyNode::Leaf(v) => {
                if let Some(p) = PropertyPath::from_segments(prefix.iter().cloned()) {
                    out.push((p, v));
                }
            }
            PropertyNode::Container(children) => collect_leaves(children, prefix, out),
        }
        prefix.pop();
    }
}

impl AnimationTarget for PropertyTree {
    fn get_property(&self, path: &PropertyPath) -> Option<Value> {
        let segs: Vec<&str> = path.segments().collect();
        let mut container = &self.root;
        for (i, seg) in segs.iter().enumerate() {
            match container.get(*seg)? {
                PropertyNode::Container(map) => container = map,
                PropertyNode::Leaf(v) => {
                    let rest = &segs[i + 1..];
                    return match rest {
                        [] => Some(v.clone()),
                        [selector] => v.component(selector).map(Value::Scalar),
                        _ => None,
                    };
                }
            }
        }
        // Path ends on a container; containers are not values.
        None
    }

    fn set_property(&mut self, path: &PropertyPath, value: Value) -> Result<(), TargetError> {
        let segs: Vec<&str> = path.segments().collect();
        let Some((last, parents)) = segs.split_last() else {
            return Ok(());
        };

        let mut container = &mut self.root;
        for (i, seg) in parents.iter().enumerate() {
            let node = container
                .entry(seg.to_string())
                .or_insert_with(|| PropertyNode::Container(HashMap::new()));
            match node {
                PropertyNode::Container(map) => container = map,
                PropertyNode::Leaf(leaf) => {
                    // "position.x" onto a vector leaf writes that component in place.
                    let is_component_write = i + 1 == parents.len();
                    if is_component_write {
                        if let Some(v) = value.as_scalar() {
                            if leaf.set_component(last, v) {
                                return Ok(());
                            }
                        }
                    }
                    return Err(TargetError::PathConflict {
                        path: path.to_string(),
                        segment: seg.to_string(),
                    });
                }
            }
        }
        container.insert(last.to_string(), PropertyNode::Leaf(value));
        Ok(())
    }
}
