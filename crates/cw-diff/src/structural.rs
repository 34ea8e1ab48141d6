//! Structural diff: deep comparison of nested objects and arrays.
//!
//! The result mirrors the shape of the compared input but is sparse: a key
//! whose value is identical on both sides never appears. Arrays are compared
//! index by index, not by content matching.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A node in the difference tree between two values.
#[derive(Clone, Debug, PartialEq)]
pub enum DiffNode {
    /// Present on both sides with unequal values.
    Changed { old: Value, new: Value },
    /// Present only on the new side.
    Added { new: Value },
    /// Present only on the old side.
    Removed { old: Value },
    /// Differences inside an object, keyed by field name.
    Branch(BTreeMap<String, DiffNode>),
    /// Differences inside an array, keyed by index.
    Sequence(BTreeMap<usize, DiffNode>),
}

impl DiffNode {
    /// Returns `true` if no difference is recorded.
    ///
    /// Leaves are never empty; only a container with no children is.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Branch(children) => children.is_empty(),
            Self::Sequence(children) => children.is_empty(),
            _ => false,
        }
    }

    /// Child node for an object key.
    pub fn get(&self, key: &str) -> Option<&DiffNode> {
        match self {
            Self::Branch(children) => children.get(key),
            _ => None,
        }
    }

    /// Child node for an array index.
    pub fn at(&self, index: usize) -> Option<&DiffNode> {
        match self {
            Self::Sequence(children) => children.get(&index),
            _ => None,
        }
    }

    /// Every leaf with its dotted path (`stats.attack`, `actions[2]`).
    pub fn leaves(&self) -> Vec<(String, &DiffNode)> {
        let mut out = Vec::new();
        collect_leaves(self, String::new(), &mut out);
        out
    }

    /// Number of `Added` leaves.
    pub fn additions(&self) -> usize {
        self.count(|n| matches!(n, DiffNode::Added { .. }))
    }

    /// Number of `Removed` leaves.
    pub fn removals(&self) -> usize {
        self.count(|n| matches!(n, DiffNode::Removed { .. }))
    }

    /// Number of `Changed` leaves.
    pub fn changes(&self) -> usize {
        self.count(|n| matches!(n, DiffNode::Changed { .. }))
    }

    fn count(&self, pred: impl Fn(&DiffNode) -> bool) -> usize {
        self.leaves().into_iter().filter(|(_, n)| pred(*n)).count()
    }

    /// Render as JSON.
    ///
    /// Leaves become `{"oldValue", "newValue"}`, `{"newValue"}` or
    /// `{"oldValue"}`. Sequences become arrays padded with `null` at
    /// unchanged indices so positions line up with the input.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Changed { old, new } => {
                let mut map = Map::new();
                map.insert("oldValue".into(), old.clone());
                map.insert("newValue".into(), new.clone());
                Value::Object(map)
            }
            Self::Added { new } => {
                let mut map = Map::new();
                map.insert("newValue".into(), new.clone());
                Value::Object(map)
            }
            Self::Removed { old } => {
                let mut map = Map::new();
                map.insert("oldValue".into(), old.clone());
                Value::Object(map)
            }
            Self::Branch(children) => Value::Object(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Sequence(children) => {
                let len = children.keys().next_back().map_or(0, |last| last + 1);
                let mut items = vec![Value::Null; len];
                for (i, child) in children {
                    items[*i] = child.to_json();
                }
                Value::Array(items)
            }
        }
    }
}

impl Serialize for DiffNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn collect_leaves<'a>(node: &'a DiffNode, path: String, out: &mut Vec<(String, &'a DiffNode)>) {
    match node {
        DiffNode::Branch(children) => {
            for (key, child) in children {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                collect_leaves(child, child_path, out);
            }
        }
        DiffNode::Sequence(children) => {
            for (index, child) in children {
                collect_leaves(child, format!("{path}[{index}]"), out);
            }
        }
        leaf => out.push((path, leaf)),
    }
}

/// Compute the structural difference between two values.
///
/// The root is typed by the old value: an array root yields a
/// [`DiffNode::Sequence`], anything else a [`DiffNode::Branch`]. Only two
/// objects or two arrays are compared key by key. Roots of different kinds
/// (object against array, or a scalar on either side) are not comparable,
/// and the result is a single [`DiffNode::Changed`] leaf holding both whole
/// values.
pub fn diff(old: &Value, new: &Value) -> DiffNode {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => diff_objects(a, b),
        (Value::Array(a), Value::Array(b)) => diff_arrays(a, b),
        _ if old == new => match old {
            Value::Array(_) => DiffNode::Sequence(BTreeMap::new()),
            _ => DiffNode::Branch(BTreeMap::new()),
        },
        _ => DiffNode::Changed {
            old: old.clone(),
            new: new.clone(),
        },
    }
}

/// Compare one pair of sub-values. `None` when they are equal.
fn diff_value(old: &Value, new: &Value) -> Option<DiffNode> {
    let node = match (old, new) {
        (Value::Object(a), Value::Object(b)) => diff_objects(a, b),
        (Value::Array(a), Value::Array(b)) => diff_arrays(a, b),
        _ if old == new => return None,
        _ => DiffNode::Changed {
            old: old.clone(),
            new: new.clone(),
        },
    };
    (!node.is_empty()).then_some(node)
}

fn diff_objects(old: &Map<String, Value>, new: &Map<String, Value>) -> DiffNode {
    let mut children = BTreeMap::new();

    for (key, old_val) in old {
        let node = match new.get(key) {
            Some(new_val) => diff_value(old_val, new_val),
            None => Some(DiffNode::Removed {
                old: old_val.clone(),
            }),
        };
        if let Some(node) = node {
            children.insert(key.clone(), node);
        }
    }

    for (key, new_val) in new {
        if !old.contains_key(key) {
            children.insert(
                key.clone(),
                DiffNode::Added {
                    new: new_val.clone(),
                },
            );
        }
    }

    DiffNode::Branch(children)
}

fn diff_arrays(old: &[Value], new: &[Value]) -> DiffNode {
    let mut children = BTreeMap::new();

    for (i, old_val) in old.iter().enumerate() {
        let node = match new.get(i) {
            Some(new_val) => diff_value(old_val, new_val),
            None => Some(DiffNode::Removed {
                old: old_val.clone(),
            }),
        };
        if let Some(node) = node {
            children.insert(i, node);
        }
    }

    for (i, new_val) in new.iter().enumerate().skip(old.len()) {
        children.insert(
            i,
            DiffNode::Added {
                new: new_val.clone(),
            },
        );
    }

    DiffNode::Sequence(children)
}

/// Keys present in both maps whose values differ, with `(old, new)` values.
///
/// Keys present on only one side are ignored. This is the flat-map
/// specialization of the object diff used for identifier churn detection.
pub fn changed_common_keys<K, V>(old: &BTreeMap<K, V>, new: &BTreeMap<K, V>) -> BTreeMap<K, (V, V)>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    old.iter()
        .filter_map(|(key, old_val)| {
            let new_val = new.get(key)?;
            (old_val != new_val).then(|| (key.clone(), (old_val.clone(), new_val.clone())))
        })
        .collect()
}
