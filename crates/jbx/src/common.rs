//! 📦 Common data structures — the building blocks of jbx
//!
//! ---
//!
//! 🎬 COLD OPEN — INT. BATCH CLUSTER — 3:47 AM
//!
//! A JSON string arrives. It has no schema. It has no type. It has a `"b": 5`
//! and absolutely no idea whether that five is a 32-bit five or a 64-bit five.
//! It doesn't care. The search engine cares. The search engine cares a LOT.
//!
//! ✅ And then — a [`TypedNode`] is born. Strongly typed. Closed set of kinds.
//! Immutable from the moment it exists, like a tattoo, or a git push --force
//! to main that someone already pulled.
//!
//! 🦆
//!
//! This module defines the humble yet load-bearing tree that ferries documents
//! from "some JSON someone logged" to "a thing an indexer can actually consume".

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// 🏷️ The tag of a [`TypedNode`]. Every node has exactly one. No identity crises here.
///
/// Used as the declared element type of a [`TypedNode::List`], which is stamped
/// with the kind of its FIRST element and nothing else. Mixed lists exist.
/// Their label lies. We keep the lie for compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    Int,
    Long,
    Float,
    Double,
    Map,
    List,
    Null,
}

/// 🌳 A TypedNode — one node of a strongly-typed tree, converted from schema-less JSON.
///
/// A closed set of node kinds that a typed storage/wire layer can consume.
/// Built bottom-up by the converter, so no cycles. Never mutated after construction.
///
/// # Variants
/// - `Text`, `Int`, `Long`, `Float`, `Double` — the primitives, width and all
/// - `Map` — string keys, unique, order irrelevant (a `HashMap`, it does not care about your feelings)
/// - `List` — ordered items plus the kind of the first one
/// - `Null` — absence, and the landing pad for anything we don't recognize
#[derive(Debug, Clone, PartialEq)]
pub enum TypedNode {
    Text(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Map(HashMap<String, TypedNode>),
    List {
        /// 🏷️ Kind of `items[0]`. Only `items[0]`. The rest are on the honor system.
        element_kind: NodeKind,
        items: Vec<TypedNode>,
    },
    Null,
}

impl TypedNode {
    /// 🏷️ What kind of node is this? One match, zero existential dread.
    pub fn kind(&self) -> NodeKind {
        match self {
            TypedNode::Text(_) => NodeKind::Text,
            TypedNode::Int(_) => NodeKind::Int,
            TypedNode::Long(_) => NodeKind::Long,
            TypedNode::Float(_) => NodeKind::Float,
            TypedNode::Double(_) => NodeKind::Double,
            TypedNode::Map(_) => NodeKind::Map,
            TypedNode::List { .. } => NodeKind::List,
            TypedNode::Null => NodeKind::Null,
        }
    }

    /// 📭 The record that forwards when the JSON didn't parse. An empty map. A shrug in tree form.
    pub fn empty_map() -> Self {
        TypedNode::Map(HashMap::new())
    }

    /// 🔍 Peek at a map entry. `None` if this isn't a map or the key isn't home.
    pub fn get(&self, key: &str) -> Option<&TypedNode> {
        match self {
            TypedNode::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// 🔢 Integer-kind value as i64, whether it arrived as an `Int` or a `Long`.
    /// Handy when you care that it's five, not how many bits the five is wearing.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedNode::Int(small) => Some(i64::from(*small)),
            TypedNode::Long(big) => Some(*big),
            _ => None,
        }
    }
}

// 📤 Serialize back to JSON-shaped output so writers can render a tree without
// knowing every variant. Lists serialize as plain arrays; the element tag stays home.
impl Serialize for TypedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedNode::Text(text) => serializer.serialize_str(text),
            TypedNode::Int(value) => serializer.serialize_i32(*value),
            TypedNode::Long(value) => serializer.serialize_i64(*value),
            TypedNode::Float(value) => serializer.serialize_f32(*value),
            TypedNode::Double(value) => serializer.serialize_f64(*value),
            TypedNode::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            TypedNode::List { items, .. } => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            TypedNode::Null => serializer.serialize_unit(),
        }
    }
}

/// 🕳️ The key that isn't. Every record goes downstream paired with this.
///
/// Documents get their identity from the id field configured on the job,
/// not from a key. So the key is always absent. It exists purely to fill
/// the left half of the `(key, value)` pair the writer contract asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NullKey;
