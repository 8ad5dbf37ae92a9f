//! 🌳 Typed Tree conversion — schema-less JSON in, strongly-typed tree out 🔄
//!
//! 🎬 COLD OPEN — INT. TYPE CHECKER'S OFFICE — NIGHT
//!
//! The JSON walks in. "I'm a number," it says. "What kind?" asks the type checker.
//! "...A number." The type checker sighs, pulls out a ruler, and measures it.
//! Fits in 32 bits? You're an `Int`. Fits in 64? `Long`. Bigger than that?
//! Sit in the `Null` corner and think about what you've done.
//!
//! ## Knowledge Graph 🧠
//! - Step 1: classify a `serde_json::Value` into a [`DecodedJson`] view (closed set of cases)
//! - Step 2: dispatch on that view, most specific first, recursing into maps and lists
//! - Never fails. Unknown stuff degrades to [`TypedNode::Null`].
//!
//! ⚠️ Two legacy quirks live here on purpose: an empty list becomes `Null`, and a list is
//! tagged with the kind of its first element even when the rest disagree. 🦆

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::common::TypedNode;

/// 🔍 A decoded JSON value, sorted into the closed set of shapes the converter understands.
///
/// Borrowed from the source `Value`, so classifying costs nothing but a match.
/// `Float32` never comes out of [`DecodedJson::classify`] (JSON floats decode as 64-bit),
/// but callers holding an honest-to-goodness `f32` can build one directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedJson<'a> {
    Str(&'a str),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Mapping(&'a Map<String, Value>),
    Sequence(&'a [Value]),
    /// 🤷 Booleans, nulls, integers too wide for 64 signed bits. The "other" pile.
    Other,
}

impl<'a> DecodedJson<'a> {
    /// 📏 Sort a `Value` into its bucket. Integers get the narrowest width that holds them.
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(text) => DecodedJson::Str(text),
            Value::Number(number) => {
                if let Some(whole) = number.as_i64() {
                    // 🎯 Narrowest width wins: 32 bits if it fits, otherwise 64
                    match i32::try_from(whole) {
                        Ok(small) => DecodedJson::Int32(small),
                        Err(_) => DecodedJson::Int64(whole),
                    }
                } else if is_integer_literal(number) {
                    // 💀 Outside i64 either way. Too big to be a Long, too proud to be a Double.
                    DecodedJson::Other
                } else {
                    number.as_f64().map_or(DecodedJson::Other, DecodedJson::Float64)
                }
            }
            Value::Object(entries) => DecodedJson::Mapping(entries),
            Value::Array(items) => DecodedJson::Sequence(items),
            Value::Bool(_) | Value::Null => DecodedJson::Other,
        }
    }
}

// 🔢 No fraction, no exponent: it was written as an integer, whatever its size.
// Relies on the literal text being kept around (serde_json `arbitrary_precision`).
fn is_integer_literal(number: &Number) -> bool {
    !number.to_string().contains(['.', 'e', 'E'])
}

/// 🔄 Convert a decoded JSON value into a [`TypedNode`] tree.
///
/// Pure and total. Same input, same tree, every time, no side effects, no errors.
pub fn convert(value: &Value) -> TypedNode {
    convert_decoded(DecodedJson::classify(value))
}

/// 🔄 The dispatch itself, over an already-classified value.
///
/// Precedence is fixed: string, 64-bit int, 32-bit int, 64-bit float, 32-bit float,
/// mapping, sequence, everything else. Numeric width resolution depends on this order.
pub fn convert_decoded(decoded: DecodedJson<'_>) -> TypedNode {
    match decoded {
        DecodedJson::Str(text) => TypedNode::Text(text.to_string()),
        DecodedJson::Int64(big) => TypedNode::Long(big),
        DecodedJson::Int32(small) => TypedNode::Int(small),
        DecodedJson::Float64(wide) => TypedNode::Double(wide),
        DecodedJson::Float32(narrow) => TypedNode::Float(narrow),
        DecodedJson::Mapping(entries) => convert_mapping(entries),
        DecodedJson::Sequence(items) => convert_sequence(items),
        DecodedJson::Other => TypedNode::Null,
    }
}

/// 🗺️ Keys copied as-is, values converted recursively. Order is not preserved. Nobody promised it would be.
pub fn convert_mapping(entries: &Map<String, Value>) -> TypedNode {
    let converted: HashMap<String, TypedNode> = entries
        .iter()
        .map(|(key, value)| (key.clone(), convert(value)))
        .collect();
    TypedNode::Map(converted)
}

fn convert_sequence(items: &[Value]) -> TypedNode {
    // 💀 Empty list → Null. Indistinguishable from absence. Legacy says so.
    let Some(first) = items.first() else {
        return TypedNode::Null;
    };
    let element_kind = convert(first).kind();
    TypedNode::List {
        element_kind,
        items: items.iter().map(convert).collect(),
    }
}
