//! 🔄 Transforms — the Rosetta Stone between "a string someone swears is JSON" and a typed tree 🎭
//!
//! 🎬 COLD OPEN — INT. UNITED NATIONS — SIMULTANEOUS TRANSLATION BOOTH — 2:47 AM
//!
//! Raw payload on the left screen. [`TypedNode`] on the right. In between: a
//! translator who has been told "it's just JSON" nineteen times today.
//!
//! ## Architecture 📐
//!
//! ```text
//!   raw bytes ──decode──▶ serde_json::Value ──classify──▶ DecodedJson ──convert──▶ TypedNode
//!                  ▲ can fail                                                  ▲ never fails
//! ```
//!
//! Decoding is the only step allowed to fail, and it fails with a `Result`,
//! which the emitter branches into "log it, null it, move on". Payloads are raw
//! bytes: a line that isn't valid UTF-8 is just one more way to be malformed.
//!
//! Every ingest transform is a zero-sized marker type. No vtables, no dynamic
//! dispatch, just monomorphized straight-line code. 🦆

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::common::TypedNode;

pub mod typed_tree;

pub use typed_tree::{DecodedJson, convert, convert_decoded};

/// 📥 IngestTransform — turns one raw payload into a [`TypedNode`] tree.
///
/// # Contract 📜
/// - Input: the borrowed payload bytes of one record, UTF-8 not guaranteed
/// - Output: the converted tree, or an error saying why the payload wasn't decodable
/// - Conversion itself is total; only decoding may fail
pub trait IngestTransform {
    fn transform_record(raw: &[u8]) -> Result<TypedNode>;
}

/// 🧾 Payloads that must decode to a JSON object at the top level.
///
/// `{"a":1}` is welcome. `[1,2]`, `5`, and `"hello"` are valid JSON but not records,
/// so they get bounced with the same error as `{not json`. The bouncer is consistent.
///
/// Only the leading object is read. Whatever trails it (`{"a":1} junk`) is ignored,
/// same as Jackson's default `readValue` does.
pub struct JsonObjectIngest;

impl IngestTransform for JsonObjectIngest {
    fn transform_record(raw: &[u8]) -> Result<TypedNode> {
        let mut decoder = serde_json::Deserializer::from_slice(raw);
        // 🚫 no decoder.end(): trailing bytes are not our problem
        let record = Map::<String, Value>::deserialize(&mut decoder).context(
            "💀 Payload did not decode as a JSON object. It was promised to be JSON. \
             It was, at best, JSON-adjacent.",
        )?;
        Ok(typed_tree::convert_mapping(&record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NodeKind;

    #[test]
    fn the_one_where_a_payload_string_becomes_a_typed_map() -> Result<()> {
        let tree = JsonObjectIngest::transform_record(br#"{"user":"kevin","followers":12,"score":0.5}"#)?;
        assert_eq!(tree.kind(), NodeKind::Map);
        assert_eq!(tree.get("user"), Some(&TypedNode::Text("kevin".into())));
        assert_eq!(tree.get("followers"), Some(&TypedNode::Int(12)));
        assert_eq!(tree.get("score"), Some(&TypedNode::Double(0.5)));
        Ok(())
    }

    #[test]
    fn the_one_where_broken_json_is_an_error_not_a_panic() {
        assert!(JsonObjectIngest::transform_record(b"{not json").is_err());
    }

    #[test]
    fn the_one_where_valid_json_that_is_not_an_object_gets_bounced() {
        for not_a_record in ["[1,2,3]", "5", "\"hello\"", "null"] {
            assert!(
                JsonObjectIngest::transform_record(not_a_record.as_bytes()).is_err(),
                "{not_a_record} is not a record"
            );
        }
    }

    #[test]
    fn the_one_where_bytes_that_are_not_utf8_are_malformed_not_fatal() {
        assert!(JsonObjectIngest::transform_record(b"{\"b\":\"\xff\xfe\"}").is_err());
    }

    #[test]
    fn the_one_where_junk_after_the_object_is_politely_ignored() -> Result<()> {
        let tree = JsonObjectIngest::transform_record(br#"{"a":1} junk"#)?;
        assert_eq!(tree.get("a"), Some(&TypedNode::Int(1)));
        let tree = JsonObjectIngest::transform_record(b"{\"a\":1}{\"b\":2}\r")?;
        assert_eq!(tree.get("b"), None, "only the first object counts");
        Ok(())
    }
}
