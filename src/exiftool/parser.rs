//! Parsing of exiftool JSON responses into [`ImageRecord`]s
//!
//! Expected shape of one array element:
//!
//! ```json
//! {"SourceFile": "a.jpg", "Make": {"id": 271, "val": "Canon"}, ...}
//! ```
//!
//! The source-file field must come first. The document is deserialized with
//! a streaming visitor so property order is observed without buffering.

use crate::error::Result;
use crate::types::{ExifTag, ImageRecord};
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;

/// Name of the property that identifies the source file (matched case-insensitively)
const SOURCE_FILE_FIELD: &str = "SourceFile";

/// Parse a tool response into records.
///
/// Empty, whitespace-only and `null` input yield an empty list.
pub fn parse_metadata(json: &str) -> Result<Vec<ImageRecord>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Option<RecordList> = serde_json::from_str(json)?;
    Ok(records.map(|list| list.0).unwrap_or_default())
}

struct RecordList(Vec<ImageRecord>);

impl<'de> Deserialize<'de> for RecordList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_seq(RecordListVisitor)
    }
}

struct RecordListVisitor;

impl<'de> Visitor<'de> for RecordListVisitor {
    type Value = RecordList;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON array of image metadata objects")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<RecordList, A::Error> {
        let mut records = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(record) = seq.next_element_seed(RecordSeed {
            index: records.len(),
        })? {
            records.push(record);
        }
        Ok(RecordList(records))
    }
}

/// Deserializes one array element, remembering its index for error messages
struct RecordSeed {
    index: usize,
}

impl<'de> DeserializeSeed<'de> for RecordSeed {
    type Value = ImageRecord;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<ImageRecord, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for RecordSeed {
    type Value = ImageRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an image metadata object at [{}]", self.index)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<ImageRecord, A::Error> {
        let index = self.index;
        let first_key: Option<String> = map.next_key()?;
        let source_path = match first_key {
            Some(key) if key.eq_ignore_ascii_case(SOURCE_FILE_FIELD) => {
                let value: String = map.next_value()?;
                if value.trim().is_empty() {
                    return Err(de::Error::custom(format!(
                        "[{index}].{key}: source file path is empty"
                    )));
                }
                value
            }
            Some(key) => {
                return Err(de::Error::custom(format!(
                    "[{index}]: first property must be {SOURCE_FILE_FIELD}, found {key:?}"
                )));
            }
            None => {
                return Err(de::Error::custom(format!(
                    "[{index}]: {SOURCE_FILE_FIELD} missing in image metadata"
                )));
            }
        };

        let mut record = ImageRecord::new(source_path);
        while let Some(name) = map.next_key::<String>()? {
            let raw: RawTag = map.next_value()?;
            let tag = raw.into_tag(name, index).map_err(de::Error::custom)?;
            record.insert_tag(tag);
        }
        Ok(record)
    }
}

/// Tag object as emitted by `exiftool -json -long -D`
#[derive(Deserialize)]
struct RawTag {
    id: Option<serde_json::Value>,
    val: Option<serde_json::Value>,
}

impl RawTag {
    fn into_tag(self, name: String, index: usize) -> std::result::Result<ExifTag, String> {
        let id = match self.id {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| format!("[{index}].{name}: tag id must be an integer"))?;

        let value = match self.val {
            Some(value) => stringify_value(value)
                .ok_or_else(|| format!("[{index}].{name}: tag value must be a scalar or list"))?,
            None => return Err(format!("[{index}].{name}: tag value missing")),
        };

        Ok(ExifTag { id, name, value })
    }
}

/// Render a tag value in string form; lists are joined the way exiftool joins them
fn stringify_value(value: serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items
            .into_iter()
            .map(stringify_value)
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(", ")),
        Value::Null | Value::Object(_) => None,
    }
}
