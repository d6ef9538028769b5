//! Plain tree to and from YAML
//!
//! Mappings keep their key order in both directions. Reading is lenient
//! with hand-edited documents: numbers and booleans become their string
//! form and null becomes the empty string, since XML only carries text.

use std::fmt;
use std::io::{Read, Write};

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use tracing::instrument;

use crate::error::Result;
use crate::value::{Array, Object, Value};

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string, a sequence or a mapping")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::default())
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::default())
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Array::new();
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Object::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key::<Value>()? {
            let Value::String(key) = key else {
                return Err(de::Error::custom("mapping keys must be scalars"));
            };
            let value = map.next_value::<Value>()?;
            entries.insert(key, value);
        }
        Ok(Value::Object(entries))
    }
}

/// Render a plain tree as a YAML document
#[instrument(skip_all)]
pub fn to_yaml_string(root: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(root)?)
}

/// Write a plain tree as a YAML document to `out`
pub fn to_yaml_writer<W: Write>(root: &Value, out: W) -> Result<()> {
    serde_yaml::to_writer(out, root)?;
    Ok(())
}

/// Read a plain tree from YAML text
#[instrument(skip_all, fields(bytes = text.len()))]
pub fn from_yaml_str(text: &str) -> Result<Value> {
    Ok(serde_yaml::from_str(text)?)
}

/// Read a plain tree from a YAML stream
pub fn from_yaml_reader<R: Read>(reader: R) -> Result<Value> {
    Ok(serde_yaml::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn folded_ab() -> Value {
        let children: Object = [
            ("b".to_string(), Value::from("1")),
            ("c".to_string(), Value::from("2")),
        ]
        .into_iter()
        .collect();
        Value::element("a", children)
    }

    #[test]
    fn test_to_yaml_block_style() -> Result<()> {
        let yaml = to_yaml_string(&folded_ab())?;
        assert_eq!(yaml, "a:\n  b: '1'\n  c: '2'\n");
        Ok(())
    }

    #[test]
    fn test_key_order_preserved() -> Result<()> {
        let root = from_yaml_str("r:\n  z: a\n  m: b\n  a: c\n")?;
        let keys: Vec<&str> = root
            .single_entry()
            .and_then(|(_, children)| children.as_object())
            .map(|obj| obj.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["z", "m", "a"]);
        Ok(())
    }

    #[test]
    fn test_yaml_roundtrip_mixed_content() -> Result<()> {
        let root = Value::element(
            "p",
            vec![
                Value::attribute("class", "note"),
                Value::from("line one\nline two\n"),
                Value::element("b", ""),
                Value::from("tail"),
            ],
        );
        let yaml = to_yaml_string(&root)?;
        assert_eq!(from_yaml_str(&yaml)?, root);
        Ok(())
    }

    #[test]
    fn test_lenient_scalars() -> Result<()> {
        let root = from_yaml_str("e:\n  n: 42\n  f: true\n  z: ~\n  x: 1.5\n")?;
        let expected: Object = [
            ("n".to_string(), Value::from("42")),
            ("f".to_string(), Value::from("true")),
            ("z".to_string(), Value::from("")),
            ("x".to_string(), Value::from("1.5")),
        ]
        .into_iter()
        .collect();
        assert_eq!(root, Value::element("e", expected));
        Ok(())
    }

    #[test]
    fn test_invalid_yaml() {
        let err = from_yaml_str("a: [unclosed").err();
        assert_eq!(err.as_ref().map(|e| e.kind()), Some(&ErrorKind::Yaml));
    }

    #[test]
    fn test_to_yaml_writer() -> Result<()> {
        let mut out: Vec<u8> = Vec::new();
        to_yaml_writer(&Value::element("e", ""), &mut out)?;
        assert_eq!(out, b"e: ''\n");
        Ok(())
    }
}
