//! Response envelope parsing.
//!
//! Responses wrap their payload in a `content` object. Mutating calls that run
//! as deferred jobs answer `{"content": {"actionId": "..."}}`; list calls with
//! `replyWithCount=true` answer `{"content": {"result": [...], "totalCount": n}}`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{EdgeError, Result};

pub const KEY_CONTENT: &str = "content";
pub const KEY_RESULT: &str = "result";
pub const KEY_TOTAL: &str = "totalCount";
pub const KEY_ACTION_ID: &str = "actionId";

static NULL: Value = Value::Null;

/// Parsed response body. Empty when the body was blank or not JSON-shaped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Envelope {
    body: Option<Value>,
}

impl Envelope {
    /// Parses raw body bytes.
    ///
    /// Bodies that do not start with `{` or `[` after trimming are treated as
    /// absent. A body that looks like JSON but does not parse is an error.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let trimmed = trim_ascii(raw);
        match trimmed.first() {
            Some(b'{') | Some(b'[') => {
                let body = serde_json::from_slice(trimmed).map_err(|err| {
                    EdgeError::Decode(format!(
                        "invalid response JSON: {err}; body: {}",
                        String::from_utf8_lossy(trimmed)
                    ))
                })?;
                Ok(Self { body: Some(body) })
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn from_value(body: Value) -> Self {
        Self { body: Some(body) }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_none()
    }

    pub fn as_value(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.body
    }

    /// Navigates nested object keys. An empty path returns the whole body.
    pub fn get(&self, path: &[&str]) -> Result<&Value> {
        let not_found = || EdgeError::KeyNotFound {
            path: if path.is_empty() {
                "<body>".to_owned()
            } else {
                path.join(".")
            },
        };
        let mut current = self.body.as_ref().ok_or_else(not_found)?;
        for key in path {
            current = current.get(*key).ok_or_else(not_found)?;
        }
        Ok(current)
    }

    /// Deserializes the value at `path` into `T`.
    ///
    /// An empty envelope binds as JSON `null` when `path` is empty, so
    /// `Option<_>` and `()` targets accept bodiless responses.
    pub fn bind<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        let value = match (&self.body, path.is_empty()) {
            (None, true) => &NULL,
            _ => self.get(path)?,
        };
        T::deserialize(value).map_err(|err| {
            EdgeError::Decode(format!(
                "cannot decode response at '{}': {err}",
                path.join(".")
            ))
        })
    }

    /// Reads `{key}.totalCount`, accepting a number or a numeric string.
    pub fn total_count(&self, key: &str) -> Result<u64> {
        let path = [key, KEY_TOTAL];
        let value = self.get(&path)?;
        let total = match value {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        };
        total.ok_or_else(|| EdgeError::Decode(format!("invalid {}: {value}", path.join("."))))
    }

    /// Returns the deferred action ID at `content.actionId`, if any.
    pub fn action_id(&self) -> Option<&str> {
        self.get(&[KEY_CONTENT, KEY_ACTION_ID])
            .ok()
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

fn trim_ascii(raw: &[u8]) -> &[u8] {
    let start = raw
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(raw.len());
    let end = raw
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(start, |index| index + 1);
    &raw[start..end]
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::Envelope;
    use crate::{EdgeError, ErrorKind};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
        name: String,
    }

    fn encode(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn non_json_bodies_are_empty() {
        assert!(Envelope::parse(b"").unwrap().is_empty());
        assert!(Envelope::parse(b"   \n").unwrap().is_empty());
        assert!(Envelope::parse(b"OK").unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let err = Envelope::parse(b"{\"content\":").unwrap_err();
        assert!(matches!(err, EdgeError::Decode(_)));
    }

    #[test]
    fn extracts_action_id() {
        let envelope = Envelope::parse(&encode(json!({"content": {"actionId": "X"}}))).unwrap();
        assert_eq!(envelope.action_id(), Some("X"));
    }

    #[test]
    fn blank_or_missing_action_id_is_none() {
        let blank = Envelope::parse(&encode(json!({"content": {"actionId": ""}}))).unwrap();
        assert_eq!(blank.action_id(), None);

        let absent = Envelope::parse(&encode(json!({"content": {"id": 3}}))).unwrap();
        assert_eq!(absent.action_id(), None);

        let top_level = Envelope::parse(&encode(json!({"actionId": "Y"}))).unwrap();
        assert_eq!(top_level.action_id(), None);
    }

    #[test]
    fn list_with_total_count() {
        let items = json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]);
        let envelope = Envelope::parse(&encode(
            json!({"content": {"result": items.clone(), "totalCount": 42}}),
        ))
        .unwrap();

        assert_eq!(envelope.total_count("content").unwrap(), 42);
        let decoded: Vec<Item> = envelope.bind(&["content", "result"]).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(
            serde_json::to_value(
                decoded
                    .iter()
                    .map(|item| json!({"id": item.id, "name": item.name}))
                    .collect::<Vec<_>>()
            )
            .unwrap(),
            items
        );
    }

    #[test]
    fn total_count_accepts_strings() {
        let envelope = Envelope::from_value(json!({"content": {"totalCount": "17"}}));
        assert_eq!(envelope.total_count("content").unwrap(), 17);

        let bad = Envelope::from_value(json!({"content": {"totalCount": true}}));
        assert!(matches!(bad.total_count("content"), Err(EdgeError::Decode(_))));
    }

    #[test]
    fn missing_key_is_key_not_found() {
        let envelope = Envelope::from_value(json!({"content": {}}));
        let err = envelope.bind::<Item>(&["content", "result"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("content.result"));

        let err = Envelope::default().bind::<Item>(&["content"]).unwrap_err();
        assert!(matches!(err, EdgeError::KeyNotFound { .. }));
    }

    #[test]
    fn empty_envelope_binds_null_for_empty_path() {
        let value: Option<Item> = Envelope::default().bind(&[]).unwrap();
        assert!(value.is_none());
        Envelope::default().bind::<()>(&[]).unwrap();
    }

    #[test]
    fn bind_type_mismatch_is_decode_error() {
        let envelope = Envelope::from_value(json!({"content": "text"}));
        let err = envelope.bind::<Item>(&["content"]).unwrap_err();
        assert!(matches!(err, EdgeError::Decode(_)));
    }
}
