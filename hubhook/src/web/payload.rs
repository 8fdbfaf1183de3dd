//! Content-type aware decoding of webhook bodies.
//!
//! Two encodings are accepted:
//! - `application/json`: the body is the JSON document
//! - `application/x-www-form-urlencoded`: the JSON document is the value of
//!   the `payload` form field
//!
//! Anything else is rejected before decoding is attempted.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, WebhookError};

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Form field holding the JSON document in form-encoded deliveries.
pub const PAYLOAD_FIELD: &str = "payload";

/// Body encodings understood by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Form,
}

impl PayloadFormat {
    /// Classify a `Content-Type` header value.
    ///
    /// Matching is by substring and ignores ASCII case, so parameters such as
    /// `; charset=utf-8` are tolerated. JSON wins if both would match.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.to_ascii_lowercase();

        if content_type.contains(JSON_CONTENT_TYPE) {
            Some(Self::Json)
        } else if content_type.contains(FORM_CONTENT_TYPE) {
            Some(Self::Form)
        } else {
            None
        }
    }
}

/// Decode a webhook body into a generic JSON value.
pub fn decode_payload(content_type: Option<&str>, body: &[u8]) -> Result<Value> {
    let format = content_type
        .and_then(PayloadFormat::from_content_type)
        .ok_or_else(|| WebhookError::UnsupportedContentType(content_type.map(str::to_string)))?;

    match format {
        PayloadFormat::Json => decode_json(body),
        PayloadFormat::Form => decode_form(body),
    }
}

/// Decode the first JSON value in `bytes`.
///
/// Whatever follows the first complete value is ignored, scalars included:
/// `123abc` decodes to `123`.
fn decode_json(bytes: &[u8]) -> Result<Value> {
    if bytes
        .iter()
        .all(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
    {
        return Err(WebhookError::EmptyPayload);
    }

    // Deserializing without Deserializer::end() leaves trailing input unchecked.
    let mut de = serde_json::Deserializer::from_slice(bytes);
    Ok(Value::deserialize(&mut de)?)
}

/// Extract the `payload` field from a form body and decode it as JSON.
fn decode_form(body: &[u8]) -> Result<Value> {
    validate_form_encoding(body)?;

    let payload = url::form_urlencoded::parse(body)
        .find(|(key, _)| key == PAYLOAD_FIELD)
        .map(|(_, value)| value.into_owned())
        .ok_or(WebhookError::MissingPayloadField)?;

    decode_json(payload.as_bytes())
}

/// Reject form bodies a strict query parser would refuse.
///
/// `form_urlencoded` passes malformed escapes through verbatim, so invalid
/// percent sequences and `;` separators are checked up front.
fn validate_form_encoding(body: &[u8]) -> Result<()> {
    let mut i = 0;
    while i < body.len() {
        match body[i] {
            b'%' => {
                let escape = body.get(i + 1..i + 3);
                let valid = escape
                    .map(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                    .unwrap_or(false);
                if !valid {
                    return Err(WebhookError::MalformedForm(format!(
                        "invalid percent escape at byte {}",
                        i
                    )));
                }
                i += 3;
            }
            b';' => {
                return Err(WebhookError::MalformedForm(
                    "invalid semicolon separator".to_string(),
                ));
            }
            _ => i += 1,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_content_type() {
        assert_eq!(
            PayloadFormat::from_content_type("application/json"),
            Some(PayloadFormat::Json)
        );
        assert_eq!(
            PayloadFormat::from_content_type("application/json; charset=utf-8"),
            Some(PayloadFormat::Json)
        );
        assert_eq!(
            PayloadFormat::from_content_type("Application/JSON"),
            Some(PayloadFormat::Json)
        );
        assert_eq!(
            PayloadFormat::from_content_type("application/x-www-form-urlencoded"),
            Some(PayloadFormat::Form)
        );
        assert_eq!(PayloadFormat::from_content_type("text/plain"), None);
        assert_eq!(PayloadFormat::from_content_type(""), None);
    }

    #[test]
    fn test_decode_json_body() {
        let value = decode_payload(Some("application/json"), br#"{"hoge":"fuga"}"#).unwrap();
        assert_eq!(value, json!({"hoge": "fuga"}));
    }

    #[test]
    fn test_decode_json_scalars_and_arrays() {
        assert_eq!(
            decode_payload(Some("application/json"), b"[1, 2, 3]").unwrap(),
            json!([1, 2, 3])
        );
        assert_eq!(
            decode_payload(Some("application/json"), b"\"zen\"").unwrap(),
            json!("zen")
        );
        assert_eq!(
            decode_payload(Some("application/json"), b"null").unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_decode_json_ignores_trailing_bytes() {
        let value = decode_payload(Some("application/json"), b"{\"a\":1}\n{\"b\":2}").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_decode_json_ignores_trailing_bytes_after_scalars() {
        assert_eq!(
            decode_payload(Some("application/json"), b"123abc").unwrap(),
            json!(123)
        );
        assert_eq!(
            decode_payload(Some("application/json"), b"true false").unwrap(),
            json!(true)
        );
        assert_eq!(
            decode_payload(Some("application/json"), b"{}x").unwrap(),
            json!({})
        );
    }

    #[test]
    fn test_decode_json_rejects_malformed() {
        let err = decode_payload(Some("application/json"), b"{\"hoge\":").unwrap_err();
        assert!(matches!(err, WebhookError::InvalidJson(_)));

        let err = decode_payload(Some("application/json"), b"hoge=fuga").unwrap_err();
        assert!(matches!(err, WebhookError::InvalidJson(_)));
    }

    #[test]
    fn test_decode_json_rejects_blank() {
        let err = decode_payload(Some("application/json"), b"  \n ").unwrap_err();
        assert!(matches!(err, WebhookError::EmptyPayload));
    }

    #[test]
    fn test_decode_form_body() {
        let value = decode_payload(
            Some("application/x-www-form-urlencoded"),
            b"payload=%7B%22a%22%3A1%7D",
        )
        .unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_decode_form_with_other_fields() {
        let value = decode_payload(
            Some("application/x-www-form-urlencoded"),
            b"foo=bar&payload=%7B%22zen%22%3A%22keep+it+simple%22%7D&baz=1",
        )
        .unwrap();
        assert_eq!(value, json!({"zen": "keep it simple"}));
    }

    #[test]
    fn test_decode_form_missing_payload_field() {
        let err = decode_payload(Some("application/x-www-form-urlencoded"), b"foo=bar").unwrap_err();
        assert!(matches!(err, WebhookError::MissingPayloadField));
    }

    #[test]
    fn test_decode_form_empty_payload_field() {
        let err = decode_payload(Some("application/x-www-form-urlencoded"), b"payload=").unwrap_err();
        assert!(matches!(err, WebhookError::EmptyPayload));
    }

    #[test]
    fn test_decode_form_invalid_json_in_payload() {
        let err = decode_payload(Some("application/x-www-form-urlencoded"), b"payload=%7B").unwrap_err();
        assert!(matches!(err, WebhookError::InvalidJson(_)));
    }

    #[test]
    fn test_decode_form_malformed_encoding() {
        let bodies: [&[u8]; 3] = [b"payload=%7", b"payload=%zz", b"a=1;payload=%7B%7D"];
        for body in bodies {
            let err = decode_payload(Some("application/x-www-form-urlencoded"), body).unwrap_err();
            assert!(matches!(err, WebhookError::MalformedForm(_)), "body {:?}", body);
        }
    }

    #[test]
    fn test_unsupported_content_type() {
        let err = decode_payload(Some("text/plain"), br#"{"a":1}"#).unwrap_err();
        assert!(matches!(err, WebhookError::UnsupportedContentType(Some(ref ct)) if ct == "text/plain"));

        let err = decode_payload(None, br#"{"a":1}"#).unwrap_err();
        assert!(matches!(err, WebhookError::UnsupportedContentType(None)));
    }
}
