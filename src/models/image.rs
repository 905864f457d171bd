use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Reference to a file held by the hosted image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Opaque identifier assigned by the image service.
    pub id: String,
    /// Path under which the image can be retrieved.
    pub path: String,
}

/// What a request asks to happen to one image attribute.
///
/// Resolved once while deserializing the payload:
/// a missing field or `null` is `Absent`, `""` is `Clear`, and any other
/// string is new content (base64 data or a URL the image service can fetch).
#[derive(Clone, PartialEq, Eq, Default)]
pub enum ImageInput {
    #[default]
    Absent,
    Clear,
    Payload(String),
}

impl ImageInput {
    pub fn is_absent(&self) -> bool {
        matches!(self, ImageInput::Absent)
    }
}

impl From<Option<String>> for ImageInput {
    fn from(value: Option<String>) -> Self {
        match value {
            None => ImageInput::Absent,
            Some(content) if content.is_empty() => ImageInput::Clear,
            Some(content) => ImageInput::Payload(content),
        }
    }
}

impl<'de> Deserialize<'de> for ImageInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(ImageInput::from)
    }
}

// Payloads can be megabytes of base64; keep them out of logs.
impl fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageInput::Absent => f.write_str("Absent"),
            ImageInput::Clear => f.write_str("Clear"),
            ImageInput::Payload(content) => write!(f, "Payload({} bytes)", content.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        avatar: ImageInput,
    }

    fn parse(json: &str) -> ImageInput {
        serde_json::from_str::<Body>(json).unwrap().avatar
    }

    #[test]
    fn test_image_input_wire_states() {
        assert_eq!(parse("{}"), ImageInput::Absent);
        assert_eq!(parse(r#"{"avatar": null}"#), ImageInput::Absent);
        assert_eq!(parse(r#"{"avatar": ""}"#), ImageInput::Clear);
        assert_eq!(
            parse(r#"{"avatar": "data:image/png;base64,iVBORw0"}"#),
            ImageInput::Payload("data:image/png;base64,iVBORw0".into())
        );
    }

    #[test]
    fn test_image_input_rejects_non_strings() {
        assert!(serde_json::from_str::<Body>(r#"{"avatar": 12}"#).is_err());
    }

    #[test]
    fn test_debug_hides_payload() {
        let input = ImageInput::Payload("x".repeat(2048));
        assert_eq!(format!("{:?}", input), "Payload(2048 bytes)");
    }
}
