//! Shared domain types for gallery records (used by UI, codec, and the log store).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a record's JSON column held once decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Json(Value),
    /// The column was not valid JSON; kept verbatim so legacy rows survive.
    Unparsed(String),
}

impl Payload {
    /// Parse the column text, falling back to the raw text when it is not JSON.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Unparsed(text),
        }
    }

    /// Text exactly as it belongs in the JSON column (before quote escaping).
    pub fn column_text(&self) -> String {
        match self {
            Payload::Json(value) => value.to_string(),
            Payload::Unparsed(raw) => raw.clone(),
        }
    }

    pub fn display_text(&self) -> String {
        match self {
            Payload::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Payload::Unparsed(raw) => raw.clone(),
        }
    }
}

/// One log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: String,
    pub title: String,
    pub payload: Payload,
}

impl Record {
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn display_timestamp(&self) -> String {
        match self.parsed_timestamp() {
            Some(dt) => dt.format("%b %d, %Y %H:%M:%S").to_string(),
            None => self.timestamp.clone(),
        }
    }
}

/// A link pulled out of a pasted list fragment. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    pub title: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Asset tiles (derived from submitted payload items)
// ---------------------------------------------------------------------------

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "svg"];

#[derive(Debug, Clone, PartialEq)]
pub struct AssetTile {
    pub default_url: String,
    /// First entry of `imageURLs` when it points at an image; otherwise the tile shows a placeholder.
    pub preview_url: Option<String>,
    pub file_name: String,
}

impl AssetTile {
    pub fn from_item(item: &Value) -> Self {
        let default_url = item
            .get("defaultImageURL")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let preview_url = item
            .get("imageURLs")
            .and_then(Value::as_array)
            .and_then(|urls| urls.first())
            .and_then(Value::as_str)
            .filter(|url| is_image_url(url))
            .map(str::to_string);
        AssetTile {
            file_name: file_name(&default_url),
            default_url,
            preview_url,
        }
    }
}

/// Submissions are stored as arrays; a lone value becomes a one-element array.
pub fn normalize_submission(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        other => Value::Array(vec![other]),
    }
}

pub fn tiles(payload: &Value) -> Vec<AssetTile> {
    match payload {
        Value::Array(items) => items.iter().map(AssetTile::from_item).collect(),
        other => vec![AssetTile::from_item(other)],
    }
}

pub fn is_image_url(url: &str) -> bool {
    let Some((_, ext)) = url.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

pub fn file_name(url: &str) -> String {
    match url.rsplit('/').next() {
        Some(last) if !last.is_empty() => last.to_string(),
        _ => "file".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_falls_back_to_raw_text() {
        assert_eq!(
            Payload::from_text("[1,2]".to_string()),
            Payload::Json(json!([1, 2]))
        );
        assert_eq!(
            Payload::from_text("{oops".to_string()),
            Payload::Unparsed("{oops".to_string())
        );
    }

    #[test]
    fn tile_uses_first_image_url_only_when_it_is_an_image() {
        let tile = AssetTile::from_item(&json!({
            "defaultImageURL": "https://cdn.example.com/a/b/photo.JPG",
            "imageURLs": ["https://cdn.example.com/a/b/photo.JPG", "x.png"]
        }));
        assert_eq!(tile.file_name, "photo.JPG");
        assert_eq!(
            tile.preview_url.as_deref(),
            Some("https://cdn.example.com/a/b/photo.JPG")
        );

        let pdf = AssetTile::from_item(&json!({
            "defaultImageURL": "https://cdn.example.com/doc.pdf",
            "imageURLs": ["https://cdn.example.com/doc.pdf"]
        }));
        assert_eq!(pdf.preview_url, None);
    }

    #[test]
    fn missing_fields_give_placeholder_tile() {
        let tile = AssetTile::from_item(&json!(42));
        assert_eq!(tile.default_url, "");
        assert_eq!(tile.file_name, "file");
        assert_eq!(tile.preview_url, None);
    }

    #[test]
    fn lone_values_are_wrapped() {
        assert_eq!(normalize_submission(json!({"a": 1})), json!([{"a": 1}]));
        assert_eq!(normalize_submission(json!([1])), json!([1]));
        assert_eq!(tiles(&json!({"defaultImageURL": "u/v.png"})).len(), 1);
    }

    #[test]
    fn trailing_slash_has_no_file_name() {
        assert_eq!(file_name("https://example.com/dir/"), "file");
        assert!(!is_image_url("https://example.com/png"));
    }

    #[test]
    fn timestamp_display_falls_back_to_raw() {
        let record = Record {
            timestamp: "yesterday".to_string(),
            title: String::new(),
            payload: Payload::Json(Value::Null),
        };
        assert_eq!(record.display_timestamp(), "yesterday");
        assert!(record.parsed_timestamp().is_none());
    }
}
