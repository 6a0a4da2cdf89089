use serde::{Deserialize, Serialize};

use dresscode_core::{DomainError, MediaId, ProductId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }
}

impl core::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(MediaKind::Photo),
            "video" => Ok(MediaKind::Video),
            other => Err(format!("unknown media type '{other}'")),
        }
    }
}

/// Metadata of a photo or video attached to a product. The blob itself lives
/// in object storage under `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMedia {
    pub id: MediaId,
    pub product_id: ProductId,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedia {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    /// Only photos can become the product's main photo.
    #[serde(default)]
    pub is_main: bool,
}

impl NewMedia {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.url.trim().is_empty() {
            return Err(DomainError::validation("media url cannot be empty"));
        }
        if self.is_main && self.kind != MediaKind::Photo {
            return Err(DomainError::validation("only a photo can be the main photo"));
        }
        Ok(())
    }

    pub fn sets_main_photo(&self) -> bool {
        self.is_main && self.kind == MediaKind::Photo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_field_is_lowercase() {
        let m: NewMedia =
            serde_json::from_str(r#"{"type":"video","url":"https://cdn/x.mp4"}"#).unwrap();
        assert_eq!(m.kind, MediaKind::Video);
        assert!(!m.is_main);
    }

    #[test]
    fn main_video_is_rejected() {
        let m = NewMedia {
            kind: MediaKind::Video,
            url: "https://cdn/x.mp4".to_string(),
            is_main: true,
        };
        assert!(m.validate().is_err());
    }
}
