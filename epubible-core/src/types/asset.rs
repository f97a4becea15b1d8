//! Localized image assets

use serde::{Deserialize, Serialize};

/// Image formats that can be embedded in the EPUB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpg,
    Png,
    Gif,
    Svg,
}

impl ImageKind {
    pub const ALL: [ImageKind; 4] = [
        ImageKind::Jpg,
        ImageKind::Png,
        ImageKind::Gif,
        ImageKind::Svg,
    ];

    /// File extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Svg => "svg",
        }
    }

    /// Media type used in the package manifest
    pub fn mime(self) -> &'static str {
        match self {
            ImageKind::Jpg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::Svg => "image/svg+xml",
        }
    }

    /// Classify a URL by the extension of its path. Matching is case-sensitive
    /// and ignores any query string or fragment.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        Self::ALL
            .into_iter()
            .find(|kind| path.ends_with(&format!(".{}", kind.extension())))
    }

    /// Classify a declared MIME type such as `image/png`
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        match essence {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpg),
            "image/png" => Some(ImageKind::Png),
            "image/gif" => Some(ImageKind::Gif),
            "image/svg+xml" => Some(ImageKind::Svg),
            _ => None,
        }
    }
}

/// An image downloaded into the working tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// URL the image was fetched from
    pub source_url: String,

    /// File name inside the images directory
    pub filename: String,

    /// Manifest item id
    pub id: String,

    /// Media type
    pub mime: String,
}

impl ImageAsset {
    pub fn new(
        source_url: impl Into<String>,
        filename: impl Into<String>,
        kind: ImageKind,
    ) -> Self {
        let filename = filename.into();
        Self {
            source_url: source_url.into(),
            id: manifest_id(&filename),
            filename,
            mime: kind.mime().to_string(),
        }
    }
}

/// Build an XML-safe manifest id from a file name
fn manifest_id(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("img-{}", sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_url() {
        assert_eq!(ImageKind::from_url("https://x/img.jpg"), Some(ImageKind::Jpg));
        assert_eq!(ImageKind::from_url("https://x/a.svg?v=2"), Some(ImageKind::Svg));
        assert_eq!(ImageKind::from_url("https://x/doc.pdf"), None);
        assert_eq!(ImageKind::from_url("https://x/IMG.JPG"), None);
        assert_eq!(ImageKind::from_url("https://x/photo.jpeg"), None);
    }

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(ImageKind::from_mime("image/png"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_mime("image/jpeg; q=1"), Some(ImageKind::Jpg));
        assert_eq!(ImageKind::from_mime("application/pdf"), None);
    }

    #[test]
    fn test_asset_id_is_xml_safe() {
        let asset = ImageAsset::new("https://x/my pic.1.png", "my pic.1.png", ImageKind::Png);
        assert_eq!(asset.id, "img-my-pic-1-png");
        assert_eq!(asset.mime, "image/png");
    }
}
