//! Template context handed to the template set

use super::ImageAsset;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Markup contributed by one verse entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenderedFragment(String);

impl RenderedFragment {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RenderedFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Values available to every template.
///
/// Serialized field names are the template variables: `title`, `uuid`,
/// `name`, `date`, `images` and `items`.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    pub title: String,

    /// Unique identifier of this document
    #[serde(rename = "uuid")]
    pub document_id: Uuid,

    /// User the book was generated for
    #[serde(rename = "name")]
    pub owner_name: String,

    /// Generation date, serialized as ISO 8601
    #[serde(rename = "date")]
    pub generation_date: NaiveDate,

    pub images: Vec<ImageAsset>,
    pub items: Vec<RenderedFragment>,
}

impl RenderContext {
    /// Assemble a context with a freshly generated document id
    pub fn new(
        title: impl Into<String>,
        owner_name: impl Into<String>,
        generation_date: NaiveDate,
        images: Vec<ImageAsset>,
        items: Vec<RenderedFragment>,
    ) -> Self {
        Self {
            title: title.into(),
            document_id: Uuid::new_v4(),
            owner_name: owner_name.into(),
            generation_date,
            images,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_serialization() {
        let date = NaiveDate::from_ymd_opt(2011, 5, 4).unwrap();
        let context = RenderContext::new(
            "The Bible",
            "ntoll",
            date,
            Vec::new(),
            vec![RenderedFragment::new("In the beginning")],
        );
        let json = serde_json::to_value(&context).unwrap();

        assert_eq!(json["title"], "The Bible");
        assert_eq!(json["name"], "ntoll");
        assert_eq!(json["date"], "2011-05-04");
        assert_eq!(json["items"][0], "In the beginning");
        assert_eq!(json["uuid"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn test_document_ids_are_unique() {
        let date = NaiveDate::from_ymd_opt(2011, 5, 4).unwrap();
        let a = RenderContext::new("t", "n", date, Vec::new(), Vec::new());
        let b = RenderContext::new("t", "n", date, Vec::new(), Vec::new());
        assert_ne!(a.document_id, b.document_id);
    }
}
