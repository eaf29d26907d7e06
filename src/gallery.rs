//! Ordered product galleries.
//!
//! A [`Gallery`] is an ordered list of image URLs. Index 0 is the primary
//! (listing) image. Every operation returns a new gallery; nothing is mutated
//! in place, so a slow upload can never race a manual removal on shared state.
//!
//! ## Persisted shape
//!
//! Products store their images as [`ProductImages`]:
//!
//! ```json
//! { "images": ["https://…/front.jpg", "https://…/back.jpg"], "image": "https://…/front.jpg" }
//! ```
//!
//! Older records only carry the singular `image`. [`Gallery::normalize`]
//! reads either shape, and [`Gallery::to_record`] writes both fields, keeping
//! `image` equal to `images[0]` so older readers still find a primary image.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GalleryError {
    #[error("index {index} out of range for gallery of {len} image(s)")]
    OutOfRange { index: usize, len: usize },
}

/// The image fields of a product record, in either the current or legacy shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImages {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductImages {
    /// Legacy single-image record.
    pub fn legacy(image: impl Into<String>) -> Self {
        Self {
            images: Vec::new(),
            image: Some(image.into()),
        }
    }

    /// Read the image fields out of a full product record, ignoring the rest.
    pub fn from_product(product: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(product)
    }

    /// Already in the shape [`Gallery::to_record`] writes, so rewriting it
    /// would change nothing.
    pub fn is_normalized(&self) -> bool {
        *self == Gallery::normalize(self).to_record()
    }

    /// Overwrite `images` and `image` in a product record, leaving every other
    /// field untouched.
    pub fn write_into(&self, product: &mut Map<String, Value>) {
        product.insert(
            "images".to_string(),
            Value::Array(self.images.iter().cloned().map(Value::String).collect()),
        );
        match &self.image {
            Some(image) => {
                product.insert("image".to_string(), Value::String(image.clone()));
            }
            None => {
                product.remove("image");
            }
        }
    }
}

/// An ordered list of image URLs; index 0 is the primary image.
///
/// URLs are opaque and not required to be unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gallery(Vec<String>);

impl Gallery {
    pub fn new(urls: Vec<String>) -> Self {
        Self(urls)
    }

    /// Build a gallery from either record shape.
    ///
    /// A non-empty `images` list wins; otherwise a non-empty legacy `image`
    /// becomes a one-element gallery; otherwise the gallery is empty.
    /// Idempotent: `normalize(&g.to_record()) == g` for any gallery `g`.
    pub fn normalize(record: &ProductImages) -> Self {
        if !record.images.is_empty() {
            return Self(record.images.clone());
        }
        match record.image.as_deref() {
            Some(image) if !image.is_empty() => Self(vec![image.to_string()]),
            _ => Self::default(),
        }
    }

    /// Record shape for persisting: `images` plus `image` mirrored from
    /// `images[0]` (empty string when there are no images).
    pub fn to_record(&self) -> ProductImages {
        ProductImages {
            images: self.0.clone(),
            image: Some(self.primary().unwrap_or_default().to_string()),
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.0
    }

    pub fn into_urls(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The listing image, if there is one.
    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// The listing image, or `placeholder` for an empty gallery.
    pub fn primary_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.primary().unwrap_or(placeholder)
    }

    /// New gallery with `urls` appended after the existing entries, in order.
    pub fn appended<I>(&self, urls: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut next = self.0.clone();
        next.extend(urls);
        Self(next)
    }

    /// New gallery with the entry at `index` removed and everything else in
    /// its original relative order. Removing index 0 promotes the next entry
    /// to primary.
    pub fn remove_at(&self, index: usize) -> Result<Self, GalleryError> {
        if index >= self.0.len() {
            return Err(GalleryError::OutOfRange {
                index,
                len: self.0.len(),
            });
        }
        let mut next = self.0.clone();
        next.remove(index);
        Ok(Self(next))
    }
}

impl From<Vec<String>> for Gallery {
    fn from(urls: Vec<String>) -> Self {
        Self(urls)
    }
}

/// Free-function form of [`Gallery::remove_at`].
pub fn remove_at(gallery: &Gallery, index: usize) -> Result<Gallery, GalleryError> {
    gallery.remove_at(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gallery(urls: &[&str]) -> Gallery {
        Gallery::new(urls.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn legacy_record_normalizes_to_single_entry() {
        let g = Gallery::normalize(&ProductImages::legacy("x.jpg"));
        assert_eq!(g, gallery(&["x.jpg"]));
        assert_eq!(g.primary(), Some("x.jpg"));
    }

    #[test]
    fn images_win_over_legacy_image() {
        let record = ProductImages {
            images: vec!["a.jpg".into(), "b.jpg".into()],
            image: Some("old.jpg".into()),
        };
        assert_eq!(Gallery::normalize(&record), gallery(&["a.jpg", "b.jpg"]));
    }

    #[test]
    fn empty_legacy_image_means_empty_gallery() {
        assert!(Gallery::normalize(&ProductImages::legacy("")).is_empty());
        assert!(Gallery::normalize(&ProductImages::default()).is_empty());
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            ProductImages::default(),
            ProductImages::legacy("x.jpg"),
            ProductImages::legacy(""),
            ProductImages {
                images: vec!["a".into(), "b".into(), "a".into()],
                image: None,
            },
            ProductImages {
                images: vec!["a".into()],
                image: Some("stale".into()),
            },
        ];
        for record in inputs {
            let once = Gallery::normalize(&record);
            let twice = Gallery::normalize(&once.to_record());
            assert_eq!(once, twice, "record {record:?}");
        }
    }

    #[test]
    fn to_record_mirrors_primary() {
        let record = gallery(&["a.jpg", "b.jpg"]).to_record();
        assert_eq!(record.images, vec!["a.jpg", "b.jpg"]);
        assert_eq!(record.image.as_deref(), Some("a.jpg"));

        let empty = Gallery::default().to_record();
        assert!(empty.images.is_empty());
        assert_eq!(empty.image.as_deref(), Some(""));
    }

    #[test]
    fn remove_first_promotes_next() {
        let g = gallery(&["url1", "url2"]);
        let next = g.remove_at(0).unwrap();
        assert_eq!(next, gallery(&["url2"]));
        assert_eq!(next.primary(), Some("url2"));
        // Original untouched.
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn remove_at_deletes_exactly_one_index() {
        for len in 1..=6 {
            let urls: Vec<String> = (0..len).map(|i| format!("u{i}")).collect();
            let g = Gallery::new(urls.clone());
            for i in 0..len {
                let next = g.remove_at(i).unwrap();
                let mut expected = urls.clone();
                expected.remove(i);
                assert_eq!(next.urls(), expected.as_slice(), "len {len}, index {i}");
            }
        }
    }

    #[test]
    fn remove_at_keeps_duplicates_elsewhere() {
        let g = gallery(&["a", "b", "a"]);
        assert_eq!(g.remove_at(0).unwrap(), gallery(&["b", "a"]));
        assert_eq!(g.remove_at(2).unwrap(), gallery(&["a", "b"]));
    }

    #[test]
    fn remove_out_of_range() {
        assert_eq!(
            gallery(&["a"]).remove_at(1),
            Err(GalleryError::OutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            remove_at(&Gallery::default(), 0),
            Err(GalleryError::OutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn appended_preserves_existing_order() {
        let g = gallery(&["a", "b"]);
        let next = g.appended(vec!["c".to_string(), "d".to_string()]);
        assert_eq!(next, gallery(&["a", "b", "c", "d"]));
        assert_eq!(next.primary(), Some("a"));
    }

    #[test]
    fn empty_gallery_uses_placeholder() {
        let g = Gallery::default();
        assert_eq!(g.primary(), None);
        assert_eq!(g.primary_or("/placeholder.jpg"), "/placeholder.jpg");
        assert_eq!(gallery(&["a"]).primary_or("/placeholder.jpg"), "a");
    }

    #[test]
    fn product_record_roundtrip_preserves_other_fields() {
        let mut product = json!({
            "name": "Dial Indicator",
            "category": "Metrology",
            "image": "legacy.jpg",
            "specs": ["0.01mm"]
        });

        let record = ProductImages::from_product(&product).unwrap();
        let g = Gallery::normalize(&record).appended(vec!["new.jpg".to_string()]);
        g.to_record()
            .write_into(product.as_object_mut().unwrap());

        assert_eq!(
            product,
            json!({
                "name": "Dial Indicator",
                "category": "Metrology",
                "image": "legacy.jpg",
                "images": ["legacy.jpg", "new.jpg"],
                "specs": ["0.01mm"]
            })
        );
    }

    #[test]
    fn only_gallery_shaped_records_are_normalized() {
        assert!(gallery(&["a", "b"]).to_record().is_normalized());
        assert!(Gallery::default().to_record().is_normalized());

        assert!(!ProductImages::legacy("x.jpg").is_normalized());
        assert!(!ProductImages::default().is_normalized());
        let stale = ProductImages {
            images: vec!["a".into()],
            image: Some("old".into()),
        };
        assert!(!stale.is_normalized());
    }

    #[test]
    fn gallery_serializes_as_plain_array() {
        let g = gallery(&["a", "b"]);
        assert_eq!(serde_json::to_value(&g).unwrap(), json!(["a", "b"]));
    }
}
