//! The quote record, one quote-on-image composition.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Position, QuoteFields};

/// Represents a single quote composition in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// Unique identifier for the quote
    pub id: String,
    /// Quote body
    pub text: String,
    /// Attribution, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Topic tag, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Remote URL or file URI of the background
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// User-picked photo shown instead of the background
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_image: Option<String>,
    /// Top-left of the overlay relative to the image tile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_position: Option<Position>,
    /// When the quote was created
    pub created_at: DateTime<Utc>,
}

impl QuoteRecord {
    /// Creates a new record from the given fields, placing the overlay at
    /// `default_position` when the fields carry no position.
    pub fn new(fields: QuoteFields, default_position: Position) -> Self {
        let now = Utc::now();

        QuoteRecord {
            id: generate_id(now),
            text: fields.text,
            author: fields.author,
            category: fields.category,
            background_image: fields.background_image,
            custom_image: fields.custom_image,
            text_position: Some(fields.text_position.unwrap_or(default_position)),
            created_at: now,
        }
    }

    /// The image actually drawn under the overlay.
    pub fn display_image(&self) -> Option<&str> {
        self.custom_image
            .as_deref()
            .or(self.background_image.as_deref())
    }

    /// Copies the user-editable fields back out, e.g. to save a draft.
    pub fn to_fields(&self) -> QuoteFields {
        QuoteFields {
            text: self.text.clone(),
            author: self.author.clone(),
            category: self.category.clone(),
            background_image: self.background_image.clone(),
            custom_image: self.custom_image.clone(),
            text_position: self.text_position,
        }
    }
}

/// Timestamp prefix keeps ids roughly sortable; the random suffix keeps
/// two records created in the same millisecond apart.
pub(crate) fn generate_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.timestamp_millis(), &suffix[..8])
}
