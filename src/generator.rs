//! Fetch-and-compose: turns a category into a draft quote on a background.
use log::info;
use rand::seq::SliceRandom;

use crate::{
    http_client, Category, Config, ImageFetcher, QuoteFetcher, QuoteFields, QuoteStore, Result,
};

/// Keywords used for background searches when randomizing.
pub const SCENIC_KEYWORDS: [&str; 10] = [
    "nature", "mountain", "beach", "forest", "city", "sunset", "abstract", "sky", "flowers",
    "space",
];

/// Inline message shown next to a bundled quote.
pub const FETCH_FAILED_NOTICE: &str = "Failed to fetch quote. Please try again.";

/// Fetched content for one generate action, not yet in any store.
#[derive(Debug, Clone, PartialEq)]
pub struct Composed {
    pub category: Category,
    pub text: String,
    pub author: String,
    pub background_image: String,
    /// Set when bundled content stood in for a failed fetch
    pub notice: Option<String>,
}

impl Composed {
    /// Creates a draft from the fetched content.
    pub fn into_draft(self, store: &mut QuoteStore) -> Generated {
        let draft_id = store.create_draft(
            QuoteFields::new(self.text.clone())
                .author(self.author.clone())
                .category(self.category.to_string())
                .background_image(self.background_image.clone()),
        );
        info!("Generated {} draft {}", self.category, draft_id);

        Generated {
            draft_id,
            category: self.category,
            text: self.text,
            author: self.author,
            background_image: self.background_image,
            notice: self.notice,
        }
    }
}

/// What a generate action produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    /// Draft created in the store
    pub draft_id: String,
    pub category: Category,
    pub text: String,
    pub author: String,
    pub background_image: String,
    pub notice: Option<String>,
}

/// Runs the quote and image fetches for one generate action.
pub struct Generator {
    quotes: QuoteFetcher,
    images: ImageFetcher,
    randomize_keyword: bool,
}

impl Generator {
    pub fn new(quotes: QuoteFetcher, images: ImageFetcher, randomize_keyword: bool) -> Self {
        Self {
            quotes,
            images,
            randomize_keyword,
        }
    }

    /// Builds HTTP-backed fetchers from the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http_client(config)?;
        Ok(Self::new(
            QuoteFetcher::from_config(config, &client),
            ImageFetcher::from_config(config, &client),
            config.randomize_image_keyword,
        ))
    }

    fn image_query(&self, category: Category) -> String {
        if self.randomize_keyword {
            SCENIC_KEYWORDS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or("nature")
                .to_string()
        } else {
            category.to_string()
        }
    }

    /// Fetches a quote and a background concurrently. Fetch failures are
    /// absorbed by fallback content. Nothing touches the store while the
    /// requests are in flight; see [`Composed::into_draft`].
    pub async fn fetch(&self, category: Category) -> Composed {
        let query = self.image_query(category);
        let (quote, image) = tokio::join!(self.quotes.fetch(category), self.images.fetch(&query));

        Composed {
            category,
            notice: quote.is_fallback().then(|| FETCH_FAILED_NOTICE.to_string()),
            text: quote.quote.text,
            author: quote.quote.author,
            background_image: image.url,
        }
    }
}
