//! Quote and image sources.
//!
//! Each generate action makes at most one request per source. There is no
//! retry loop: when every quote source fails a bundled quote is used, and
//! when the image search fails the configured default image is used.
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::{random_bundled_quote, Category, Config, QuoteError, Result};

/// A quote as returned by a source, before it becomes a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedQuote {
    pub text: String,
    pub author: String,
}

/// Something that can produce one random quote for a category.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn fetch_quote(&self, category: Category) -> Result<FetchedQuote>;
}

/// Something that can search photos by keyword.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Vec<Photo>>;
}

/// Builds the HTTP client shared by the sources.
pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(concat!("quoteshot/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

fn build_url(base: &str, params: &[(&str, String)]) -> Result<reqwest::Url> {
    reqwest::Url::parse_with_params(base, params).map_err(|e| QuoteError::ConfigError {
        message: format!("invalid source URL '{}': {}", base, e),
    })
}

#[derive(Debug, Deserialize)]
struct ApiQuote {
    content: String,
    #[serde(default)]
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuoteResponse {
    One(ApiQuote),
    Many(Vec<ApiQuote>),
}

/// `GET {url}?tags={category}` returning `{content, author}`.
pub struct HttpQuoteSource {
    client: reqwest::Client,
    url: String,
}

impl HttpQuoteSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch_quote(&self, category: Category) -> Result<FetchedQuote> {
        let url = build_url(&self.url, &[("tags", category.to_string())])?;
        debug!("Requesting quote from {}", url);

        let response: QuoteResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let quote = match response {
            QuoteResponse::One(quote) => Some(quote),
            QuoteResponse::Many(quotes) => quotes.into_iter().next(),
        };

        match quote {
            Some(q) if !q.content.trim().is_empty() => Ok(FetchedQuote {
                text: q.content.trim().to_string(),
                author: q
                    .author
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
            }),
            _ => Err(QuoteError::UnexpectedResponse {
                source_url: self.url.clone(),
                message: "no quote content".to_string(),
            }),
        }
    }
}

/// Result of asking the quote sources for a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteOutcome {
    pub quote: FetchedQuote,
    /// Name of the source that answered, `None` for a bundled quote
    pub source: Option<String>,
}

impl QuoteOutcome {
    pub fn is_fallback(&self) -> bool {
        self.source.is_none()
    }
}

/// Tries each quote source once, in order, then falls back to a bundled
/// quote. Never fails.
pub struct QuoteFetcher {
    sources: Vec<Box<dyn QuoteSource>>,
}

impl QuoteFetcher {
    pub fn new(sources: Vec<Box<dyn QuoteSource>>) -> Self {
        Self { sources }
    }

    pub fn from_config(config: &Config, client: &reqwest::Client) -> Self {
        let sources = config
            .quote_sources
            .iter()
            .map(|url| {
                Box::new(HttpQuoteSource::new(client.clone(), url.clone())) as Box<dyn QuoteSource>
            })
            .collect();
        Self::new(sources)
    }

    pub async fn fetch(&self, category: Category) -> QuoteOutcome {
        for source in &self.sources {
            match source.fetch_quote(category).await {
                Ok(quote) => {
                    info!("Fetched {} quote from {}", category, source.name());
                    return QuoteOutcome {
                        quote,
                        source: Some(source.name().to_string()),
                    };
                }
                Err(e) => warn!("Quote source {} failed: {}", source.name(), e),
            }
        }

        let bundled = random_bundled_quote(category);
        info!("Using bundled {} quote", category);
        QuoteOutcome {
            quote: FetchedQuote {
                text: bundled.text.to_string(),
                author: bundled.author.to_string(),
            },
            source: None,
        }
    }
}

/// Resolution variants of one search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSources {
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub large2x: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
}

/// One image search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub src: PhotoSources,
    #[serde(default)]
    pub photographer: Option<String>,
}

impl Photo {
    /// Best URL for a background tile.
    pub fn best_url(&self) -> Option<&str> {
        [
            &self.src.large2x,
            &self.src.large,
            &self.src.original,
            &self.src.medium,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

/// `GET {url}?query=..&per_page=..&page=..` with an API key header,
/// returning `{photos: [{src: {...}}]}`.
pub struct HttpImageSource {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpImageSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Vec<Photo>> {
        let url = build_url(
            &self.url,
            &[
                ("query", query.to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ],
        )?;
        debug!("Searching images: {}", url);

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, key);
        }

        let response: SearchResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.photos)
    }
}

/// Result of asking the image source for a background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutcome {
    pub url: String,
    pub from_fallback: bool,
}

/// Picks one random photo from one random results page, or the default
/// image when that fails. Never fails.
pub struct ImageFetcher {
    source: Box<dyn ImageSource>,
    default_image_url: String,
    per_page: u32,
    max_page: u32,
}

impl ImageFetcher {
    pub fn new(
        source: Box<dyn ImageSource>,
        default_image_url: impl Into<String>,
        per_page: u32,
        max_page: u32,
    ) -> Self {
        Self {
            source,
            default_image_url: default_image_url.into(),
            per_page: per_page.max(1),
            max_page: max_page.max(1),
        }
    }

    pub fn from_config(config: &Config, client: &reqwest::Client) -> Self {
        let source = HttpImageSource::new(
            client.clone(),
            config.image_source_url.clone(),
            config.image_api_key.clone(),
        );
        Self::new(
            Box::new(source),
            config.default_image_url.clone(),
            config.images_per_page,
            config.max_image_page,
        )
    }

    pub async fn fetch(&self, query: &str) -> ImageOutcome {
        let page = rand::thread_rng().gen_range(1..=self.max_page);

        let photos = match self.source.search(query, page, self.per_page).await {
            Ok(photos) => photos,
            Err(e) => {
                warn!("Image search for '{}' failed: {}", query, e);
                return self.fallback();
            }
        };

        let usable: Vec<&str> = photos.iter().filter_map(Photo::best_url).collect();
        match usable.choose(&mut rand::thread_rng()) {
            Some(url) => {
                debug!("Picked background from page {} of '{}'", page, query);
                ImageOutcome {
                    url: url.to_string(),
                    from_fallback: false,
                }
            }
            None => {
                warn!("Image search for '{}' returned no usable photos", query);
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> ImageOutcome {
        ImageOutcome {
            url: self.default_image_url.clone(),
            from_fallback: true,
        }
    }
}
