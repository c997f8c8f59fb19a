//! Integration tests for the HTTP quote and image sources.

use std::sync::Arc;

use quoteshot::{
    bundled_quotes, http_client, Category, Config, Generator, HttpImageSource, HttpQuoteSource,
    ImageFetcher, ImageSource, Layout, MemoryKeyValueStore, QuoteFetcher, QuoteSource,
    QuoteStore, Size, FETCH_FAILED_NOTICE,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    http_client(&Config::default()).expect("client should build")
}

#[tokio::test]
async fn quote_source_reads_content_and_author() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/random"))
        .and(query_param("tags", "success"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "abc",
            "content": "Success usually comes to those who are too busy to be looking for it.",
            "author": "Henry David Thoreau",
            "tags": ["success"]
        })))
        .mount(&server)
        .await;

    let source = HttpQuoteSource::new(client(), format!("{}/random", server.uri()));
    let quote = source.fetch_quote(Category::Success).await.unwrap();
    assert_eq!(quote.author, "Henry David Thoreau");
    assert!(quote.text.starts_with("Success usually"));
}

#[tokio::test]
async fn quote_source_accepts_single_element_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/random"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"content": "Be yourself.", "author": null}
        ])))
        .mount(&server)
        .await;

    let source = HttpQuoteSource::new(client(), format!("{}/random", server.uri()));
    let quote = source.fetch_quote(Category::Life).await.unwrap();
    assert_eq!(quote.text, "Be yourself.");
    assert_eq!(quote.author, "Unknown");
}

#[tokio::test]
async fn secondary_source_answers_when_primary_errors() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&primary)
        .await;

    let secondary = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("tags", "funny"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": "I'm not lazy, I'm on energy saving mode.",
            "author": "Unknown"
        })))
        .expect(1)
        .mount(&secondary)
        .await;

    let fetcher = QuoteFetcher::new(vec![
        Box::new(HttpQuoteSource::new(client(), format!("{}/random", primary.uri()))),
        Box::new(HttpQuoteSource::new(client(), format!("{}/random", secondary.uri()))),
    ]);

    let outcome = fetcher.fetch(Category::Funny).await;
    assert!(!outcome.is_fallback());
    assert_eq!(outcome.quote.text, "I'm not lazy, I'm on energy saving mode.");
}

#[tokio::test]
async fn image_source_sends_key_and_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("query", "sunset"))
        .and(query_param("per_page", "15"))
        .and(header("Authorization", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "photos": [
                {"id": 1, "src": {
                    "original": "https://img.test/1-o.jpg",
                    "large2x": "https://img.test/1-l2.jpg"
                }},
                {"id": 2, "src": {"large": "https://img.test/2-l.jpg"}}
            ]
        })))
        .mount(&server)
        .await;

    let source = HttpImageSource::new(
        client(),
        format!("{}/v1/search", server.uri()),
        Some("test-key".to_string()),
    );
    let photos = source.search("sunset", 1, 15).await.unwrap();
    assert_eq!(photos.len(), 2);
    assert_eq!(photos[0].best_url(), Some("https://img.test/1-l2.jpg"));

    let fetcher = ImageFetcher::new(Box::new(source), "https://default.test/bg.jpg", 15, 4);
    let outcome = fetcher.fetch("sunset").await;
    assert!(!outcome.from_fallback);
    assert!(
        outcome.url == "https://img.test/1-l2.jpg" || outcome.url == "https://img.test/2-l.jpg"
    );
}

/// Love category, both quote sources and the image search down.
#[tokio::test]
async fn generate_falls_back_when_everything_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = Config {
        quote_sources: vec![
            format!("{}/primary/random", server.uri()),
            format!("{}/secondary/random", server.uri()),
        ],
        image_source_url: format!("{}/v1/search", server.uri()),
        default_image_url: "https://default.test/bg.jpg".to_string(),
        randomize_image_keyword: false,
        ..Config::default()
    };

    let mut store = QuoteStore::open(
        Arc::new(MemoryKeyValueStore::new()),
        "savedQuotes",
        Layout::new(Size::new(350.0, 300.0), Size::new(250.0, 100.0)),
    )
    .await
    .unwrap();

    let generator = Generator::from_config(&config).unwrap();
    let generated = generator.fetch(Category::Love).await.into_draft(&mut store);

    assert!(bundled_quotes(Category::Love)
        .iter()
        .any(|q| q.text == generated.text && q.author == generated.author));
    assert_eq!(generated.background_image, "https://default.test/bg.jpg");
    assert_eq!(generated.notice.as_deref(), Some(FETCH_FAILED_NOTICE));
    assert!(store.draft(&generated.draft_id).is_some());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3, "one request per source, no retries");
}
