use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use log::{debug, error, info, trace, warn};

use crate::{
    normalize_image_url, parse_favorites, quote::generate_id, Config, FileKeyValueStore,
    KeyValueStore, Layout, PersistStatus, PersistWriter, Position, QuoteError, QuoteFields,
    QuoteRecord, Result,
};

/// Owns the draft and favorite quote collections.
///
/// Drafts live only in memory. Every change to favorites queues a full
/// snapshot of the collection to the key-value store; the in-memory
/// collection stays authoritative for the running session even when a
/// write fails.
///
/// The store is a plain owned value: whoever drives the UI holds it and
/// passes `&mut` to the code that mutates it.
pub struct QuoteStore {
    /// Key under which favorites are persisted
    storage_key: String,

    /// Tile and text box used for default overlay placement
    layout: Layout,

    /// Transient records from generate/customize
    drafts: Vec<QuoteRecord>,

    /// Persisted records, in save order
    favorites: Vec<QuoteRecord>,

    /// Favorites whose background failed to load in the UI
    failed_images: HashSet<String>,

    /// Background writer for favorites snapshots
    writer: PersistWriter,
}

/// Key that holds a copy of a favorites blob that did not load cleanly.
pub fn backup_key(storage_key: &str) -> String {
    format!("{}_unreadable", storage_key)
}

impl QuoteStore {
    /// Opens the store, loading favorites from `kv` before returning.
    ///
    /// Must be called inside a tokio runtime; the persistence writer is
    /// spawned onto it. Malformed entries are skipped one by one. When the
    /// blob is unreadable or anything was skipped, the original blob is
    /// copied to [`backup_key`] before the store opens, so the next save
    /// never destroys the only copy of it.
    pub async fn open(
        kv: Arc<dyn KeyValueStore>,
        storage_key: &str,
        layout: Layout,
    ) -> Result<Self> {
        info!("Opening quote store with key '{}'", storage_key);

        let favorites = match kv.get(storage_key).await? {
            Some(blob) => {
                let (records, mut damaged) = match parse_favorites(&blob) {
                    Ok(parsed) => {
                        let damaged = parsed.skipped > 0;
                        (parsed.records, damaged)
                    }
                    Err(e) => {
                        error!("Stored favorites are unreadable, starting empty: {}", e);
                        (Vec::new(), true)
                    }
                };
                let loaded = records.len();
                let records = dedupe_ids(records);
                damaged |= records.len() < loaded;

                if damaged {
                    let backup = backup_key(storage_key);
                    kv.set(&backup, blob).await.map_err(|e| {
                        error!("Could not back up stored favorites to '{}': {}", backup, e);
                        e
                    })?;
                    warn!("Original favorites blob kept under '{}'", backup);
                }
                records
            }
            None => {
                debug!("No stored favorites under '{}'", storage_key);
                Vec::new()
            }
        };

        info!("Loaded {} favorites", favorites.len());

        Ok(Self {
            storage_key: storage_key.to_string(),
            layout,
            drafts: Vec::new(),
            favorites,
            failed_images: HashSet::new(),
            writer: PersistWriter::spawn(kv, storage_key.to_string()),
        })
    }

    /// Opens a file-backed store in the configured data directory.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let kv = FileKeyValueStore::new(&config.data_dir)?;
        Self::open(Arc::new(kv), &config.storage_key, config.layout()).await
    }

    /// Key under which favorites are persisted.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Creates a draft and returns its id. The overlay starts centered on
    /// the tile unless the fields carry a position.
    pub fn create_draft(&mut self, fields: QuoteFields) -> String {
        let record = self.new_record(fields);
        let id = record.id.clone();
        debug!("Created draft {}", id);
        self.drafts.push(record);
        id
    }

    pub fn draft(&self, id: &str) -> Option<&QuoteRecord> {
        self.drafts.iter().find(|q| q.id == id)
    }

    pub fn drafts(&self) -> &[QuoteRecord] {
        &self.drafts
    }

    /// Replaces the text and author of a draft while the user is typing.
    /// Empty text is allowed here. No-op if the draft does not exist.
    pub fn update_draft_text(&mut self, id: &str, text: &str, author: Option<&str>) {
        if let Some(draft) = self.drafts.iter_mut().find(|q| q.id == id) {
            draft.text = text.to_string();
            draft.author = author.map(str::to_string);
            trace!("Draft {} text updated", id);
        }
    }

    /// Sets the overlay position of a draft. No-op if the draft does not
    /// exist; favorites are never touched.
    pub fn update_position(&mut self, id: &str, position: Position) {
        match self.drafts.iter_mut().find(|q| q.id == id) {
            Some(draft) => {
                draft.text_position = Some(position);
                trace!("Draft {} moved to ({}, {})", id, position.x, position.y);
            }
            None => debug!("Ignoring position update for unknown draft {}", id),
        }
    }

    /// Discards a draft.
    pub fn discard_draft(&mut self, id: &str) -> bool {
        let before = self.drafts.len();
        self.drafts.retain(|q| q.id != id);
        before != self.drafts.len()
    }

    pub fn favorites(&self) -> &[QuoteRecord] {
        &self.favorites
    }

    pub fn favorite(&self, id: &str) -> Option<&QuoteRecord> {
        self.favorites.iter().find(|q| q.id == id)
    }

    /// Saves a new favorite built from `fields` and returns its id.
    ///
    /// The record always gets a fresh id. Returns `Ok(None)` without
    /// changing anything when a favorite with the same text and author
    /// already exists. Empty text is rejected.
    pub fn save(&mut self, fields: QuoteFields) -> Result<Option<String>> {
        if fields.text.trim().is_empty() {
            warn!("Refusing to save a quote with empty text");
            return Err(QuoteError::InvalidQuote {
                message: "quote text must not be empty".to_string(),
            });
        }

        if self
            .favorites
            .iter()
            .any(|q| q.text == fields.text && q.author == fields.author)
        {
            debug!("Quote already in favorites, skipping duplicate save");
            return Ok(None);
        }

        let mut fields = fields;
        fields.background_image = normalize_image_url(fields.background_image.as_deref());
        fields.custom_image = normalize_image_url(fields.custom_image.as_deref());

        let record = self.new_record(fields);
        let id = record.id.clone();
        self.favorites.push(record);
        info!("Saved quote {} to favorites", id);

        self.persist();
        Ok(Some(id))
    }

    /// Saves a copy of a draft to favorites. The draft itself is left as is.
    pub fn save_draft(&mut self, draft_id: &str) -> Result<Option<String>> {
        let fields = self
            .draft(draft_id)
            .map(QuoteRecord::to_fields)
            .ok_or_else(|| QuoteError::QuoteNotFound {
                id: draft_id.to_string(),
            })?;
        self.save(fields)
    }

    /// Removes a favorite. Returns whether anything was removed; an
    /// unknown id is not an error.
    pub fn delete(&mut self, id: &str) -> bool {
        self.failed_images.remove(id);

        let before = self.favorites.len();
        self.favorites.retain(|q| q.id != id);
        if before == self.favorites.len() {
            debug!("Delete of unknown favorite {} ignored", id);
            return false;
        }

        info!("Deleted favorite {}", id);
        self.persist();
        true
    }

    /// Records that a favorite's background failed to load.
    pub fn mark_image_failed(&mut self, id: &str) {
        if self.favorite(id).is_some() {
            self.failed_images.insert(id.to_string());
        }
    }

    pub fn image_failed(&self, id: &str) -> bool {
        self.failed_images.contains(id)
    }

    /// Favorites tagged with `category`, compared case-insensitively.
    pub fn favorites_by_category(&self, category: &str) -> Vec<QuoteRecord> {
        let wanted = category.trim().to_lowercase();
        self.favorites
            .iter()
            .filter(|q| {
                q.category
                    .as_deref()
                    .is_some_and(|c| c.trim().to_lowercase() == wanted)
            })
            .cloned()
            .collect()
    }

    /// Searches favorites by text and author using fuzzy matching
    /// Returns matches sorted by relevance score
    pub fn search_favorites(&self, query: &str) -> Vec<QuoteRecord> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default();

        let mut scored: Vec<(i64, &QuoteRecord)> = self
            .favorites
            .iter()
            .filter_map(|q| {
                let text_score = matcher.fuzzy_match(&q.text, query).unwrap_or(0);
                let author_score = q
                    .author
                    .as_deref()
                    .and_then(|a| matcher.fuzzy_match(a, query))
                    .unwrap_or(0);
                let score = text_score * 2 + author_score;
                (score > 0).then_some((score, q))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        debug!("Search '{}' matched {} favorites", query, scored.len());
        scored.into_iter().map(|(_, q)| q.clone()).collect()
    }

    /// Waits for every queued favorites write to finish.
    pub async fn flush(&self) -> Result<()> {
        self.writer.flush().await
    }

    pub fn persist_status(&self) -> PersistStatus {
        self.writer.get_status()
    }

    /// Drains pending writes and stops the writer.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down quote store...");
        self.writer.stop().await
    }

    fn new_record(&self, fields: QuoteFields) -> QuoteRecord {
        let mut record = QuoteRecord::new(fields, self.layout.centered());
        while self.contains_id(&record.id) {
            record.id = generate_id(Utc::now());
        }
        record
    }

    fn contains_id(&self, id: &str) -> bool {
        self.drafts.iter().any(|q| q.id == id) || self.favorites.iter().any(|q| q.id == id)
    }

    fn persist(&self) {
        match serde_json::to_string(&self.favorites) {
            Ok(snapshot) => self.writer.queue(snapshot),
            Err(e) => error!("Failed to serialize favorites: {}", e),
        }
    }
}

fn dedupe_ids(records: Vec<QuoteRecord>) -> Vec<QuoteRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|q| {
            let fresh = seen.insert(q.id.clone());
            if !fresh {
                warn!("Dropping stored quote with duplicate id {}", q.id);
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{MemoryKeyValueStore, Size};

    fn layout() -> Layout {
        Layout::new(Size::new(350.0, 300.0), Size::new(250.0, 100.0))
    }

    async fn open_memory() -> (Arc<MemoryKeyValueStore>, QuoteStore) {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = QuoteStore::open(kv.clone(), "savedQuotes", layout())
            .await
            .unwrap();
        (kv, store)
    }

    #[tokio::test]
    async fn draft_defaults_to_centered_position() {
        let (_, mut store) = open_memory().await;
        let id = store.create_draft(QuoteFields::new(""));
        let draft = store.draft(&id).unwrap();
        assert_eq!(draft.text_position, Some(Position::new(50.0, 100.0)));
        assert!(store.favorites().is_empty());
    }

    #[tokio::test]
    async fn update_position_touches_drafts_only() {
        let (_, mut store) = open_memory().await;
        let draft_id = store.create_draft(QuoteFields::new("a"));
        let fav_id = store.save(QuoteFields::new("a")).unwrap().unwrap();

        store.update_position(&draft_id, Position::new(5.0, 6.0));
        store.update_position(&fav_id, Position::new(7.0, 8.0));
        store.update_position("missing", Position::new(1.0, 1.0));

        assert_eq!(
            store.draft(&draft_id).unwrap().text_position,
            Some(Position::new(5.0, 6.0))
        );
        assert_eq!(
            store.favorite(&fav_id).unwrap().text_position,
            Some(Position::new(50.0, 100.0))
        );
    }

    #[tokio::test]
    async fn duplicate_save_is_silent() {
        let (_, mut store) = open_memory().await;
        let first = store
            .save(QuoteFields::new("A").author("B"))
            .unwrap();
        let second = store
            .save(QuoteFields::new("A").author("B"))
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(store.favorites().len(), 1);
    }

    #[tokio::test]
    async fn same_text_different_author_is_not_a_duplicate() {
        let (_, mut store) = open_memory().await;
        store.save(QuoteFields::new("A").author("B")).unwrap();
        store.save(QuoteFields::new("A")).unwrap();
        assert_eq!(store.favorites().len(), 2);
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let (_, mut store) = open_memory().await;
        assert!(matches!(
            store.save(QuoteFields::new("   ")),
            Err(QuoteError::InvalidQuote { .. })
        ));
        assert!(store.favorites().is_empty());
    }

    #[tokio::test]
    async fn save_draft_assigns_fresh_id() {
        let (_, mut store) = open_memory().await;
        let draft_id = store.create_draft(
            QuoteFields::new("Life is short").background_image("//img.test/a.jpg"),
        );
        let fav_id = store.save_draft(&draft_id).unwrap().unwrap();

        assert_ne!(draft_id, fav_id);
        assert!(store.draft(&draft_id).is_some());
        let favorite = store.favorite(&fav_id).unwrap();
        assert_eq!(
            favorite.background_image.as_deref(),
            Some("https://img.test/a.jpg")
        );
        assert!(matches!(
            store.save_draft("missing"),
            Err(QuoteError::QuoteNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_unknown_id_changes_nothing() {
        let (_, mut store) = open_memory().await;
        store.save(QuoteFields::new("keep")).unwrap();
        assert!(!store.delete("nope"));
        assert_eq!(store.favorites().len(), 1);
    }

    #[tokio::test]
    async fn delete_clears_failed_image_bookkeeping() {
        let (_, mut store) = open_memory().await;
        let id = store.save(QuoteFields::new("x")).unwrap().unwrap();
        store.mark_image_failed(&id);
        assert!(store.image_failed(&id));

        assert!(store.delete(&id));
        assert!(!store.image_failed(&id));
        store.mark_image_failed(&id);
        assert!(!store.image_failed(&id));
    }

    #[tokio::test]
    async fn mutations_are_persisted() {
        let (kv, mut store) = open_memory().await;
        let id = store.save(QuoteFields::new("one")).unwrap().unwrap();
        store.save(QuoteFields::new("two")).unwrap();
        store.delete(&id);
        store.flush().await.unwrap();

        let blob = kv.get("savedQuotes").await.unwrap().unwrap();
        let stored: Vec<QuoteRecord> = serde_json::from_str(&blob).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].text, "two");
    }

    #[tokio::test]
    async fn drafts_are_never_persisted() {
        let (kv, mut store) = open_memory().await;
        store.create_draft(QuoteFields::new("draft only"));
        store.flush().await.unwrap();
        assert_eq!(kv.get("savedQuotes").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreadable_blob_starts_empty() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set("savedQuotes", "{broken".to_string()).await.unwrap();
        let store = QuoteStore::open(kv.clone(), "savedQuotes", layout())
            .await
            .unwrap();
        assert!(store.favorites().is_empty());
        assert_eq!(
            kv.get("savedQuotes_unreadable").await.unwrap().as_deref(),
            Some("{broken")
        );
    }

    #[tokio::test]
    async fn malformed_record_is_backed_up_and_the_rest_survive_a_save() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let blob = r#"[
            {"id": "1", "text": "keep me", "author": "A", "createdAt": "2024-01-01T00:00:00Z"},
            {"id": "2", "text": "legacy without timestamp", "author": "B"}
        ]"#;
        kv.set("savedQuotes", blob.to_string()).await.unwrap();

        let mut store = QuoteStore::open(kv.clone(), "savedQuotes", layout())
            .await
            .unwrap();
        assert_eq!(store.favorites().len(), 1);
        assert_eq!(store.favorites()[0].text, "keep me");
        assert_eq!(
            kv.get(&backup_key("savedQuotes")).await.unwrap().as_deref(),
            Some(blob)
        );

        store.save(QuoteFields::new("new one")).unwrap();
        store.flush().await.unwrap();

        let stored = kv.get("savedQuotes").await.unwrap().unwrap();
        assert!(stored.contains("keep me"));
        assert!(stored.contains("new one"));
        assert!(!stored.contains("legacy without timestamp"));
        let backup = kv.get(&backup_key("savedQuotes")).await.unwrap().unwrap();
        assert!(backup.contains("legacy without timestamp"));
    }

    struct ReadOnlyStore(String);

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(Some(self.0.clone()))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<()> {
            Err(QuoteError::Io(std::io::Error::other("read-only volume")))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn open_fails_when_damaged_blob_cannot_be_backed_up() {
        let kv = Arc::new(ReadOnlyStore("{broken".to_string()));
        let result = QuoteStore::open(kv, "savedQuotes", layout()).await;
        assert!(matches!(result, Err(QuoteError::Io(_))));
    }

    #[tokio::test]
    async fn clean_blob_writes_no_backup() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let blob = r#"[{"id": "1", "text": "fine", "createdAt": "2024-01-01T00:00:00Z"}]"#;
        kv.set("savedQuotes", blob.to_string()).await.unwrap();
        QuoteStore::open(kv.clone(), "savedQuotes", layout())
            .await
            .unwrap();
        assert_eq!(kv.get(&backup_key("savedQuotes")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_stored_ids_keep_first() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let blob = r#"[
            {"id": "1", "text": "first", "createdAt": "2024-01-01T00:00:00Z"},
            {"id": "1", "text": "second", "createdAt": "2024-01-01T00:00:00Z"}
        ]"#;
        kv.set("savedQuotes", blob.to_string()).await.unwrap();
        let store = QuoteStore::open(kv.clone(), "savedQuotes", layout())
            .await
            .unwrap();
        assert_eq!(store.favorites().len(), 1);
        assert_eq!(store.favorites()[0].text, "first");
        assert!(kv.get(&backup_key("savedQuotes")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn category_filter_and_search() {
        let (_, mut store) = open_memory().await;
        store
            .save(
                QuoteFields::new("We are most alive when we're in love.")
                    .author("John Updike")
                    .category("love"),
            )
            .unwrap();
        store
            .save(
                QuoteFields::new("Life is what happens when you're busy making other plans.")
                    .author("John Lennon")
                    .category("life"),
            )
            .unwrap();

        let love = store.favorites_by_category("LOVE");
        assert_eq!(love.len(), 1);
        assert_eq!(love[0].author.as_deref(), Some("John Updike"));

        let found = store.search_favorites("plans");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].author.as_deref(), Some("John Lennon"));
    }
}
