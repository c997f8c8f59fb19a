//! CLI module for the quoteshot application
//!
//! This module handles the command-line interface for generating quotes and
//! managing the favorites store.
use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
};

use log::{debug, info};

use crate::{
    default_config_path, save_to_device, text_preview, Category, Commands, Composition, Config,
    DescriptorCapture, DirectoryGallery, Generated, Generator, GestureDelta, PositionTracker,
    QuoteError, QuoteFields, QuoteRecord, QuoteStore, Result,
};

/// CLI Application handler - processes CLI commands against a QuoteStore
pub struct App {
    /// The quote store
    store: QuoteStore,

    /// Application configuration
    config: Config,

    /// Config file given on the command line, if any
    config_path: Option<PathBuf>,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given store and config
    pub fn new(
        store: QuoteStore,
        config: Config,
        config_path: Option<PathBuf>,
        verbose: bool,
    ) -> Self {
        Self {
            store,
            config,
            config_path,
            verbose,
        }
    }

    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    /// Run the CLI application with the given command
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Generate {
                category,
                save,
                dx,
                dy,
                json,
            } => self.handle_generate(category, save, GestureDelta::new(dx, dy), json).await?,

            Commands::Add {
                text,
                author,
                category,
                image,
            } => self.handle_add(text, author, category, image)?,

            Commands::List {
                category,
                search,
                limit,
                json,
            } => self.handle_list(category, search, limit, json)?,

            Commands::Delete { id, force } => self.handle_delete(id, force)?,

            Commands::Export { id, album } => self.handle_export(id, album).await?,

            Commands::Categories => {
                for category in Category::ALL {
                    println!("{}", category);
                }
            }

            Commands::Config {
                show,
                reset,
                output,
            } => self.handle_config(show, reset, output)?,
        }

        Ok(())
    }

    /// Waits for pending writes and stops the store.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.store.shutdown().await
    }

    async fn handle_generate(
        &mut self,
        category: Category,
        save: bool,
        drag: GestureDelta,
        json: bool,
    ) -> Result<()> {
        let generator = Generator::from_config(&self.config)?;
        let generated = generator.fetch(category).await.into_draft(&mut self.store);

        // a non-zero drag is replayed as one gesture so the result is clamped
        if drag != GestureDelta::default() {
            if let Some(mut tracker) =
                PositionTracker::for_draft(&self.store, &generated.draft_id, self.config.text_box)
            {
                tracker.begin_drag();
                tracker.drag_move(drag);
                let position = tracker.end_drag(&mut self.store);
                debug!("Overlay placed at ({}, {})", position.x, position.y);
            }
        }

        let saved_id = if save {
            self.store.save_draft(&generated.draft_id)?
        } else {
            None
        };

        let draft = self
            .store
            .draft(&generated.draft_id)
            .cloned()
            .ok_or_else(|| QuoteError::QuoteNotFound {
                id: generated.draft_id.clone(),
            })?;

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "quote": draft,
                    "notice": generated.notice,
                    "savedId": saved_id,
                }))?
            );
        } else {
            self.display_generated(&generated, &draft);
            match (save, saved_id) {
                (true, Some(id)) => println!("\nSaved to favorites with ID: {}", id),
                (true, None) => println!("\nAlready in favorites."),
                _ => {}
            }
        }

        Ok(())
    }

    fn display_generated(&self, generated: &Generated, draft: &QuoteRecord) {
        if let Some(notice) = &generated.notice {
            println!("{}", console::style(notice).red());
        }
        println!("\"{}\"", console::style(&generated.text).bold());
        println!("  - {}", console::style(&generated.author).cyan());
        println!("Category:   {}", generated.category);
        println!("Background: {}", generated.background_image);
        if let Some(p) = draft.text_position {
            println!("Position:   ({:.0}, {:.0})", p.x, p.y);
        }
    }

    fn handle_add(
        &mut self,
        text: String,
        author: Option<String>,
        category: Option<Category>,
        image: Option<String>,
    ) -> Result<()> {
        let fields = QuoteFields {
            text,
            author: author.filter(|a| !a.trim().is_empty()),
            category: category.map(|c| c.to_string()),
            background_image: image,
            ..Default::default()
        };

        match self.store.save(fields)? {
            Some(id) => println!("Quote saved with ID: {}", id),
            None => println!("That quote is already in your favorites."),
        }
        Ok(())
    }

    fn handle_list(
        &self,
        category: Option<Category>,
        search: Option<String>,
        limit: usize,
        json: bool,
    ) -> Result<()> {
        let mut quotes: Vec<QuoteRecord> = match (category, search) {
            (Some(category), Some(query)) => self
                .store
                .search_favorites(&query)
                .into_iter()
                .filter(|q| q.category.as_deref() == Some(category.as_str()))
                .collect(),
            (Some(category), None) => self.store.favorites_by_category(category.as_str()),
            (None, Some(query)) => self.store.search_favorites(&query),
            (None, None) => {
                let mut all = self.store.favorites().to_vec();
                all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                all
            }
        };

        quotes.truncate(limit);

        if json {
            println!("{}", serde_json::to_string_pretty(&quotes)?);
            return Ok(());
        }

        if quotes.is_empty() {
            println!("No saved quotes yet. Generate or create a quote and save it to see it here.");
            return Ok(());
        }

        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, quote) in quotes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }
            println!(
                "ID: {} | Saved: {}",
                quote.id,
                quote.created_at.format("%Y-%m-%d %H:%M")
            );
            let preview_len = if self.verbose {
                usize::MAX
            } else {
                term_width.saturating_sub(4).max(20)
            };
            println!("\"{}\"", console::style(text_preview(&quote.text, preview_len)).bold());
            if let Some(author) = &quote.author {
                println!("  - {}", console::style(author).cyan());
            }
            if let Some(category) = &quote.category {
                println!("#{}", category);
            }
        }

        println!(
            "\nFound {} quote{}",
            quotes.len(),
            if quotes.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    fn handle_delete(&mut self, id: String, force: bool) -> Result<()> {
        let quote = match self.store.favorite(&id) {
            Some(quote) => quote.clone(),
            None => return Err(QuoteError::QuoteNotFound { id }),
        };

        if !force {
            println!("You are about to delete the following quote:");
            println!("ID:      {}", quote.id);
            println!("Quote:   {}", text_preview(&quote.text, 60));
            println!("Author:  {}", quote.author.as_deref().unwrap_or("-"));
            println!("Saved:   {}", quote.created_at.format("%Y-%m-%d %H:%M:%S"));

            print!("\nAre you sure you want to delete this quote? [y/N]: ");
            stdout().flush().map_err(QuoteError::Io)?;

            let mut input = String::new();
            stdin().read_line(&mut input).map_err(QuoteError::Io)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.store.delete(&id);
        println!("Quote {} has been deleted.", id);
        Ok(())
    }

    async fn handle_export(&self, id: String, album: Option<String>) -> Result<()> {
        let quote = self
            .store
            .favorite(&id)
            .ok_or_else(|| QuoteError::QuoteNotFound { id: id.clone() })?;

        let composition = Composition::from_record(quote, self.config.tile);
        let capture = DescriptorCapture::new(self.config.data_dir.join("captures"));
        let gallery = DirectoryGallery::new(&self.config.gallery_dir);
        let album = album.unwrap_or_else(|| self.config.album_name.clone());

        let path = save_to_device(&capture, &gallery, &composition, &album).await?;
        println!("Quote exported to {}", path.display());
        Ok(())
    }

    fn handle_config(&self, show: bool, reset: bool, output: Option<PathBuf>) -> Result<()> {
        let plan = ConfigPlan::new(show, reset, output);
        let config = if plan.reset {
            Config::default()
        } else {
            self.config.clone()
        };

        if let Some(path) = &plan.write_to {
            let path = path
                .clone()
                .or_else(|| self.config_path.clone())
                .unwrap_or_else(default_config_path);
            config.save(&path)?;
            if plan.reset {
                info!("Configuration reset at {}", path.display());
                println!("Configuration reset to defaults at {}", path.display());
            } else {
                println!("Configuration written to {}", path.display());
            }
        }

        if plan.show {
            let mut shown = config;
            if shown.image_api_key.is_some() {
                shown.image_api_key = Some("********".to_string());
            }
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        Ok(())
    }
}

/// What `config` does for a set of flags.
///
/// Nothing is written unless `--reset` or `--output` asks for it, and a
/// reset always shows the configuration it wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ConfigPlan {
    /// `Some(None)` writes to the active config path
    write_to: Option<Option<PathBuf>>,
    reset: bool,
    show: bool,
}

impl ConfigPlan {
    fn new(show: bool, reset: bool, output: Option<PathBuf>) -> Self {
        let writes = reset || output.is_some();
        Self {
            write_to: writes.then_some(output),
            reset,
            show: show || reset || !writes,
        }
    }
}
