//! Core value types for the quoteshot application.
//!
//! Geometry, categories, the field bundle used to create records, and the
//! CLI command set.
use std::{fmt, path::PathBuf, str::FromStr};

use clap::{Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::QuoteError;

/// A specialized Result type for quoteshot operations.
pub type Result<T> = std::result::Result<T, QuoteError>;

/// Quote topics understood by the quote sources and the bundled fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Inspirational,
    Motivational,
    Life,
    Success,
    Funny,
    Love,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Inspirational,
        Category::Motivational,
        Category::Life,
        Category::Success,
        Category::Funny,
        Category::Love,
    ];

    /// The tag sent to quote APIs and stored on records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Inspirational => "inspirational",
            Category::Motivational => "motivational",
            Category::Life => "life",
            Category::Success => "success",
            Category::Funny => "funny",
            Category::Love => "love",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| QuoteError::InvalidCategory {
                name: s.to_string(),
            })
    }
}

/// Top-left offset of the overlay, in image tile coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a laid-out box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Cumulative pointer movement since the drag started.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureDelta {
    pub dx: f64,
    pub dy: f64,
}

impl GestureDelta {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// The image tile and the overlay text box drawn on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub container: Size,
    pub text: Size,
}

impl Layout {
    pub fn new(container: Size, text: Size) -> Self {
        Self { container, text }
    }

    /// Position that centers the text box on the tile.
    pub fn centered(&self) -> Position {
        Position {
            x: self.container.width / 2.0 - self.text.width / 2.0,
            y: self.container.height / 2.0 - self.text.height / 2.0,
        }
    }
}

/// Caller-supplied fields for a new draft or favorite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteFields {
    pub text: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub background_image: Option<String>,
    pub custom_image: Option<String>,
    pub text_position: Option<Position>,
}

impl QuoteFields {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn background_image(mut self, uri: impl Into<String>) -> Self {
        self.background_image = Some(uri.into());
        self
    }

    pub fn text_position(mut self, position: Position) -> Self {
        self.text_position = Some(position);
        self
    }
}

/// Available subcommands for the quoteshot application
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a quote and a background, then show the composed draft
    Generate {
        /// Quote category
        #[clap(short = 'C', long, value_enum, default_value_t = Category::Inspirational)]
        category: Category,

        /// Save the generated quote to favorites
        #[clap(short, long)]
        save: bool,

        /// Horizontal drag applied to the overlay before saving
        #[clap(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dx: f64,

        /// Vertical drag applied to the overlay before saving
        #[clap(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dy: f64,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Save a hand-written quote to favorites
    Add {
        /// Quote text
        #[clap(short, long)]
        text: String,

        /// Quote author
        #[clap(short, long)]
        author: Option<String>,

        /// Quote category
        #[clap(short = 'C', long, value_enum)]
        category: Option<Category>,

        /// Background image URL or file URI
        #[clap(short, long)]
        image: Option<String>,
    },

    /// List favorites with optional filtering
    List {
        /// Filter favorites by category
        #[clap(short = 'C', long, value_enum)]
        category: Option<Category>,

        /// Fuzzy search over text and author
        #[clap(short, long)]
        search: Option<String>,

        /// Limit the number of quotes returned
        #[clap(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Delete a favorite by ID
    Delete {
        /// ID of the quote to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Capture a favorite and write it to the gallery album
    Export {
        /// ID of the quote to export
        id: String,

        /// Album name (default uses config setting)
        #[clap(short, long)]
        album: Option<String>,
    },

    /// List the supported categories
    Categories,

    /// Configuration management
    Config {
        /// Show the configuration (the default when nothing is written)
        #[clap(short = 'S', long)]
        show: bool,

        /// Write the default configuration and show it
        #[clap(short, long)]
        reset: bool,

        /// Write the current configuration to this path
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}
