//! Quote image generation library
//!
//! This library provides functionality for fetching quotes and background
//! photos, positioning the quote text on the image, and keeping a
//! persisted list of favorite compositions.

mod capture;
mod cli;
mod config;
mod errors;
mod fallback;
mod fetcher;
mod generator;
mod helper;
mod kv_store;
mod persist_writer;
mod position;
mod quote;
mod storage;
mod types;

// Re-export key components
pub use capture::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use fallback::*;
pub use fetcher::*;
pub use generator::*;
pub use helper::*;
pub use kv_store::*;
pub use persist_writer::*;
pub use position::*;
pub use quote::QuoteRecord;
pub use storage::*;
pub use types::*;
