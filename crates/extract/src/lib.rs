//! `form26as-extract`: tax-credit statement extraction engine.
//!
//! Pure engine crate: receives per-page text and tables from an extraction
//! layer, returns taxpayer metadata plus a deduplicated, numbered list of
//! transactions grouped by reporting entity. No CLI dependencies.

pub mod classify;
pub mod config;
pub mod context;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod metadata;
pub mod model;
pub mod source;
pub mod table;
pub mod text;

pub use config::ExtractConfig;
pub use engine::{parse_document, run};
pub use error::ExtractError;
pub use model::{Page, ParseReport, ParsedStatement, TaxpayerInfo, TransactionRecord};
pub use source::{JsonPageDump, PageSource, TextDump};
