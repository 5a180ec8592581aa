//! Data ingestion module - functional pipeline for air-quality readings

pub mod collect;
pub mod config;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod parse;
pub mod types;
pub mod utils;
pub mod write;

pub use types::*;
