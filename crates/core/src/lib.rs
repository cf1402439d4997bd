//! Core shared types and errors (renderer-agnostic).

pub mod config;
pub mod error;

pub use config::{AssetConfig, OBJ_DIR_ENV};
pub use error::{LoadError, LoadResult, ParseError, ParseErrorKind};
