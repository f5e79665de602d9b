//! Core types and shared functionality for availcal.
//!
//! This crate provides:
//! - Availability data model
//! - Visible date window arithmetic
//! - Bounded, expiring request cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod dates;
pub mod error;
pub mod model;

pub use cache::{CacheKey, RequestCache};
pub use config::{ConfigError, WidgetConfig};
pub use dates::DateRange;
pub use error::Error;
pub use model::{DayRecord, DayRecords};
