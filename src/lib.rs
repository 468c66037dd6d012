//! Building foot-traffic and access-control analytics.
//!
//! Visit and badge exports are loaded by [`readers`], reshaped into
//! chart-ready aggregations and vibrancy scores by [`analyzers`], checked by
//! [`processors`] and written out by [`writers`].

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod utils;
pub mod writers;

pub use error::{AnalyticsError, Result};
