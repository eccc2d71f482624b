//! Bubble Core — series types, scoring, and upstream data providers.
//!
//! This crate contains the computation side of the bubble index:
//! - The four tracked series and their raw observations
//! - Linear, clamped normalization onto a 0–100 sub-score
//! - Weighted composite score and severity band classification
//! - Finnhub and FRED providers behind the `SeriesSource` trait
//! - Acquisition with placeholder fallback

pub mod data;
pub mod scoring;
pub mod series;

pub use scoring::{compose, Band, CompositeIndex, ComposeError, ScoringConfig, SubScore};
pub use series::{RawObservation, SeriesId};
