//! Provider adapter implementations.
//!
//! Thin request/response boundaries over the external services; every
//! adapter implements one of the traits in [`crate::traits`] and nothing
//! else leaks out.

pub mod apify;
pub mod apollo;
pub mod openai;

pub use apify::ApifyScraper;
pub use apollo::{ApolloEnricher, ApolloSearcher};
pub use openai::OpenAiModel;
