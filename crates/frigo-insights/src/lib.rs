//! # frigo-insights: Text-generation Collaborator for FrigoGest
//!
//! Asks a language model for an inventory briefing or a route narrative.
//! Both calls always return text: a canned offline message when there is
//! no connection, a generic fallback when the request fails.
//!
//! ## Module Organization
//! - [`config`] - Environment configuration (API key, model, timeout)
//! - [`error`] - Generator error types
//! - [`gemini`] - Gemini `generateContent` backend
//! - [`generator`] - `TextGenerator` trait, mock and disabled generators
//! - [`position`] - Best-effort current position
//! - [`prompts`] - Prompt builders
//! - [`service`] - Fail-soft `InsightService`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use frigo_insights::{InsightService, InsightsConfig};
//!
//! let insights = InsightService::from_config(&InsightsConfig::from_env());
//! let text = insights.inventory_insight(&dataset, today).await;
//! ```

pub mod config;
pub mod error;
pub mod gemini;
pub mod generator;
pub mod position;
pub mod prompts;
pub mod service;

pub use config::InsightsConfig;
pub use error::{InsightError, InsightResult};
pub use gemini::GeminiTextGenerator;
pub use generator::{DisabledGenerator, MockBehavior, MockTextGenerator, TextGenerator};
pub use position::{FixedPosition, NoPosition, PositionProvider};
pub use service::{
    InsightService, INSIGHT_FALLBACK_MESSAGE, INSIGHT_OFFLINE_MESSAGE, ROUTE_FALLBACK_MESSAGE,
    ROUTE_OFFLINE_MESSAGE,
};
