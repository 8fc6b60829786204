//! # Insight Service
//!
//! The two fail-soft call sites.
//!
//! ```text
//! request ──► online? ── no ──────────────────────► offline message
//!               │ yes
//!               ▼
//!            generator.generate(prompt)
//!               ├── Ok(text) ─────────────────────► text
//!               ├── Err(RemoteUnreachable) ───────► offline message
//!               └── Err(anything else) ───────────► fallback message
//! ```

use chrono::NaiveDate;
use frigo_core::reports::RouteStop;
use frigo_core::{Coordinates, Dataset};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::InsightsConfig;
use crate::error::InsightError;
use crate::gemini::GeminiTextGenerator;
use crate::generator::{DisabledGenerator, TextGenerator};
use crate::position::{NoPosition, PositionProvider};
use crate::prompts::{inventory_prompt, route_prompt};

pub const INSIGHT_OFFLINE_MESSAGE: &str =
    "Note: you are offline. AI analysis needs an internet connection to process your current data.";
pub const INSIGHT_FALLBACK_MESSAGE: &str = "The analysis could not be generated right now.";
pub const ROUTE_OFFLINE_MESSAGE: &str = "Offline mode: AI route optimization is unavailable without a connection. Follow alphabetical or manual address order.";
pub const ROUTE_FALLBACK_MESSAGE: &str =
    "Standard sequential route recommended. Start manual point-to-point navigation.";

/// Inventory briefings and route narratives that never fail.
#[derive(Clone)]
pub struct InsightService {
    generator: Arc<dyn TextGenerator>,
    position: Arc<dyn PositionProvider>,
    online: Arc<AtomicBool>,
}

impl InsightService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        InsightService {
            generator,
            position: Arc::new(NoPosition),
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Gemini when an API key is configured, a disabled generator otherwise.
    pub fn from_config(config: &InsightsConfig) -> Self {
        let generator: Arc<dyn TextGenerator> = match GeminiTextGenerator::new(config) {
            Ok(gemini) => Arc::new(gemini),
            Err(e) => {
                debug!(error = %e, "Insights disabled");
                Arc::new(DisabledGenerator)
            }
        };
        Self::new(generator)
    }

    pub fn with_position(mut self, position: Arc<dyn PositionProvider>) -> Self {
        self.position = position;
        self
    }

    /// Tells the service whether the device currently has a connection.
    /// Clones share the flag.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Briefing on expiring batches, low stock and a sales suggestion.
    pub async fn inventory_insight(&self, data: &Dataset, today: NaiveDate) -> String {
        if !self.is_online() {
            return INSIGHT_OFFLINE_MESSAGE.to_string();
        }

        let prompt = inventory_prompt(data, today);
        self.fail_soft("inventory", &prompt, INSIGHT_OFFLINE_MESSAGE, INSIGHT_FALLBACK_MESSAGE)
            .await
    }

    /// Driver's narrative for an ordered list of stops, starting from
    /// `origin` or the distribution centre.
    pub async fn route_narrative(&self, stops: &[RouteStop], origin: Option<Coordinates>) -> String {
        if !self.is_online() {
            return ROUTE_OFFLINE_MESSAGE.to_string();
        }

        let prompt = route_prompt(stops, origin);
        self.fail_soft("route", &prompt, ROUTE_OFFLINE_MESSAGE, ROUTE_FALLBACK_MESSAGE)
            .await
    }

    /// Like [`Self::route_narrative`], starting from wherever the position
    /// provider says the device is.
    pub async fn route_narrative_from_here(&self, stops: &[RouteStop]) -> String {
        let origin = self.position.current_position().await;
        self.route_narrative(stops, origin).await
    }

    async fn fail_soft(&self, call: &str, prompt: &str, offline: &str, fallback: &str) -> String {
        match self.generator.generate(prompt).await {
            Ok(text) => text,
            Err(e) if e.is_offline() => {
                debug!(call, error = %e, "Text generator unreachable");
                offline.to_string()
            }
            Err(InsightError::NotConfigured(reason)) => {
                debug!(call, %reason, "Text generator not configured");
                fallback.to_string()
            }
            Err(e) => {
                warn!(call, error = %e, "Text generation failed");
                fallback.to_string()
            }
        }
    }
}
