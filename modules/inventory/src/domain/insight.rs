//! Free-text questions about the inventory, answered by a chat-completion backend.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::model::AnalyticsSnapshot;
use super::store::InventoryStore;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Insight assistant is not configured")]
    NotConfigured,

    /// Any failure talking to the upstream service. The message is safe to
    /// show to clients.
    #[error("{0}")]
    Upstream(String),
}

/// Chat-completion backend.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send one system + user message pair and return the assistant reply.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, InsightError>;
}

/// Plain-text rendering of the statistics handed to the assistant.
#[must_use]
pub fn summarize(stats: &AnalyticsSnapshot) -> String {
    let mut out = String::from("Current inventory statistics:\n");
    // writing into a String cannot fail
    let _ = writeln!(out, "- items: {}", stats.total_items);
    let _ = writeln!(out, "- total quantity: {}", stats.total_quantity);
    let _ = writeln!(out, "- total value: {:.2}", stats.total_value);
    let _ = writeln!(out, "- average price: {:.2}", stats.average_price);
    let _ = writeln!(out, "- median price: {:.2}", stats.median_price);
    let _ = writeln!(out, "- price range: {:.2}", stats.price_range);
    let _ = writeln!(
        out,
        "- items above / below average price: {} / {}",
        stats.above_average_count, stats.below_average_count
    );
    if let Some(item) = &stats.lowest_priced_item {
        let _ = writeln!(
            out,
            "- cheapest item: {} ({}) at {:.2}",
            item.code, item.description, item.price
        );
    }
    if let Some(item) = &stats.highest_priced_item {
        let _ = writeln!(
            out,
            "- most expensive item: {} ({}) at {:.2}",
            item.code, item.description, item.price
        );
    }
    out
}

const SYSTEM_PREAMBLE: &str = "You are an assistant for a small stockroom. \
Answer questions about the inventory using only the statistics below. \
Keep answers short.";

pub struct InsightService {
    store: Arc<InventoryStore>,
    client: Option<Arc<dyn ChatCompletion>>,
}

impl InsightService {
    pub fn new(store: Arc<InventoryStore>, client: Option<Arc<dyn ChatCompletion>>) -> Self {
        Self { store, client }
    }

    /// Ask `prompt` against the current statistics. Never modifies the store.
    ///
    /// # Errors
    /// [`InsightError::NotConfigured`] without a backend, otherwise whatever
    /// the backend reports.
    #[instrument(skip_all, fields(prompt_len = prompt.len()))]
    pub async fn ask(&self, prompt: &str) -> Result<String, InsightError> {
        let Some(client) = &self.client else {
            return Err(InsightError::NotConfigured);
        };

        let system = format!("{SYSTEM_PREAMBLE}\n\n{}", summarize(&self.store.statistics()));
        match client.complete(&system, prompt).await {
            Ok(reply) => {
                info!(reply_len = reply.len(), "Insight answered");
                Ok(reply)
            }
            Err(e) => {
                warn!(error = %e, "Insight request failed");
                Err(e)
            }
        }
    }
}
