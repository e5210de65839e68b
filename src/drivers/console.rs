//! Console sink - logs all outputs for testing and development

use anyhow::Result;
use async_trait::async_trait;
use colored::Colorize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::drivers::{FeedbackSink, MidiSink};
use crate::engine::VisualState;
use crate::midi::{format_hex, OutboundMessage};

/// ConsoleSink logs every message and visual update.
///
/// This is useful for:
/// - Exercising a config without hardware attached
/// - Watching the exact wire bytes the engine resolves
/// - Debugging keytime/override behavior interactively
pub struct ConsoleSink {
    name: String,
    /// Messages delivered so far
    send_count: Arc<RwLock<u64>>,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            send_count: Arc::new(RwLock::new(0)),
        }
    }

    /// Number of messages delivered so far
    pub async fn send_count(&self) -> u64 {
        *self.send_count.read().await
    }
}

#[async_trait]
impl MidiSink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: OutboundMessage) -> Result<()> {
        let mut count = self.send_count.write().await;
        *count += 1;
        let seq = *count;
        drop(count);

        info!(
            "[TX #{:04}] {} | {}",
            seq,
            message.to_string().green(),
            format_hex(&message.encode()).dimmed()
        );
        Ok(())
    }
}

#[async_trait]
impl FeedbackSink for ConsoleSink {
    async fn update(&self, visual: VisualState) -> Result<()> {
        let swatch = "●".truecolor(visual.color.r, visual.color.g, visual.color.b);
        info!(
            "[LED] button {} {} {} (#{:06X})",
            visual.button_index + 1,
            if visual.active { "on " } else { "off" },
            swatch,
            visual.color.to_hex()
        );
        Ok(())
    }
}
