//! Output sinks (MIDI sender, LED/display feedback)
//!
//! The engine stays transport-agnostic: resolved messages and visual
//! descriptors are handed to whatever sinks the binary wires up. Real
//! hardware transports live outside this crate; the console sink covers
//! development and testing.

mod console;

pub use console::ConsoleSink;

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::VisualState;
use crate::midi::OutboundMessage;

/// Consumer of resolved outbound MIDI messages.
///
/// Methods take &self to support Arc<dyn MidiSink>; implementations use
/// interior mutability for their own state.
#[async_trait]
pub trait MidiSink: Send + Sync {
    /// Sink name for logs
    fn name(&self) -> &str;

    /// Deliver one outbound message
    async fn send(&self, message: OutboundMessage) -> Result<()>;
}

/// Consumer of visual-feedback descriptors (LEDs, display boxes)
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Update one button's visual state
    async fn update(&self, visual: VisualState) -> Result<()>;
}
