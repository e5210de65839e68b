//! footctl - input resolution engine for MIDI foot controllers
//!
//! Resolves physical input events (footswitch edges, rotary deltas,
//! expression pedal samples) into outbound MIDI messages and visual
//! feedback descriptors, driven by a declarative JSON configuration.

pub mod cli;
pub mod colors;
pub mod config;
pub mod drivers;
pub mod engine;
pub mod midi;

pub use config::AppConfig;
pub use engine::{Engine, EngineOutput, VisualState};
pub use midi::OutboundMessage;
