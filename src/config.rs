//! Configuration management for footctl
//!
//! Handles loading, validating, and hot-reloading of JSON configuration
//! files. Validation clamps numeric fields into protocol range and fills
//! per-button defaults so the engine can assume well-formed input.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::warn;

pub mod watcher;

/// Buttons on the default (std10) device profile
const DEFAULT_BUTTON_COUNT: usize = 10;

/// Errors from loading a configuration file.
///
/// Content problems (out-of-range numbers, unknown message types) are never
/// errors; they are clamped or defaulted during validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Device profile name ("std10", "mini6"); selects the button count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Global MIDI channel (0-15), used by buttons without their own
    #[serde(default)]
    pub channel: u8,
    #[serde(default)]
    pub buttons: Vec<ButtonConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoder: Option<EncoderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExpressionConfig>,
}

/// Button activation mode
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ButtonMode {
    #[default]
    Toggle,
    Momentary,
}

/// Visual treatment of an inactive button
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OffMode {
    #[default]
    Dim,
    Off,
}

/// Outbound message family a button produces.
///
/// Unknown type names deserialize to `Cc` so a hand-edited config never
/// hard-fails; the CC defaults then apply.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(from = "String", rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Cc,
    Pc,
    PcInc,
    PcDec,
    Note,
}

impl From<String> for MessageType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "cc" => MessageType::Cc,
            "pc" => MessageType::Pc,
            "pc_inc" => MessageType::PcInc,
            "pc_dec" => MessageType::PcDec,
            "note" => MessageType::Note,
            other => {
                warn!("Unknown message type '{}', treating as cc", other);
                MessageType::Cc
            }
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageType::Cc => write!(f, "cc"),
            MessageType::Pc => write!(f, "pc"),
            MessageType::PcInc => write!(f, "pc_inc"),
            MessageType::PcDec => write!(f, "pc_dec"),
            MessageType::Note => write!(f, "note"),
        }
    }
}

/// Per-button configuration.
///
/// Numeric message fields stay `Option` so the resolver can distinguish
/// "absent" from "explicitly set" when walking the override fallback chain.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ButtonConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub mode: ButtonMode,
    #[serde(default)]
    pub off_mode: OffMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    /// Number of cyclic sub-states (clamped to 1-99)
    #[serde(default = "default_keytimes")]
    pub keytimes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_on: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_off: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pc_step: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_on: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_off: Option<u8>,
    /// Per-keytime overrides, one entry per position; missing positions
    /// fall back to the base config
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<StateOverride>,
}

/// Optional per-keytime override of type, color, label, and message fields
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StateOverride {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_on: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_off: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pc_step: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_on: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_off: Option<u8>,
}

/// Rotary encoder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncoderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_encoder_cc")]
    pub cc: u8,
    #[serde(default = "default_encoder_label")]
    pub label: String,
    /// Initial accumulator value (0-127)
    #[serde(default = "default_encoder_initial")]
    pub initial: u8,
    /// When set (> 1), quantize the accumulator into this many output slots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u8>,
    #[serde(default)]
    pub push: EncoderPushConfig,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cc: default_encoder_cc(),
            label: default_encoder_label(),
            initial: default_encoder_initial(),
            steps: None,
            push: EncoderPushConfig::default(),
        }
    }
}

/// Encoder push switch: behaves as a plain CC button
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncoderPushConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_push_cc")]
    pub cc: u8,
    #[serde(default = "default_push_label")]
    pub label: String,
    #[serde(default = "default_push_mode")]
    pub mode: ButtonMode,
}

impl Default for EncoderPushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cc: default_push_cc(),
            label: default_push_label(),
            mode: default_push_mode(),
        }
    }
}

/// Expression pedal pair
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExpressionConfig {
    #[serde(default)]
    pub exp1: Option<ExpressionPedalConfig>,
    #[serde(default)]
    pub exp2: Option<ExpressionPedalConfig>,
}

/// Single expression pedal configuration.
///
/// `min`/`max` are kept wider than the 7-bit protocol range on purpose: a
/// misconfigured range must survive deserialization and is clamped at
/// output time, not rejected.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExpressionPedalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_exp_cc")]
    pub cc: u8,
    #[serde(default = "default_exp_label")]
    pub label: String,
    #[serde(default)]
    pub min: i32,
    #[serde(default = "default_exp_max")]
    pub max: i32,
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default = "default_exp_threshold")]
    pub threshold: u8,
}

impl Default for ExpressionPedalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cc: default_exp_cc(),
            label: default_exp_label(),
            min: 0,
            max: default_exp_max(),
            polarity: Polarity::Normal,
            threshold: default_exp_threshold(),
        }
    }
}

/// Expression pedal polarity
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Normal,
    Reverse,
}

impl ButtonConfig {
    /// Keytime count with the defensive clamp applied on read
    pub fn keytimes(&self) -> u8 {
        self.keytimes.clamp(1, 99) as u8
    }

    /// Button label, defaulting to the 1-indexed button number
    pub fn label_or(&self, index: usize) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| (index + 1).to_string())
    }
}

impl AppConfig {
    /// Load configuration from file
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;

        let mut config: AppConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_string(),
                source,
            })?;
        config.validate();
        Ok(config)
    }

    /// Load configuration, falling back to the built-in defaults when the
    /// file is missing or unparsable (the controller must always come up)
    pub async fn load_or_default(path: &str) -> Self {
        match Self::load(path).await {
            Ok(config) => config,
            Err(e) => {
                warn!("Config load error ({}), using defaults", e);
                Self::default_config()
            }
        }
    }

    /// Built-in default configuration: CC buttons 20..20+n, white, toggle
    pub fn default_config() -> Self {
        let mut config = AppConfig {
            device: None,
            channel: 0,
            buttons: Vec::new(),
            encoder: Some(EncoderConfig::default()),
            expression: Some(ExpressionConfig {
                exp1: Some(ExpressionPedalConfig::default()),
                exp2: Some(ExpressionPedalConfig {
                    cc: 13,
                    label: "EXP2".to_string(),
                    ..ExpressionPedalConfig::default()
                }),
            }),
        };
        config.validate();
        config
    }

    /// Button count for the configured device profile
    pub fn button_count(&self) -> usize {
        match self.device.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("mini6") => 6,
            _ => DEFAULT_BUTTON_COUNT,
        }
    }

    /// Clamp numeric fields and fill per-button defaults in place.
    ///
    /// After this pass the engine can assume: channels in [0,15], keytimes
    /// in [1,99], every button has a concrete cc number and channel.
    pub fn validate(&mut self) {
        self.channel = self.channel.min(15);

        let count = self.button_count();
        while self.buttons.len() < count {
            self.buttons.push(ButtonConfig::default());
        }
        self.buttons.truncate(count);

        let global_channel = self.channel;
        for (index, button) in self.buttons.iter_mut().enumerate() {
            button.keytimes = u32::from(button.keytimes());
            button.cc = Some(button.cc.unwrap_or(20 + index as u8).min(127));
            button.channel = Some(button.channel.unwrap_or(global_channel).min(15));
        }

        if let Some(encoder) = &mut self.encoder {
            encoder.initial = encoder.initial.min(127);
        }
    }
}

// Default value functions
fn default_keytimes() -> u32 { 1 }
fn default_true() -> bool { true }
fn default_encoder_cc() -> u8 { 11 }
fn default_encoder_label() -> String { "ENC".to_string() }
fn default_encoder_initial() -> u8 { 64 }
fn default_push_cc() -> u8 { 14 }
fn default_push_label() -> String { "PUSH".to_string() }
fn default_push_mode() -> ButtonMode { ButtonMode::Momentary }
fn default_exp_cc() -> u8 { 12 }
fn default_exp_label() -> String { "EXP1".to_string() }
fn default_exp_max() -> i32 { 127 }
fn default_exp_threshold() -> u8 { 2 }
