//! Declarative config-to-message resolution
//!
//! Maps (button config, active keytime) to a fully resolved message spec.
//! Every field follows the fallback chain override -> base config -> type
//! default, so a per-keytime override may change any subset of fields --
//! including the message type itself (mixed-type cycling).

use crate::colors::{self, Rgb};
use crate::config::{ButtonConfig, MessageType, StateOverride};

// Type defaults, applied when neither override nor base carry a field
const DEFAULT_CC: u8 = 20;
const DEFAULT_CC_ON: u8 = 127;
const DEFAULT_CC_OFF: u8 = 0;
const DEFAULT_PROGRAM: u8 = 0;
const DEFAULT_PC_STEP: u8 = 1;
const DEFAULT_NOTE: u8 = 60;
const DEFAULT_VELOCITY_ON: u8 = 127;
const DEFAULT_VELOCITY_OFF: u8 = 0;

/// Message content for one keytime position, with all defaults applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedAction {
    Cc { cc: u8, cc_on: u8, cc_off: u8 },
    Pc { program: u8 },
    PcInc { step: u8 },
    PcDec { step: u8 },
    Note { note: u8, velocity_on: u8, velocity_off: u8 },
}

impl ResolvedAction {
    pub fn message_type(&self) -> MessageType {
        match self {
            ResolvedAction::Cc { .. } => MessageType::Cc,
            ResolvedAction::Pc { .. } => MessageType::Pc,
            ResolvedAction::PcInc { .. } => MessageType::PcInc,
            ResolvedAction::PcDec { .. } => MessageType::PcDec,
            ResolvedAction::Note { .. } => MessageType::Note,
        }
    }
}

/// Fully resolved outbound spec for a button at a given keytime
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpec {
    pub action: ResolvedAction,
    /// Active-state color (off-state treatment is applied by the engine)
    pub color: Rgb,
    /// Label override chain; the engine falls back to the button number
    pub label: Option<String>,
}

/// Resolve the outbound spec for `config` at 1-indexed `keytime_index`.
///
/// Pure and deterministic. Out-of-range indices (including positions the
/// `states` array does not cover) fall back to the base config.
pub fn resolve(config: &ButtonConfig, keytime_index: u8) -> ResolvedSpec {
    let over: Option<&StateOverride> = if config.keytimes() > 1 {
        let index = keytime_index as usize;
        if index >= 1 && index <= config.states.len() {
            config.states.get(index - 1)
        } else {
            None
        }
    } else {
        None
    };

    let active_type = over
        .and_then(|s| s.message_type)
        .unwrap_or(config.message_type);

    let pick = |from_over: Option<u8>, from_base: Option<u8>, default: u8| {
        from_over.or(from_base).unwrap_or(default)
    };

    let action = match active_type {
        MessageType::Cc => ResolvedAction::Cc {
            cc: pick(over.and_then(|s| s.cc), config.cc, DEFAULT_CC),
            cc_on: pick(over.and_then(|s| s.cc_on), config.cc_on, DEFAULT_CC_ON),
            cc_off: pick(over.and_then(|s| s.cc_off), config.cc_off, DEFAULT_CC_OFF),
        },
        MessageType::Pc => ResolvedAction::Pc {
            program: pick(over.and_then(|s| s.program), config.program, DEFAULT_PROGRAM),
        },
        MessageType::PcInc => ResolvedAction::PcInc {
            step: pick(over.and_then(|s| s.pc_step), config.pc_step, DEFAULT_PC_STEP),
        },
        MessageType::PcDec => ResolvedAction::PcDec {
            step: pick(over.and_then(|s| s.pc_step), config.pc_step, DEFAULT_PC_STEP),
        },
        MessageType::Note => ResolvedAction::Note {
            note: pick(over.and_then(|s| s.note), config.note, DEFAULT_NOTE),
            velocity_on: pick(
                over.and_then(|s| s.velocity_on),
                config.velocity_on,
                DEFAULT_VELOCITY_ON,
            ),
            velocity_off: pick(
                over.and_then(|s| s.velocity_off),
                config.velocity_off,
                DEFAULT_VELOCITY_OFF,
            ),
        },
    };

    // Color and label chains are independent of type resolution: an
    // override may change only the color while inheriting the base type.
    let color_name = over
        .and_then(|s| s.color.as_deref())
        .or(config.color.as_deref())
        .unwrap_or("white");

    let label = over
        .and_then(|s| s.label.clone())
        .or_else(|| config.label.clone());

    ResolvedSpec {
        action,
        color: colors::by_name(color_name),
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::by_name;

    fn keytime_button() -> ButtonConfig {
        serde_json::from_str(
            r#"{
                "type": "cc",
                "cc": 20,
                "cc_off": 0,
                "keytimes": 3,
                "states": [
                    { "cc_on": 64, "color": "blue" },
                    { "cc_on": 96, "color": "cyan" },
                    { "cc_on": 127, "color": "white" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_per_state_field_overrides() {
        let config = keytime_button();

        let first = resolve(&config, 1);
        assert_eq!(first.action, ResolvedAction::Cc { cc: 20, cc_on: 64, cc_off: 0 });
        assert_eq!(first.color, by_name("blue"));

        let second = resolve(&config, 2);
        assert_eq!(second.action, ResolvedAction::Cc { cc: 20, cc_on: 96, cc_off: 0 });
        assert_eq!(second.color, by_name("cyan"));
    }

    #[test]
    fn test_out_of_range_index_falls_back_to_base() {
        let config = keytime_button();
        let spec = resolve(&config, 4);
        assert_eq!(spec.action, ResolvedAction::Cc { cc: 20, cc_on: 127, cc_off: 0 });
        assert_eq!(spec.color, by_name("white"));
    }

    #[test]
    fn test_mixed_type_cycling() {
        let config: ButtonConfig = serde_json::from_str(
            r#"{
                "type": "cc",
                "cc": 20,
                "keytimes": 2,
                "states": [
                    { "cc_on": 127 },
                    { "type": "pc", "program": 5 }
                ]
            }"#,
        )
        .unwrap();

        // Index 2 declares its own type and must yield a PC spec with PC
        // field defaults, not the base CC fields.
        assert_eq!(resolve(&config, 2).action, ResolvedAction::Pc { program: 5 });
        assert_eq!(resolve(&config, 1).action, ResolvedAction::Cc { cc: 20, cc_on: 127, cc_off: 0 });
    }

    #[test]
    fn test_mixed_type_inherits_base_fields_of_new_type() {
        // Base carries a program even though its own type is cc; a pc
        // override without a program falls back to it.
        let config: ButtonConfig = serde_json::from_str(
            r#"{
                "type": "cc",
                "program": 9,
                "keytimes": 2,
                "states": [ {}, { "type": "pc" } ]
            }"#,
        )
        .unwrap();
        assert_eq!(resolve(&config, 2).action, ResolvedAction::Pc { program: 9 });
    }

    #[test]
    fn test_type_defaults() {
        let cc: ButtonConfig = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(
            resolve(&cc, 1).action,
            ResolvedAction::Cc { cc: 20, cc_on: 127, cc_off: 0 }
        );

        let note: ButtonConfig = serde_json::from_str(r#"{ "type": "note" }"#).unwrap();
        assert_eq!(
            resolve(&note, 1).action,
            ResolvedAction::Note { note: 60, velocity_on: 127, velocity_off: 0 }
        );

        let step: ButtonConfig = serde_json::from_str(r#"{ "type": "pc_dec" }"#).unwrap();
        assert_eq!(resolve(&step, 1).action, ResolvedAction::PcDec { step: 1 });
    }

    #[test]
    fn test_unknown_type_resolves_as_cc_defaults() {
        // Unknown names collapse to cc at the config boundary; the
        // resolver then applies the cc defaults.
        let config: ButtonConfig =
            serde_json::from_str(r#"{ "type": "blorp" }"#).unwrap();
        assert_eq!(
            resolve(&config, 1).action,
            ResolvedAction::Cc { cc: 20, cc_on: 127, cc_off: 0 }
        );
    }

    #[test]
    fn test_color_only_override_keeps_base_type() {
        let config: ButtonConfig = serde_json::from_str(
            r#"{
                "type": "note",
                "note": 42,
                "keytimes": 2,
                "states": [ { "color": "red" }, { "color": "green" } ]
            }"#,
        )
        .unwrap();

        let spec = resolve(&config, 2);
        assert_eq!(spec.color, by_name("green"));
        assert_eq!(
            spec.action,
            ResolvedAction::Note { note: 42, velocity_on: 127, velocity_off: 0 }
        );
    }

    #[test]
    fn test_single_keytime_ignores_states() {
        // keytimes == 1 never consults the states array even if present
        let config: ButtonConfig = serde_json::from_str(
            r#"{ "cc": 25, "states": [ { "cc": 99 } ] }"#,
        )
        .unwrap();
        assert_eq!(
            resolve(&config, 1).action,
            ResolvedAction::Cc { cc: 25, cc_on: 127, cc_off: 0 }
        );
    }
}
