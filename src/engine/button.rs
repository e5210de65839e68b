//! Per-button state machine
//!
//! Tracks the on/off boolean and the cyclic keytime position for one
//! physical footswitch, and arbitrates between the message families:
//! CC-class buttons carry a persistent boolean, PC-family and note buttons
//! fire as edges. Inputs are pre-validated by the config layer; nothing in
//! here can fail.

use crate::config::{ButtonConfig, ButtonMode, MessageType};
use crate::engine::resolver::{self, ResolvedAction, ResolvedSpec};

/// Mutable per-button runtime state
#[derive(Debug, Clone)]
pub struct ButtonState {
    on: bool,
    /// 1-indexed keytime position, always in [1, keytimes]
    current_keytime: u8,
}

impl Default for ButtonState {
    fn default() -> Self {
        Self { on: false, current_keytime: 1 }
    }
}

/// What a press resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct Press {
    pub spec: ResolvedSpec,
    pub kind: PressKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    /// CC-class state change; emit the on/off value and update visuals
    Switched { on: bool },
    /// Edge fire (PC family, note); no persisted boolean meaning
    Triggered,
}

/// A release that produced output (momentary CC or note)
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub spec: ResolvedSpec,
}

impl ButtonState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn current_keytime(&self) -> u8 {
        self.current_keytime
    }

    /// Handle a press edge.
    ///
    /// Advances the keytime cycle first (all message families advance),
    /// then resolves the spec at the new position and applies the
    /// mode/type arbitration.
    pub fn on_press(&mut self, config: &ButtonConfig) -> Press {
        let keytimes = config.keytimes();
        if keytimes > 1 {
            self.current_keytime = (self.current_keytime % keytimes) + 1;
        } else {
            self.current_keytime = 1;
        }

        let spec = resolver::resolve(config, self.current_keytime);
        let kind = match spec.action {
            ResolvedAction::Cc { .. } => {
                if config.mode == ButtonMode::Momentary || keytimes > 1 {
                    // Every keytime-advancing press is a distinct
                    // activation, so multi-state toggles force on
                    self.on = true;
                } else {
                    self.on = !self.on;
                }
                PressKind::Switched { on: self.on }
            }
            ResolvedAction::Note { .. } => {
                if config.mode == ButtonMode::Momentary {
                    self.on = true;
                }
                PressKind::Triggered
            }
            // PC family: trigger only, boolean untouched
            _ => PressKind::Triggered,
        };

        Press { spec, kind }
    }

    /// Handle a release edge.
    ///
    /// Only momentary CC and note buttons produce output on release;
    /// everything else is silent. The keytime never changes here.
    pub fn on_release(&mut self, config: &ButtonConfig) -> Option<Release> {
        if config.mode != ButtonMode::Momentary {
            return None;
        }

        let spec = resolver::resolve(config, self.current_keytime);
        match spec.action {
            ResolvedAction::Cc { .. } | ResolvedAction::Note { .. } => {
                self.on = false;
                Some(Release { spec })
            }
            _ => None,
        }
    }

    /// Host override of the boolean state (incoming CC value).
    ///
    /// Only CC-class buttons have a boolean the host can see; PC-family
    /// and note buttons ignore the override. The keytime is untouched.
    pub fn on_host_override(&mut self, config: &ButtonConfig, value: u8) -> Option<bool> {
        match config.message_type {
            MessageType::Cc => {
                self.on = value > 63;
                Some(self.on)
            }
            _ => None,
        }
    }

    /// Force the machine back to keytime 1, off (config reload path)
    pub fn reset_keytime(&mut self) {
        self.current_keytime = 1;
        self.on = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ButtonConfig;
    use proptest::prelude::*;

    fn button(json: &str) -> ButtonConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_toggle_flips_state() {
        let config = button(r#"{ "mode": "toggle", "cc": 20 }"#);
        let mut state = ButtonState::new();

        let press = state.on_press(&config);
        assert_eq!(press.kind, PressKind::Switched { on: true });

        let press = state.on_press(&config);
        assert_eq!(press.kind, PressKind::Switched { on: false });
        assert!(!state.is_on());
    }

    #[test]
    fn test_toggle_release_is_silent() {
        let config = button(r#"{ "mode": "toggle", "cc": 20 }"#);
        let mut state = ButtonState::new();
        state.on_press(&config);
        assert_eq!(state.on_release(&config), None);
        assert!(state.is_on());
    }

    #[test]
    fn test_momentary_press_release() {
        let config = button(r#"{ "mode": "momentary", "cc": 20 }"#);
        let mut state = ButtonState::new();

        let press = state.on_press(&config);
        assert_eq!(press.kind, PressKind::Switched { on: true });

        let release = state.on_release(&config).unwrap();
        assert!(matches!(release.spec.action, ResolvedAction::Cc { .. }));
        assert!(!state.is_on());
    }

    #[test]
    fn test_keytime_advances_cyclically() {
        let config = button(r#"{ "keytimes": 3, "cc": 20 }"#);
        let mut state = ButtonState::new();
        assert_eq!(state.current_keytime(), 1);

        let keytimes: Vec<u8> = (0..5)
            .map(|_| {
                state.on_press(&config);
                state.current_keytime()
            })
            .collect();
        assert_eq!(keytimes, vec![2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_multi_keytime_toggle_forces_on() {
        let config = button(r#"{ "mode": "toggle", "keytimes": 2, "cc": 20 }"#);
        let mut state = ButtonState::new();

        for _ in 0..4 {
            let press = state.on_press(&config);
            assert_eq!(press.kind, PressKind::Switched { on: true });
        }
    }

    #[test]
    fn test_pc_press_triggers_and_advances_keytime() {
        let config = button(r#"{ "type": "pc", "keytimes": 2, "program": 7 }"#);
        let mut state = ButtonState::new();

        let press = state.on_press(&config);
        assert_eq!(press.kind, PressKind::Triggered);
        assert_eq!(state.current_keytime(), 2);
        assert!(!state.is_on());

        // PC buttons never emit on release
        assert_eq!(state.on_release(&config), None);
    }

    #[test]
    fn test_note_momentary_releases() {
        let config = button(r#"{ "type": "note", "mode": "momentary", "note": 36 }"#);
        let mut state = ButtonState::new();

        let press = state.on_press(&config);
        assert_eq!(press.kind, PressKind::Triggered);
        assert!(state.is_on());

        let release = state.on_release(&config).unwrap();
        assert!(matches!(release.spec.action, ResolvedAction::Note { .. }));
        assert!(!state.is_on());
    }

    #[test]
    fn test_note_toggle_never_releases() {
        let config = button(r#"{ "type": "note", "mode": "toggle" }"#);
        let mut state = ButtonState::new();
        state.on_press(&config);
        assert_eq!(state.on_release(&config), None);
    }

    #[test]
    fn test_host_override_threshold() {
        let config = button(r#"{ "cc": 20 }"#);
        let mut state = ButtonState::new();

        assert_eq!(state.on_host_override(&config, 63), Some(false));
        assert_eq!(state.on_host_override(&config, 64), Some(true));
        assert!(state.is_on());
    }

    #[test]
    fn test_host_override_ignored_for_triggers() {
        let mut state = ButtonState::new();
        assert_eq!(state.on_host_override(&button(r#"{ "type": "pc" }"#), 127), None);
        assert_eq!(state.on_host_override(&button(r#"{ "type": "note" }"#), 127), None);
        assert!(!state.is_on());
    }

    #[test]
    fn test_host_override_keeps_keytime() {
        let config = button(r#"{ "cc": 20, "keytimes": 4 }"#);
        let mut state = ButtonState::new();
        state.on_press(&config);
        state.on_press(&config);
        assert_eq!(state.current_keytime(), 3);

        state.on_host_override(&config, 0);
        assert_eq!(state.current_keytime(), 3);
    }

    #[test]
    fn test_reset_keytime() {
        let config = button(r#"{ "cc": 20, "keytimes": 5 }"#);
        let mut state = ButtonState::new();
        state.on_press(&config);
        state.on_press(&config);

        state.reset_keytime();
        assert_eq!(state.current_keytime(), 1);
        assert!(!state.is_on());
    }

    proptest! {
        // For any keytime count and press count, the position is the
        // initial position advanced N times around the cycle.
        #[test]
        fn prop_keytime_cycle(keytimes in 1u32..=99, presses in 0usize..300) {
            let mut config = ButtonConfig::default();
            config.keytimes = keytimes;

            let mut state = ButtonState::new();
            for _ in 0..presses {
                state.on_press(&config);
            }

            // Starting at 1, N presses land on ((N mod keytimes) + 1)
            let expected = (presses as u32 % keytimes) + 1;
            prop_assert_eq!(u32::from(state.current_keytime()), expected);
        }
    }
}
