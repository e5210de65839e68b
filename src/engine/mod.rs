//! Input resolution engine
//!
//! Owns all mutable runtime state (button arena, encoder, expression
//! channels) and resolves physical input events into outbound MIDI
//! messages and visual-feedback descriptors. Single-threaded and
//! tick-driven: the polling loop calls one entry point per detected event
//! and forwards the outputs to its sinks. Nothing in here blocks, queues,
//! or fails; each resolved event yields exactly one send.
//!
//! Host-override and local toggles both write the same per-button boolean
//! with last-write-wins semantics, which is only sound with a single
//! caller feeding events in order.

pub mod analog;
pub mod button;
pub mod encoder;
pub mod resolver;


use tracing::debug;

use crate::colors::{self, Rgb};
use crate::config::{AppConfig, ButtonConfig, MessageType, OffMode};
use crate::midi::OutboundMessage;

use analog::AnalogChannel;
use button::{ButtonState, PressKind};
use encoder::EncoderChannel;
use resolver::ResolvedAction;

/// LED/display descriptor, emitted alongside CC/note state changes.
///
/// PC-family buttons use a momentary flash handled entirely by the
/// display collaborator and produce no VisualState here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualState {
    pub button_index: usize,
    /// Concrete color with the off-state treatment already applied
    pub color: Rgb,
    pub active: bool,
}

/// One resolved output of the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    Midi(OutboundMessage),
    Visual(VisualState),
}

/// The input resolution engine; one instance per controller
pub struct Engine {
    config: AppConfig,
    /// Button state arena, indexed by button number
    buttons: Vec<ButtonState>,
    /// Per-button program counter for pc_inc / pc_dec
    pc_values: Vec<u8>,
    encoder: Option<EncoderChannel>,
    push: Option<(ButtonConfig, ButtonState)>,
    expression: [Option<(crate::config::ExpressionPedalConfig, AnalogChannel)>; 2],
}

impl Engine {
    /// Build an engine from a validated config.
    ///
    /// Validation is re-run defensively; the engine must not misbehave
    /// even if handed a config that skipped the loader.
    pub fn new(mut config: AppConfig) -> Self {
        config.validate();

        let buttons = vec![ButtonState::new(); config.buttons.len()];
        let pc_values = vec![0u8; config.buttons.len()];

        let encoder = config
            .encoder
            .as_ref()
            .filter(|e| e.enabled)
            .map(EncoderChannel::new);

        // The encoder push switch is a plain CC button
        let push = config.encoder.as_ref().filter(|e| e.push.enabled).map(|e| {
            let push_config = ButtonConfig {
                label: Some(e.push.label.clone()),
                mode: e.push.mode,
                channel: Some(config.channel),
                cc: Some(e.push.cc),
                ..ButtonConfig::default()
            };
            (push_config, ButtonState::new())
        });

        let expression = match &config.expression {
            Some(exp) => [
                exp.exp1
                    .as_ref()
                    .filter(|p| p.enabled)
                    .map(|p| (p.clone(), AnalogChannel::new(p))),
                exp.exp2
                    .as_ref()
                    .filter(|p| p.enabled)
                    .map(|p| (p.clone(), AnalogChannel::new(p))),
            ],
            None => [None, None],
        };

        Self {
            config,
            buttons,
            pc_values,
            encoder,
            push,
            expression,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current (on, keytime) pair for a button, for status display
    pub fn button_status(&self, index: usize) -> Option<(bool, u8)> {
        self.buttons
            .get(index)
            .map(|s| (s.is_on(), s.current_keytime()))
    }

    /// Current encoder accumulator value, if an encoder is configured
    pub fn encoder_value(&self) -> Option<u8> {
        self.encoder.as_ref().map(EncoderChannel::value)
    }

    /// Resolve a footswitch edge into outbound messages and visuals.
    ///
    /// Exactly one MIDI message per detected edge that produces output;
    /// unknown indices are ignored.
    pub fn on_switch_edge(&mut self, index: usize, pressed: bool) -> Vec<EngineOutput> {
        let Some(config) = self.config.buttons.get(index) else {
            return Vec::new();
        };
        let channel = config.channel.unwrap_or(0).min(15);
        let mut outputs = Vec::new();

        if pressed {
            let press = self.buttons[index].on_press(config);
            debug!(
                "Button {} press: keytime {} -> {:?}",
                index + 1,
                self.buttons[index].current_keytime(),
                press.spec.action
            );

            match (press.kind, press.spec.action) {
                (PressKind::Switched { on }, ResolvedAction::Cc { cc, cc_on, cc_off }) => {
                    let value = if on { cc_on } else { cc_off };
                    outputs.push(EngineOutput::Midi(OutboundMessage::ControlChange {
                        channel,
                        cc,
                        value,
                    }));
                    outputs.push(EngineOutput::Visual(visual(
                        index,
                        press.spec.color,
                        config.off_mode,
                        on,
                    )));
                }
                (PressKind::Triggered, ResolvedAction::Note { note, velocity_on, .. }) => {
                    outputs.push(EngineOutput::Midi(OutboundMessage::NoteOn {
                        channel,
                        note,
                        velocity: velocity_on,
                    }));
                    outputs.push(EngineOutput::Visual(visual(
                        index,
                        press.spec.color,
                        config.off_mode,
                        true,
                    )));
                }
                (PressKind::Triggered, ResolvedAction::Pc { program }) => {
                    outputs.push(EngineOutput::Midi(OutboundMessage::ProgramChange {
                        channel,
                        program,
                    }));
                }
                (PressKind::Triggered, ResolvedAction::PcInc { step }) => {
                    self.pc_values[index] = self.pc_values[index].saturating_add(step).min(127);
                    outputs.push(EngineOutput::Midi(OutboundMessage::ProgramChange {
                        channel,
                        program: self.pc_values[index],
                    }));
                }
                (PressKind::Triggered, ResolvedAction::PcDec { step }) => {
                    self.pc_values[index] = self.pc_values[index].saturating_sub(step);
                    outputs.push(EngineOutput::Midi(OutboundMessage::ProgramChange {
                        channel,
                        program: self.pc_values[index],
                    }));
                }
                // Switched outcomes only arise from CC specs
                _ => {}
            }
        } else if let Some(release) = self.buttons[index].on_release(config) {
            match release.spec.action {
                ResolvedAction::Cc { cc, cc_off, .. } => {
                    outputs.push(EngineOutput::Midi(OutboundMessage::ControlChange {
                        channel,
                        cc,
                        value: cc_off,
                    }));
                    outputs.push(EngineOutput::Visual(visual(
                        index,
                        release.spec.color,
                        config.off_mode,
                        false,
                    )));
                }
                ResolvedAction::Note { note, velocity_off, .. } => {
                    outputs.push(EngineOutput::Midi(OutboundMessage::NoteOff {
                        channel,
                        note,
                        velocity: velocity_off,
                    }));
                    outputs.push(EngineOutput::Visual(visual(
                        index,
                        release.spec.color,
                        config.off_mode,
                        false,
                    )));
                }
                _ => {}
            }
        }

        outputs
    }

    /// Host feedback: an incoming CC overrides the matching button's
    /// boolean (value > 63 = on) without touching its keytime. Only
    /// visuals come back out; the host already knows the value.
    pub fn on_host_cc(&mut self, cc: u8, value: u8) -> Vec<EngineOutput> {
        for (index, config) in self.config.buttons.iter().enumerate() {
            if config.message_type != MessageType::Cc || config.cc != Some(cc) {
                continue;
            }
            if let Some(on) = self.buttons[index].on_host_override(config, value) {
                debug!("Host override: button {} -> {}", index + 1, on);
                let keytime = self.buttons[index].current_keytime();
                let spec = resolver::resolve(config, keytime);
                return vec![EngineOutput::Visual(visual(
                    index,
                    spec.color,
                    config.off_mode,
                    on,
                ))];
            }
        }
        Vec::new()
    }

    /// Rotation delta from the encoder; emits the accumulator value or,
    /// in stepped mode, the slot number.
    pub fn on_encoder_delta(&mut self, delta: i32) -> Option<OutboundMessage> {
        let encoder = self.encoder.as_mut()?;
        let value = encoder.process(delta)?;
        let cc = self.config.encoder.as_ref().map(|e| e.cc).unwrap_or(11);
        Some(OutboundMessage::ControlChange {
            channel: self.config.channel,
            cc,
            value,
        })
    }

    /// Encoder push switch edge (plain CC button, no LED of its own)
    pub fn on_encoder_push_edge(&mut self, pressed: bool) -> Option<OutboundMessage> {
        let (config, state) = self.push.as_mut()?;
        let channel = config.channel.unwrap_or(0).min(15);

        if pressed {
            let press = state.on_press(config);
            match (press.kind, press.spec.action) {
                (PressKind::Switched { on }, ResolvedAction::Cc { cc, cc_on, cc_off }) => {
                    Some(OutboundMessage::ControlChange {
                        channel,
                        cc,
                        value: if on { cc_on } else { cc_off },
                    })
                }
                _ => None,
            }
        } else {
            let release = state.on_release(config)?;
            match release.spec.action {
                ResolvedAction::Cc { cc, cc_off, .. } => Some(OutboundMessage::ControlChange {
                    channel,
                    cc,
                    value: cc_off,
                }),
                _ => None,
            }
        }
    }

    /// Raw ADC sample for expression pedal 0 or 1
    pub fn on_expression_sample(&mut self, pedal: usize, raw: u16) -> Option<OutboundMessage> {
        let (config, channel_state) = self.expression.get_mut(pedal)?.as_mut()?;
        let value = channel_state.process(raw)?;
        Some(OutboundMessage::ControlChange {
            channel: self.config.channel,
            cc: config.cc,
            value,
        })
    }

    /// Reset all runtime state: keytimes to 1, booleans off.
    ///
    /// Used by the config-reload lifecycle; calibration and program
    /// counters survive, button cycling does not.
    pub fn reset(&mut self) {
        for state in &mut self.buttons {
            state.reset_keytime();
        }
        if let Some((_, state)) = &mut self.push {
            state.reset_keytime();
        }
    }

    /// Press edge immediately followed by a release edge (REPL `tap`)
    pub fn tap(&mut self, index: usize) -> Vec<EngineOutput> {
        let mut outputs = self.on_switch_edge(index, true);
        outputs.extend(self.on_switch_edge(index, false));
        outputs
    }

    /// Off-state visual for every button, for startup and after reload
    pub fn initial_visuals(&self) -> Vec<VisualState> {
        self.config
            .buttons
            .iter()
            .enumerate()
            .map(|(index, config)| {
                let keytime = self
                    .buttons
                    .get(index)
                    .map(|s| s.current_keytime())
                    .unwrap_or(1);
                let spec = resolver::resolve(config, keytime);
                visual(index, spec.color, config.off_mode, false)
            })
            .collect()
    }
}

fn visual(button_index: usize, on_color: Rgb, off_mode: OffMode, active: bool) -> VisualState {
    let color = if active {
        on_color
    } else {
        colors::off_color(on_color, off_mode)
    };
    VisualState {
        button_index,
        color,
        active,
    }
}
