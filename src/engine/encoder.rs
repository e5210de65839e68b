//! Rotary encoder accumulator with optional stepped quantization
//!
//! The internal value always tracks 0-127; stepped mode maps it into a
//! small number of output slots and only emits on slot boundaries.

use crate::config::EncoderConfig;

/// Encoder runtime state
#[derive(Debug, Clone)]
pub struct EncoderChannel {
    value: u8,
    steps: Option<u8>,
    current_slot: Option<u8>,
}

impl EncoderChannel {
    pub fn new(config: &EncoderConfig) -> Self {
        Self {
            value: config.initial.min(127),
            steps: config.steps,
            current_slot: None,
        }
    }

    /// Current accumulator value (0-127)
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Apply a rotation delta; returns the outbound value when one is due.
    ///
    /// Continuous mode emits the accumulator whenever it actually moved
    /// (a delta absorbed by the clamp emits nothing). Stepped mode emits
    /// the slot number on slot changes only.
    pub fn process(&mut self, delta: i32) -> Option<u8> {
        let new_value = (i32::from(self.value) + delta).clamp(0, 127) as u8;

        match self.steps {
            Some(steps) if steps > 1 => {
                self.value = new_value;
                // The final slot absorbs the 128 % steps remainder
                let slot_size = 128 / u16::from(steps);
                let new_slot = (u16::from(self.value) / slot_size).min(u16::from(steps) - 1) as u8;

                if self.current_slot != Some(new_slot) {
                    self.current_slot = Some(new_slot);
                    Some(new_slot)
                } else {
                    None
                }
            }
            _ => {
                if new_value == self.value {
                    None
                } else {
                    self.value = new_value;
                    Some(self.value)
                }
            }
        }
    }
}
