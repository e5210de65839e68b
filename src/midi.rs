//! Outbound MIDI message type and wire encoding
//!
//! The engine resolves every input event into at most one `OutboundMessage`;
//! sinks turn it into whatever transport they speak. Parsing covers the
//! channel-voice subset a host feeds back to the controller.

use std::fmt;

/// Channel-voice message produced by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },

    /// Program Change: channel (0-15), program (0-127)
    ProgramChange { channel: u8, program: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },
}

impl OutboundMessage {
    /// Encode the message to MIDI wire bytes
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            OutboundMessage::ControlChange { channel, cc, value } => {
                vec![0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
            OutboundMessage::ProgramChange { channel, program } => {
                vec![0xC0 | (channel & 0x0F), program & 0x7F]
            }
            OutboundMessage::NoteOn { channel, note, velocity } => {
                vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            OutboundMessage::NoteOff { channel, note, velocity } => {
                vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
        }
    }

    /// Parse the channel-voice subset this crate cares about.
    ///
    /// Returns None for truncated input and for message families the
    /// engine never consumes (pitch bend, aftertouch, system messages).
    pub fn parse(data: &[u8]) -> Option<Self> {
        let status = *data.first()?;
        if status < 0x80 || status >= 0xF0 {
            return None;
        }

        let channel = status & 0x0F;
        match status & 0xF0 {
            0x80 => {
                if data.len() < 3 {
                    return None;
                }
                Some(OutboundMessage::NoteOff {
                    channel,
                    note: data[1] & 0x7F,
                    velocity: data[2] & 0x7F,
                })
            }
            0x90 => {
                if data.len() < 3 {
                    return None;
                }
                let note = data[1] & 0x7F;
                let velocity = data[2] & 0x7F;
                // Note On with velocity 0 is a Note Off
                if velocity == 0 {
                    Some(OutboundMessage::NoteOff { channel, note, velocity: 0 })
                } else {
                    Some(OutboundMessage::NoteOn { channel, note, velocity })
                }
            }
            0xB0 => {
                if data.len() < 3 {
                    return None;
                }
                Some(OutboundMessage::ControlChange {
                    channel,
                    cc: data[1] & 0x7F,
                    value: data[2] & 0x7F,
                })
            }
            0xC0 => {
                if data.len() < 2 {
                    return None;
                }
                Some(OutboundMessage::ProgramChange {
                    channel,
                    program: data[1] & 0x7F,
                })
            }
            _ => None,
        }
    }

    /// MIDI channel of the message (0-15)
    pub fn channel(&self) -> u8 {
        match *self {
            OutboundMessage::ControlChange { channel, .. }
            | OutboundMessage::ProgramChange { channel, .. }
            | OutboundMessage::NoteOn { channel, .. }
            | OutboundMessage::NoteOff { channel, .. } => channel,
        }
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            OutboundMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
            OutboundMessage::ProgramChange { channel, program } => {
                write!(f, "ProgramChange ch:{} p:{}", channel + 1, program)
            }
            OutboundMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            OutboundMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_control_change() {
        let msg = OutboundMessage::ControlChange { channel: 2, cc: 20, value: 127 };
        assert_eq!(msg.encode(), vec![0xB2, 20, 127]);
    }

    #[test]
    fn test_encode_program_change() {
        let msg = OutboundMessage::ProgramChange { channel: 0, program: 5 };
        assert_eq!(msg.encode(), vec![0xC0, 5]);
    }

    #[test]
    fn test_encode_masks_out_of_range_data() {
        let msg = OutboundMessage::NoteOn { channel: 0, note: 200, velocity: 255 };
        let bytes = msg.encode();
        assert!(bytes[1] <= 0x7F && bytes[2] <= 0x7F);
    }

    #[test]
    fn test_parse_control_change() {
        let msg = OutboundMessage::parse(&[0xB0, 20, 64]).unwrap();
        assert_eq!(msg, OutboundMessage::ControlChange { channel: 0, cc: 20, value: 64 });
    }

    #[test]
    fn test_parse_note_on_velocity_zero_is_note_off() {
        let msg = OutboundMessage::parse(&[0x90, 60, 0]).unwrap();
        assert_eq!(msg, OutboundMessage::NoteOff { channel: 0, note: 60, velocity: 0 });
    }

    #[test]
    fn test_parse_rejects_unsupported() {
        assert_eq!(OutboundMessage::parse(&[]), None);
        assert_eq!(OutboundMessage::parse(&[0xE0, 0x00, 0x40]), None); // pitch bend
        assert_eq!(OutboundMessage::parse(&[0xF8]), None); // timing clock
        assert_eq!(OutboundMessage::parse(&[0xB0, 20]), None); // truncated
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xB0, 0x14, 0x7F]), "B0 14 7F");
    }
}
