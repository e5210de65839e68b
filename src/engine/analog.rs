//! Expression pedal signal conditioning
//!
//! Auto-calibration, polarity, range mapping, and hysteresis for one
//! analog channel. Calibration bounds only ever expand: a pedal worked to
//! its true extremes during a performance gets an increasingly accurate
//! mapping, and narrowing the range again takes a power cycle.

use crate::config::{ExpressionPedalConfig, Polarity};

/// Calibration seed; both bounds start here, so the channel is
/// uncalibrated (and silent) until a sample moves one of them
const RAW_SEED: u16 = 2048;

/// Per-pedal conditioning state
#[derive(Debug, Clone)]
pub struct AnalogChannel {
    raw_min: u16,
    raw_max: u16,
    last_emitted: Option<u8>,
    threshold: u8,
    polarity: Polarity,
    out_min: i32,
    out_max: i32,
}

impl AnalogChannel {
    pub fn new(config: &ExpressionPedalConfig) -> Self {
        Self {
            raw_min: RAW_SEED,
            raw_max: RAW_SEED,
            last_emitted: None,
            threshold: config.threshold,
            polarity: config.polarity,
            out_min: config.min,
            out_max: config.max,
        }
    }

    /// True once the observed range spans more than a single value
    pub fn is_calibrated(&self) -> bool {
        self.raw_max > self.raw_min
    }

    /// Condition one raw ADC sample into an optional 7-bit output.
    ///
    /// Returns None while uncalibrated and whenever the candidate value
    /// is within the hysteresis threshold of the last emitted one.
    pub fn process(&mut self, raw: u16) -> Option<u8> {
        // Expand calibration monotonically; bounds never shrink
        self.raw_min = self.raw_min.min(raw);
        self.raw_max = self.raw_max.max(raw);

        if !self.is_calibrated() {
            return None;
        }

        let span = f32::from(self.raw_max - self.raw_min);
        let mut normalized = (f32::from(raw) - f32::from(self.raw_min)) / span;
        normalized = normalized.clamp(0.0, 1.0);
        if self.polarity == Polarity::Reverse {
            normalized = 1.0 - normalized;
        }

        // Map into the configured range, then clamp to protocol bounds;
        // the configured range itself may be misconfigured beyond them
        let mapped = self.out_min as f32 + normalized * (self.out_max - self.out_min) as f32;
        let candidate = mapped.round().clamp(0.0, 127.0) as u8;

        match self.last_emitted {
            Some(last) if i16::from(candidate).abs_diff(i16::from(last)) < u16::from(self.threshold) => {
                None
            }
            _ => {
                self.last_emitted = Some(candidate);
                Some(candidate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(json: &str) -> AnalogChannel {
        let config: ExpressionPedalConfig = serde_json::from_str(json).unwrap();
        AnalogChannel::new(&config)
    }

    #[test]
    fn test_silent_until_calibrated() {
        let mut ch = channel(r#"{}"#);
        // First sample equal to the seed: bounds still collapsed
        assert_eq!(ch.process(2048), None);
        assert!(!ch.is_calibrated());
    }

    #[test]
    fn test_calibration_expands_with_samples() {
        let mut ch = channel(r#"{ "threshold": 2 }"#);

        // 1000 expands the lower bound; span is now [1000, 2048]
        let first = ch.process(1000);
        assert!(ch.is_calibrated());
        assert_eq!(first, Some(0));

        // 5000 expands the upper bound and lands at the top of the span
        assert_eq!(ch.process(5000), Some(127));

        // 9000 expands further; still the top of the (new) span
        assert_eq!(ch.process(9000), None); // 127 -> 127 suppressed
        let mid = ch.process(5000).unwrap();
        assert!(mid > 0 && mid < 127);
    }

    #[test]
    fn test_bounds_never_shrink() {
        let mut ch = channel(r#"{ "threshold": 1 }"#);
        ch.process(0);
        ch.process(10000);

        // Samples inside the established range do not contract it:
        // the same raw value keeps mapping to the same output
        let inner = ch.process(5000).unwrap();
        ch.process(4000);
        ch.process(6000);
        assert_eq!(ch.process(5000), Some(inner));
    }

    #[test]
    fn test_hysteresis_suppresses_chatter() {
        let mut ch = channel(r#"{ "threshold": 2 }"#);
        ch.process(0);
        ch.process(12700); // span 0..12700, ~100 per output step

        let v = ch.process(6350).unwrap();
        // Same output step: suppressed by threshold 2
        assert_eq!(ch.process(6400), None);
        // One step away: still under the threshold
        assert_eq!(ch.process(6500), None);
        // Three steps away: emitted
        let next = ch.process(6700).unwrap();
        assert_eq!(next.abs_diff(v), 3);
    }

    #[test]
    fn test_reverse_polarity() {
        let mut ch = channel(r#"{ "polarity": "reverse", "threshold": 1 }"#);
        ch.process(0);
        assert_eq!(ch.process(10000), Some(0));
        assert_eq!(ch.process(0), Some(127));
    }

    #[test]
    fn test_configured_range_maps_output() {
        let mut ch = channel(r#"{ "min": 20, "max": 40, "threshold": 1 }"#);
        ch.process(0);
        assert_eq!(ch.process(10000), Some(40));
        assert_eq!(ch.process(0), Some(20));
    }

    #[test]
    fn test_misconfigured_range_clamped_to_protocol_bounds() {
        let mut ch = channel(r#"{ "min": -50, "max": 500, "threshold": 1 }"#);
        ch.process(0);
        assert_eq!(ch.process(10000), Some(127));
        assert_eq!(ch.process(0), Some(0));
    }
}
