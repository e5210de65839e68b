//! Named color palette and off-state color resolution
//!
//! Buttons are configured with color names; LED/display sinks receive
//! concrete RGB values with the off-state treatment already applied.

use crate::config::OffMode;

/// An 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into a 0xRRGGBB integer for displays that take hex colors
    pub fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Return a dimmed version of this color (default off-state treatment)
    pub fn dim(self, factor: f32) -> Self {
        Self {
            r: (self.r as f32 * factor) as u8,
            g: (self.g as f32 * factor) as u8,
            b: (self.b as f32 * factor) as u8,
        }
    }
}

pub const BLACK: Rgb = Rgb::new(0, 0, 0);
pub const WHITE: Rgb = Rgb::new(255, 255, 255);

/// Dim factor applied for `off_mode: dim`
const DIM_FACTOR: f32 = 0.15;

/// Look up a color by name, falling back to white for unknown names
pub fn by_name(name: &str) -> Rgb {
    match name.to_ascii_lowercase().as_str() {
        "red" => Rgb::new(255, 0, 0),
        "green" => Rgb::new(0, 255, 0),
        "blue" => Rgb::new(0, 0, 255),
        "yellow" => Rgb::new(255, 255, 0),
        "cyan" => Rgb::new(0, 255, 255),
        "magenta" => Rgb::new(255, 0, 255),
        "orange" => Rgb::new(255, 128, 0),
        "purple" => Rgb::new(128, 0, 255),
        "white" => WHITE,
        "off" => BLACK,
        _ => WHITE,
    }
}

/// Color shown while a button is inactive
pub fn off_color(on_color: Rgb, off_mode: OffMode) -> Rgb {
    match off_mode {
        OffMode::Off => BLACK,
        OffMode::Dim => on_color.dim(DIM_FACTOR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(by_name("red"), Rgb::new(255, 0, 0));
        assert_eq!(by_name("Cyan"), Rgb::new(0, 255, 255));
        assert_eq!(by_name("off"), BLACK);
    }

    #[test]
    fn test_unknown_name_falls_back_to_white() {
        assert_eq!(by_name("chartreuse"), WHITE);
        assert_eq!(by_name(""), WHITE);
    }

    #[test]
    fn test_hex_packing() {
        assert_eq!(Rgb::new(255, 128, 0).to_hex(), 0xFF8000);
        assert_eq!(BLACK.to_hex(), 0x000000);
    }

    #[test]
    fn test_off_color_modes() {
        let red = by_name("red");
        assert_eq!(off_color(red, OffMode::Off), BLACK);
        let dimmed = off_color(red, OffMode::Dim);
        assert_eq!(dimmed, Rgb::new(38, 0, 0));
    }
}
