//! Color utility functions shared across the editor.
//!
//! Colors travel through the persisted format as hex strings (`#rrggbb`) for
//! categories and as decimal string triples for skeleton keypoints.

use serde::{Deserialize, Serialize};

/// An opaque 8-bit RGB color.
///
/// Serializes as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        match digits.len() {
            6 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            3 => {
                let mut channels = [0u8; 3];
                for (slot, c) in channels.iter_mut().zip(digits.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 16 + v;
                }
                Some(Self::new(channels[0], channels[1], channels[2]))
            }
            _ => None,
        }
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Build a color from decimal channel strings such as `["255", "0", "0"]`.
    ///
    /// Missing or unparsable channels fall back to 255.
    pub fn from_channel_strings<S: AsRef<str>>(channels: &[S]) -> Self {
        let channel = |i: usize| {
            channels
                .get(i)
                .and_then(|s| s.as_ref().trim().parse::<u8>().ok())
                .unwrap_or(255)
        };
        Self::new(channel(0), channel(1), channel(2))
    }

    /// Decimal channel strings, the inverse of [`Rgb::from_channel_strings`].
    pub fn to_channel_strings(&self) -> [String; 3] {
        [self.r.to_string(), self.g.to_string(), self.b.to_string()]
    }

    /// Convert to a tiny-skia color with the given alpha (0.0-1.0).
    pub fn to_skia(&self, alpha: f32) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, (alpha.clamp(0.0, 1.0) * 255.0) as u8)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value).ok_or_else(|| format!("invalid color '{}'", value))
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl Rgb {
    /// Color from hue in degrees with saturation and value in `0.0..=1.0`.
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let hue = hue.rem_euclid(360.0);
        let chroma = value * saturation;
        let sector = hue / 60.0;
        let second = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r, g, b) = match sector as u32 {
            0 => (chroma, second, 0.0),
            1 => (second, chroma, 0.0),
            2 => (0.0, chroma, second),
            3 => (0.0, second, chroma),
            4 => (second, 0.0, chroma),
            _ => (chroma, 0.0, second),
        };
        let lift = value - chroma;
        let channel = |c: f32| ((c + lift).clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(channel(r), channel(g), channel(b))
    }
}

/// Deterministic, well-separated color for the n-th category.
///
/// Hues advance by the golden angle so neighbouring indices never collide.
pub fn palette_color(index: usize) -> Rgb {
    Rgb::from_hsv(index as f32 * 137.508, 0.75, 0.95)
}
