//! Color encoding for exported variable values.
//!
//! The export stores colors as fractional channels in `[0, 1]`; CSS wants
//! `#RRGGBB`. Channels are not clamped, so out-of-range input shows up in the
//! output instead of being silently corrected.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    /// Alpha is carried through from the export but never encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
}

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: None }
    }

    pub fn to_hex(&self) -> String {
        to_hex(self)
    }
}

/// Encode a fractional RGB triple as an uppercase `#RRGGBB` string.
pub fn to_hex(rgb: &Rgb) -> String {
    format!(
        "#{}{}{}",
        channel_to_hex(rgb.r),
        channel_to_hex(rgb.g),
        channel_to_hex(rgb.b)
    )
}

fn channel_to_hex(channel: f64) -> String {
    let scaled = (channel * 255.0 + 0.5).floor();
    if !scaled.is_finite() {
        return "NAN".to_string();
    }

    let value = scaled as i64;
    let digits = if value < 0 {
        format!("-{:X}", value.unsigned_abs())
    } else {
        format!("{:X}", value)
    };

    if digits.len() == 1 {
        format!("0{}", digits)
    } else {
        digits
    }
}
