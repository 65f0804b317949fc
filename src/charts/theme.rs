//! Chart styling passed explicitly to the renderer.

use crate::config::ChartConfig;
use plotters::style::RGBColor;

/// Fallback series colour when the palette is empty or unparseable.
const FALLBACK_COLOR: RGBColor = RGBColor(68, 1, 84);

/// Visual settings shared by every chart.
#[derive(Debug, Clone)]
pub struct ChartTheme {
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub caption_size: f64,
    pub label_size: f64,
    pub palette: Vec<RGBColor>,
    pub background: RGBColor,
    pub accent: RGBColor,
    pub donation_bins: usize,
    pub ci_level: f64,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self::from(&ChartConfig::default())
    }
}

impl From<&ChartConfig> for ChartTheme {
    fn from(config: &ChartConfig) -> Self {
        let palette: Vec<RGBColor> = config
            .palette
            .iter()
            .filter_map(|hex| parse_hex_color(hex))
            .collect();

        Self {
            width: config.width,
            height: config.height,
            font_family: config.font_family.clone(),
            caption_size: 32.0,
            label_size: 18.0,
            palette,
            background: RGBColor(255, 255, 255),
            accent: RGBColor(214, 39, 40),
            donation_bins: config.donation_bins,
            ci_level: config.ci_level,
        }
    }
}

impl ChartTheme {
    /// Colour for the `index`th series, cycling through the palette.
    pub fn series_color(&self, index: usize) -> RGBColor {
        if self.palette.is_empty() {
            return FALLBACK_COLOR;
        }
        self.palette[index % self.palette.len()]
    }

    /// Caption font as a plotters text-style tuple.
    pub fn caption_font(&self) -> (&str, f64) {
        (self.font_family.as_str(), self.caption_size)
    }

    /// Axis label font.
    pub fn label_font(&self) -> (&str, f64) {
        (self.font_family.as_str(), self.label_size)
    }
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}
