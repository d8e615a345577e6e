//! Theme loading (btop-style `theme[key]="value"`) and the tile asset lookup.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::tile::{MAX_TILE_VALUE, TileState};

/// Colours for numbered tiles 1..=7, gray tiles, and the surrounding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Numbered tile colours, index 0 is value 1.
    pub numbers: [Color; MAX_TILE_VALUE as usize],
    pub gray: Color,
    /// Board background.
    pub bg: Color,
    /// Grid lines / border.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    pub title: Color,
    /// Unlit level pips.
    pub inactive_fg: Color,
}

/// What the renderer draws for one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAsset {
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

/// `theme[...]` keys tried for each tile value, first match wins.
const NUMBER_KEYS: [&[&str]; MAX_TILE_VALUE as usize] = [
    &["tile_1", "mem_box", "cpu_start"],
    &["tile_2", "cpu_mid"],
    &["tile_3", "cpu_end", "temp_end"],
    &["tile_4", "cpu_box"],
    &["tile_5", "net_box"],
    &["tile_6", "hi_fg", "proc_misc"],
    &["tile_7", "temp_mid"],
];

impl Theme {
    /// One Dark based defaults.
    pub fn onedark_default() -> Self {
        Self {
            numbers: [
                Color::Rgb(0x98, 0xC3, 0x79), // green
                Color::Rgb(0xE5, 0xC0, 0x7B), // yellow
                Color::Rgb(0xE0, 0x6C, 0x75), // red
                Color::Rgb(0x61, 0xAF, 0xEF), // blue
                Color::Rgb(0xC6, 0x78, 0xDD), // magenta
                Color::Rgb(0x56, 0xB6, 0xC2), // cyan
                Color::Rgb(0xD1, 0x9A, 0x66), // orange
            ],
            gray: Color::Rgb(0x7F, 0x84, 0x8E),
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Load a btop-style file. A missing path (or None) gives the defaults.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override tile colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.numbers = [
                    Color::Rgb(0x00, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x00, 0x00),
                    Color::Rgb(0x00, 0x88, 0xFF),
                    Color::Rgb(0xFF, 0x00, 0xFF),
                    Color::Rgb(0x00, 0xFF, 0xFF),
                    Color::Rgb(0xFF, 0x88, 0x00),
                ];
                self.gray = Color::Rgb(0xC0, 0xC0, 0xC0);
            }
            crate::Palette::Colorblind => {
                // Paul Tol's bright scheme: no red/green pairs.
                self.numbers = [
                    Color::Rgb(0x00, 0x77, 0xBB),
                    Color::Rgb(0xEE, 0x77, 0x33),
                    Color::Rgb(0x00, 0x99, 0x88),
                    Color::Rgb(0xCC, 0x33, 0x11),
                    Color::Rgb(0xEE, 0x33, 0x77),
                    Color::Rgb(0xBB, 0xBB, 0x00),
                    Color::Rgb(0x33, 0xBB, 0xEE),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::onedark_default();
        let mut numbers = defaults.numbers;
        for (slot, keys) in numbers.iter_mut().zip(NUMBER_KEYS) {
            if let Some(c) = keys.iter().find_map(|k| get(k)) {
                *slot = c;
            }
        }
        Self {
            numbers,
            gray: get("tile_gray")
                .or_else(|| get("inactive_fg"))
                .unwrap_or(defaults.gray),
            bg: get("meter_bg").unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
        }
    }

    /// Asset for a tile face. Empty and out-of-range values have nothing to
    /// draw in any state; otherwise Gray wins over the value and Grinded has
    /// no asset.
    pub fn asset_for(&self, value: u8, state: TileState) -> Option<TileAsset> {
        if !(1..=MAX_TILE_VALUE).contains(&value) {
            return None;
        }
        match state {
            TileState::Gray => Some(TileAsset {
                glyph: '■',
                fg: self.bg,
                bg: self.gray,
            }),
            TileState::Grinded => None,
            TileState::Number => Some(TileAsset {
                glyph: char::from(b'0' + value),
                fg: Color::Black,
                bg: self.numbers[usize::from(value - 1)],
            }),
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some((key, rest)) = stripped.split_once(']') else {
            continue;
        };
        let Some((_, value)) = rest.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if !value.is_empty() {
            map.insert(key.trim().to_string(), value.to_string());
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
