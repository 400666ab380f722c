//! Colours: canonical RGBA block colours, btop-style `theme[key]="value"` loading, hex parsing.

use ratatui::style::Color;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Block colour with 8-bit channels. Equality is on the packed `RRGGBBAA` key,
/// so a colour read back from a save compares equal to the one written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Colour of a cell that holds nothing.
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    /// Packed `0xRRGGBBAA`, the same value the save file spells out in hex.
    #[inline]
    pub const fn key(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.key())
    }
}

impl FromStr for Rgba {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s)
    }
}

impl From<Rgba> for Color {
    fn from(c: Rgba) -> Self {
        Color::Rgb(c.r, c.g, c.b)
    }
}

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Block colours (index 0..=5): green, yellow, red, blue, magenta, cyan.
    pub blocks: [Rgba; 6],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, best).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Empty cell tiles and secondary text.
    pub inactive_fg: Color,
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

const ONEDARK_BLOCKS: [Rgba; 6] = [
    Rgba::opaque(0x98, 0xC3, 0x79), // mem_box / green
    Rgba::opaque(0xE5, 0xC0, 0x7B), // title / cpu_mid / yellow
    Rgba::opaque(0xE0, 0x6C, 0x75), // cpu_end / temp_end / red
    Rgba::opaque(0x61, 0xAF, 0xEF), // cpu_box / blue
    Rgba::opaque(0xC6, 0x78, 0xDD), // net_box / magenta
    Rgba::opaque(0x56, 0xB6, 0xC2), // hi_fg / proc_misc / cyan
];

impl Theme {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            blocks: ONEDARK_BLOCKS,
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
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

    /// Override block colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.blocks = [
                    Rgba::opaque(0x00, 0xFF, 0x00),
                    Rgba::opaque(0xFF, 0xFF, 0x00),
                    Rgba::opaque(0xFF, 0x00, 0x00),
                    Rgba::opaque(0x00, 0x88, 0xFF),
                    Rgba::opaque(0xFF, 0x00, 0xFF),
                    Rgba::opaque(0x00, 0xFF, 0xFF),
                ];
            }
            crate::Palette::Colorblind => {
                // Paul Tol's bright scheme; no red/green pair among the first three.
                self.blocks = [
                    Rgba::opaque(0x00, 0x77, 0xBB),
                    Rgba::opaque(0xEE, 0x77, 0x33),
                    Rgba::opaque(0x00, 0x99, 0x88),
                    Rgba::opaque(0xCC, 0x33, 0x11),
                    Rgba::opaque(0xEE, 0x33, 0x77),
                    Rgba::opaque(0xBB, 0xBB, 0x00),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let ui = |key: &str, fallback: Color| get(key).map_or(fallback, Color::from);
        let defaults = Self::onedark_default();
        Self {
            blocks: [
                get("mem_box")
                    .or_else(|| get("cpu_start"))
                    .unwrap_or(ONEDARK_BLOCKS[0]),
                get("title")
                    .or_else(|| get("cpu_mid"))
                    .unwrap_or(ONEDARK_BLOCKS[1]),
                get("cpu_end")
                    .or_else(|| get("temp_end"))
                    .unwrap_or(ONEDARK_BLOCKS[2]),
                get("cpu_box").unwrap_or(ONEDARK_BLOCKS[3]),
                get("net_box").unwrap_or(ONEDARK_BLOCKS[4]),
                get("hi_fg")
                    .or_else(|| get("proc_misc"))
                    .unwrap_or(ONEDARK_BLOCKS[5]),
            ],
            bg: ui("meter_bg", defaults.bg),
            div_line: ui("div_line", defaults.div_line),
            main_fg: ui("main_fg", defaults.main_fg),
            title: ui("title", defaults.title),
            inactive_fg: ui("inactive_fg", defaults.inactive_fg),
        }
    }

    /// The first `count` block colours (clamped to 1..=6); this is the palette sequences draw from.
    pub fn block_palette(&self, count: usize) -> Vec<Rgba> {
        self.blocks[..count.clamp(1, self.blocks.len())].to_vec()
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
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBBAA", "#RRGGBB" or "#RGB". Missing alpha means opaque.
pub fn parse_hex(s: &str) -> Result<Rgba, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| invalid());
    let nibble = |i: usize| {
        u8::from_str_radix(&s[i..=i], 16)
            .map(|n| n * 17)
            .map_err(|_| invalid())
    };
    match s.len() {
        8 => Ok(Rgba::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        6 => Ok(Rgba::opaque(byte(0)?, byte(2)?, byte(4)?)),
        3 => Ok(Rgba::opaque(nibble(0)?, nibble(1)?, nibble(2)?)),
        _ => Err(invalid()),
    }
}
