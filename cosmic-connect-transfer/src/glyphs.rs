//! Button Glyphs
//!
//! The chat log embeds its control buttons as PNG images. Glyphs are drawn
//! once per process, encoded and cached as base64.

use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::OnceLock;
use tracing::warn;

const GLYPH_SIZE: u32 = 24;
const CORNER_RADIUS: f32 = 4.0;

const ACTIVE_BG: Rgba<u8> = Rgba([0x4a, 0x4a, 0x4a, 0xff]);
const ACTIVE_FG: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
const DISABLED_BG: Rgba<u8> = Rgba([0xc8, 0xc8, 0xc8, 0xff]);
const DISABLED_FG: Rgba<u8> = Rgba([0x90, 0x90, 0x90, 0xff]);
const RED_BG: Rgba<u8> = Rgba([0xc0, 0x39, 0x2b, 0xff]);
const GREEN_BG: Rgba<u8> = Rgba([0x27, 0xae, 0x60, 0xff]);
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Image shown in one of the two button slots of a transfer form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonGlyph {
    Stop,
    Pause,
    /// Greyed pause; pressing it does nothing
    PauseDisabled,
    Resume,
    Accept,
    BlankLeftRed,
    BlankRightRed,
    BlankLeftGreen,
    BlankRightGreen,
}

#[derive(Clone, Copy)]
enum Rounding {
    All,
    Left,
    Right,
}

impl ButtonGlyph {
    pub const ALL: [ButtonGlyph; 9] = [
        ButtonGlyph::Stop,
        ButtonGlyph::Pause,
        ButtonGlyph::PauseDisabled,
        ButtonGlyph::Resume,
        ButtonGlyph::Accept,
        ButtonGlyph::BlankLeftRed,
        ButtonGlyph::BlankRightRed,
        ButtonGlyph::BlankLeftGreen,
        ButtonGlyph::BlankRightGreen,
    ];

    /// Stable name, used as the image alt text
    pub fn name(&self) -> &'static str {
        match self {
            ButtonGlyph::Stop => "stop",
            ButtonGlyph::Pause => "pause",
            ButtonGlyph::PauseDisabled => "pause-disabled",
            ButtonGlyph::Resume => "resume",
            ButtonGlyph::Accept => "accept",
            ButtonGlyph::BlankLeftRed => "blank-left-red",
            ButtonGlyph::BlankRightRed => "blank-right-red",
            ButtonGlyph::BlankLeftGreen => "blank-left-green",
            ButtonGlyph::BlankRightGreen => "blank-right-green",
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, ButtonGlyph::PauseDisabled)
    }

    /// Base64 PNG of the glyph, `None` if it could not be encoded
    pub fn png_base64(&self) -> Option<&'static str> {
        glyph_cache().get(self).map(String::as_str)
    }

    fn colors(&self) -> (Rgba<u8>, Rgba<u8>) {
        match self {
            ButtonGlyph::PauseDisabled => (DISABLED_BG, DISABLED_FG),
            ButtonGlyph::BlankLeftRed | ButtonGlyph::BlankRightRed => (RED_BG, RED_BG),
            ButtonGlyph::BlankLeftGreen | ButtonGlyph::BlankRightGreen => (GREEN_BG, GREEN_BG),
            _ => (ACTIVE_BG, ACTIVE_FG),
        }
    }

    fn rounding(&self) -> Rounding {
        match self {
            ButtonGlyph::BlankLeftRed | ButtonGlyph::BlankLeftGreen => Rounding::Left,
            ButtonGlyph::BlankRightRed | ButtonGlyph::BlankRightGreen => Rounding::Right,
            _ => Rounding::All,
        }
    }

    fn covers(&self, x: f32, y: f32) -> bool {
        match self {
            ButtonGlyph::Stop => (7.0..17.0).contains(&x) && (7.0..17.0).contains(&y),
            ButtonGlyph::Pause | ButtonGlyph::PauseDisabled => {
                (6.0..18.0).contains(&y)
                    && ((7.0..10.0).contains(&x) || (14.0..17.0).contains(&x))
            }
            ButtonGlyph::Resume => {
                (8.0..=17.0).contains(&x) && (y - 11.5).abs() <= (17.0 - x) * 0.66
            }
            ButtonGlyph::Accept => {
                near_segment(x, y, (6.0, 12.0), (10.0, 16.0), 1.5)
                    || near_segment(x, y, (10.0, 16.0), (18.0, 7.0), 1.5)
            }
            _ => false,
        }
    }

    fn draw(&self) -> RgbaImage {
        let (background, foreground) = self.colors();
        let rounding = self.rounding();

        RgbaImage::from_fn(GLYPH_SIZE, GLYPH_SIZE, |px, py| {
            let (x, y) = (px as f32 + 0.5, py as f32 + 0.5);
            if outside_corner(x, y, rounding) {
                TRANSPARENT
            } else if self.covers(x, y) {
                foreground
            } else {
                background
            }
        })
    }

    fn encode(&self) -> Result<String, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.draw()).write_to(&mut buffer, ImageFormat::Png)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(buffer.into_inner()))
    }
}

fn glyph_cache() -> &'static HashMap<ButtonGlyph, String> {
    static CACHE: OnceLock<HashMap<ButtonGlyph, String>> = OnceLock::new();
    CACHE.get_or_init(|| {
        ButtonGlyph::ALL
            .iter()
            .filter_map(|glyph| match glyph.encode() {
                Ok(encoded) => Some((*glyph, encoded)),
                Err(e) => {
                    warn!("Failed to encode {} glyph: {}", glyph.name(), e);
                    None
                }
            })
            .collect()
    })
}

fn near_segment(x: f32, y: f32, a: (f32, f32), b: (f32, f32), width: f32) -> bool {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = (((x - a.0) * dx + (y - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    (x - cx).powi(2) + (y - cy).powi(2) <= width * width
}

fn outside_corner(x: f32, y: f32, rounding: Rounding) -> bool {
    let size = GLYPH_SIZE as f32;
    let r = CORNER_RADIUS;
    let (left, right) = match rounding {
        Rounding::All => (true, true),
        Rounding::Left => (true, false),
        Rounding::Right => (false, true),
    };

    let cx = if x < r && left {
        r
    } else if x > size - r && right {
        size - r
    } else {
        return false;
    };
    let cy = if y < r {
        r
    } else if y > size - r {
        size - r
    } else {
        return false;
    };

    (x - cx).powi(2) + (y - cy).powi(2) > r * r
}
