use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::surface::{rgb8, Rgb};

/// Phosphor coating colours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PhosphorColor {
    #[default]
    Green,
    Amber,
    Blue,
    White,
}

const HOT_BOOST: u8 = 100;

impl PhosphorColor {
    pub const ALL: [PhosphorColor; 4] = [
        PhosphorColor::Green,
        PhosphorColor::Amber,
        PhosphorColor::Blue,
        PhosphorColor::White,
    ];

    pub fn rgb8(self) -> (u8, u8, u8) {
        match self {
            PhosphorColor::Green => (57, 255, 20),
            PhosphorColor::Amber => (255, 191, 0),
            PhosphorColor::Blue => (0, 212, 255),
            PhosphorColor::White => (220, 220, 220),
        }
    }

    /// The brightened core colour: each channel plus 100, saturating at 255.
    pub fn hot_rgb8(self) -> (u8, u8, u8) {
        let (r, g, b) = self.rgb8();
        (
            r.saturating_add(HOT_BOOST),
            g.saturating_add(HOT_BOOST),
            b.saturating_add(HOT_BOOST),
        )
    }

    pub fn rgb(self) -> Rgb {
        let (r, g, b) = self.rgb8();
        rgb8(r, g, b)
    }

    pub fn hot(self) -> Rgb {
        let (r, g, b) = self.hot_rgb8();
        rgb8(r, g, b)
    }
}
