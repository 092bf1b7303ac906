//! Category marker colours.
//!
//! Lookup is total: a category missing from the table, including the empty
//! string, resolves to the fallback colour.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The categories the bundled palette knows about.
pub const KNOWN_CATEGORIES: [&str; 5] = ["Shelter", "Food", "Medical", "Hygiene", "Community"];

/// An RGB colour triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Grey used for unrecognised categories.
    pub const FALLBACK: Rgb = Rgb([80, 80, 80]);
}

/// Exact-match category → colour table with a fallback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: BTreeMap<String, Rgb>,
    fallback: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        let colors = KNOWN_CATEGORIES
            .iter()
            .zip([
                [200, 0, 0],
                [0, 120, 0],
                [0, 0, 200],
                [120, 120, 0],
                [120, 0, 120],
            ])
            .map(|(name, rgb)| ((*name).to_string(), Rgb(rgb)))
            .collect();
        Self {
            colors,
            fallback: Rgb::FALLBACK,
        }
    }
}

impl Palette {
    /// Build a palette from an explicit table and fallback.
    #[must_use]
    pub fn new(colors: BTreeMap<String, Rgb>, fallback: Rgb) -> Self {
        Self { colors, fallback }
    }

    /// Colour for a category.
    #[must_use]
    pub fn color_for(&self, category: &str) -> Rgb {
        self.colors.get(category).copied().unwrap_or(self.fallback)
    }

    /// The fallback colour.
    #[must_use]
    pub fn fallback(&self) -> Rgb {
        self.fallback
    }

    /// Categories with a dedicated colour.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.colors.keys().map(String::as_str)
    }
}

impl From<&crate::config::PaletteConfig> for Palette {
    fn from(config: &crate::config::PaletteConfig) -> Self {
        let colors = config
            .colors
            .iter()
            .map(|(name, rgb)| (name.clone(), Rgb(*rgb)))
            .collect();
        Self::new(colors, Rgb(config.fallback))
    }
}
