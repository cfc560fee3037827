//! Theme
//!
//! Applies the persisted theme to the document root before any UI exists.

use std::collections::BTreeMap;

use crate::data::{keys, KeyValueStore};

/// Theme used when none is stored
pub const DEFAULT_THEME: &str = "dark";

/// Attribute on the document root holding the theme name
pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Root of the rendered UI. Attributes set here are visible to every
/// surface created afterwards.
#[derive(Debug, Default)]
pub struct Document {
    attributes: BTreeMap<String, String>,
    mounted: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if self.mounted {
            tracing::warn!("Setting {} after the UI was mounted", name);
        }
        self.attributes.insert(name.to_string(), value.to_string());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn theme(&self) -> &str {
        self.attribute(THEME_ATTRIBUTE).unwrap_or(DEFAULT_THEME)
    }

    /// Mark the UI tree as mounted and hand out the palette it paints with
    pub fn mount(&mut self) -> Palette {
        self.mounted = true;
        Palette::for_theme(self.theme())
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

/// Read the stored theme (default `dark`) and set it on the document
pub fn apply_saved_theme(store: &dyn KeyValueStore, document: &mut Document) -> String {
    let theme = store
        .get(keys::THEME)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_THEME.to_string());
    document.set_attribute(THEME_ATTRIBUTE, &theme);
    tracing::debug!("Applied theme {}", theme);
    theme
}

/// Colors for overlay painting, 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: u32,
    pub border: u32,
    pub foreground: u32,
    pub muted: u32,
    pub accent: u32,
}

impl Palette {
    pub const DARK: Palette = Palette {
        background: 0x1e222d,
        border: 0x363a45,
        foreground: 0xd1d4dc,
        muted: 0x787b86,
        accent: 0x2962ff,
    };

    pub const LIGHT: Palette = Palette {
        background: 0xffffff,
        border: 0xe0e3eb,
        foreground: 0x131722,
        muted: 0x787b86,
        accent: 0x2962ff,
    };

    /// Unknown theme names paint with the dark palette
    pub fn for_theme(theme: &str) -> Self {
        match theme {
            "light" => Self::LIGHT,
            _ => Self::DARK,
        }
    }
}
