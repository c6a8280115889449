//! Accent theming as a plain value.
//!
//! Rendering layers receive a [`Theme`] and apply the CSS variables it
//! produces themselves; nothing here touches process-wide state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    #[default]
    Cyan,
    Green,
    Amber,
    Blue,
    Violet,
    Rose,
    Pink,
    Teal,
}

impl ThemeColor {
    pub const ALL: [ThemeColor; 8] = [
        ThemeColor::Cyan,
        ThemeColor::Green,
        ThemeColor::Amber,
        ThemeColor::Blue,
        ThemeColor::Violet,
        ThemeColor::Rose,
        ThemeColor::Pink,
        ThemeColor::Teal,
    ];

    /// The 500 shade of the palette entry
    pub fn hex(self) -> &'static str {
        match self {
            ThemeColor::Cyan => "#06b6d4",
            ThemeColor::Green => "#22c55e",
            ThemeColor::Amber => "#f59e0b",
            ThemeColor::Blue => "#3b82f6",
            ThemeColor::Violet => "#8b5cf6",
            ThemeColor::Rose => "#f43f5e",
            ThemeColor::Pink => "#ec4899",
            ThemeColor::Teal => "#14b8a6",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub accent: ThemeColor,
}

impl Theme {
    pub fn new(accent: ThemeColor) -> Self {
        Self { accent }
    }

    /// CSS custom properties a renderer should apply to its root element
    pub fn css_variables(&self) -> Vec<(&'static str, String)> {
        vec![
            ("--lk-theme-color", self.accent.hex().to_string()),
            (
                "--lk-drop-shadow",
                "var(--lk-theme-color) 0px 0px 18px".to_string(),
            ),
        ]
    }
}
