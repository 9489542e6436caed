//! # Theme System
//!
//! Rendering code never hardcodes colors; it reads them from the active
//! [`Theme`]. Themes are cycled at runtime with `t` and the choice is
//! persisted in the config file.
//!
//! ## Built-in Themes
//!
//! - **Catppuccin Mocha** (default)
//! - **Catppuccin Latte** (light)
//! - **Dracula**
//! - **Nord**
//! - **Gruvbox Dark**
//! - **Tokyo Night**

use crate::catalog::EventKind;
use ratatui::style::Color;

/// All colors used by the TUI, grouped by semantic role.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,

    /// Panel and modal background.
    pub bg: Color,
    /// Primary text.
    pub fg: Color,
    /// Secondary text: hints, separators, actors in the event log.
    pub fg_dim: Color,

    /// Branding, focused borders, selected-item background.
    pub accent: Color,
    /// Titles, search text, requests.
    pub secondary: Color,

    /// Hits, accepted drafts, finished playback.
    pub success: Color,
    /// Misses, rejected drafts.
    pub error: Color,
    /// Pending (draft) steps of two-phase panels.
    pub pending: Color,

    /// Background of the grabbed row in the menu editor.
    pub selection_bg: Color,
}

impl Theme {
    /// All built-in themes in cycling order.
    pub fn all() -> &'static [Theme] {
        &BUILT_IN_THEMES
    }

    /// Find a built-in theme by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<&'static Theme> {
        BUILT_IN_THEMES
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn default_theme() -> &'static Theme {
        &BUILT_IN_THEMES[0]
    }

    /// The theme after this one, wrapping around.
    pub fn next(&self) -> &'static Theme {
        let index = BUILT_IN_THEMES
            .iter()
            .position(|t| t.name == self.name)
            .map_or(0, |i| (i + 1) % BUILT_IN_THEMES.len());
        &BUILT_IN_THEMES[index]
    }

    /// Color of an event in the playback log.
    pub fn event_color(&self, kind: EventKind) -> Color {
        match kind {
            EventKind::Info => self.fg,
            EventKind::Request => self.secondary,
            EventKind::Response | EventKind::Output => self.accent,
            EventKind::Compute => self.fg_dim,
            EventKind::Hit | EventKind::Accept => self.success,
            EventKind::Miss | EventKind::Reject => self.error,
        }
    }
}

static BUILT_IN_THEMES: [Theme; 6] = [
    Theme {
        name: "Catppuccin Mocha",
        bg: Color::Rgb(30, 30, 46),            // base
        fg: Color::Rgb(205, 214, 244),         // text
        fg_dim: Color::Rgb(108, 112, 134),     // overlay0
        accent: Color::Rgb(137, 180, 250),     // blue
        secondary: Color::Rgb(249, 226, 175),  // yellow
        success: Color::Rgb(166, 227, 161),    // green
        error: Color::Rgb(243, 139, 168),      // red
        pending: Color::Rgb(203, 166, 247),    // mauve
        selection_bg: Color::Rgb(69, 71, 90),  // surface1
    },
    Theme {
        name: "Catppuccin Latte",
        bg: Color::Rgb(239, 241, 245),           // base
        fg: Color::Rgb(76, 79, 105),             // text
        fg_dim: Color::Rgb(156, 160, 176),       // overlay0
        accent: Color::Rgb(30, 102, 245),        // blue
        secondary: Color::Rgb(223, 142, 29),     // yellow
        success: Color::Rgb(64, 160, 43),        // green
        error: Color::Rgb(210, 15, 57),          // red
        pending: Color::Rgb(136, 57, 239),       // mauve
        selection_bg: Color::Rgb(188, 192, 204), // surface1
    },
    Theme {
        name: "Dracula",
        bg: Color::Rgb(40, 42, 54),
        fg: Color::Rgb(248, 248, 242),
        fg_dim: Color::Rgb(98, 114, 164),
        accent: Color::Rgb(139, 233, 253),
        secondary: Color::Rgb(241, 250, 140),
        success: Color::Rgb(80, 250, 123),
        error: Color::Rgb(255, 85, 85),
        pending: Color::Rgb(189, 147, 249),
        selection_bg: Color::Rgb(68, 71, 90),
    },
    Theme {
        name: "Nord",
        bg: Color::Rgb(46, 52, 64),
        fg: Color::Rgb(216, 222, 233),
        fg_dim: Color::Rgb(76, 86, 106),
        accent: Color::Rgb(136, 192, 208),
        secondary: Color::Rgb(235, 203, 139),
        success: Color::Rgb(163, 190, 140),
        error: Color::Rgb(191, 97, 106),
        pending: Color::Rgb(180, 142, 173),
        selection_bg: Color::Rgb(67, 76, 94),
    },
    Theme {
        name: "Gruvbox Dark",
        bg: Color::Rgb(40, 40, 40),
        fg: Color::Rgb(235, 219, 178),
        fg_dim: Color::Rgb(146, 131, 116),
        accent: Color::Rgb(131, 165, 152),
        secondary: Color::Rgb(250, 189, 47),
        success: Color::Rgb(184, 187, 38),
        error: Color::Rgb(251, 73, 52),
        pending: Color::Rgb(211, 134, 155),
        selection_bg: Color::Rgb(80, 73, 69),
    },
    Theme {
        name: "Tokyo Night",
        bg: Color::Rgb(26, 27, 38),
        fg: Color::Rgb(169, 177, 214),
        fg_dim: Color::Rgb(86, 95, 137),
        accent: Color::Rgb(122, 162, 247),
        secondary: Color::Rgb(224, 175, 104),
        success: Color::Rgb(115, 218, 202),
        error: Color::Rgb(247, 118, 142),
        pending: Color::Rgb(187, 154, 247),
        selection_bg: Color::Rgb(41, 46, 66),
    },
];
