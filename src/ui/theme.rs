use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeName {
    TokyoNight,
    #[default]
    CatppuccinMocha,
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub fg_dim: Color,
    pub border: Color,
    pub accent: Color,
    pub title: Color,

    // Playback indicators
    pub playing: Color,
    pub idle: Color,
    pub error: Color,
    pub info: Color,
}

impl Theme {
    pub const fn tokyo_night() -> Self {
        Self {
            bg: Color::Rgb(26, 27, 38),      // #1a1b26
            fg: Color::Rgb(192, 202, 245),   // #c0caf5
            fg_dim: Color::Rgb(86, 95, 137), // #565f89
            border: Color::Rgb(61, 89, 161), // #3d59a1
            accent: Color::Rgb(125, 207, 255), // #7dcfff
            title: Color::Rgb(122, 162, 247), // #7aa2f7

            playing: Color::Rgb(158, 206, 106), // #9ece6a
            idle: Color::Rgb(224, 175, 104),    // #e0af68
            error: Color::Rgb(247, 118, 142),   // #f7768e
            info: Color::Rgb(187, 154, 247),    // #bb9af7
        }
    }

    pub const fn catppuccin_mocha() -> Self {
        Self {
            bg: Color::Rgb(30, 30, 46),         // #1e1e2e
            fg: Color::Rgb(205, 214, 244),      // #cdd6f4
            fg_dim: Color::Rgb(108, 112, 134),  // #6c7086
            border: Color::Rgb(137, 180, 250),  // #89b4fa
            accent: Color::Rgb(148, 226, 213),  // #94e2d5
            title: Color::Rgb(137, 180, 250),   // #89b4fa

            playing: Color::Rgb(166, 227, 161), // #a6e3a1
            idle: Color::Rgb(249, 226, 175),    // #f9e2af
            error: Color::Rgb(243, 139, 168),   // #f38ba8
            info: Color::Rgb(203, 166, 247),    // #cba6f7
        }
    }

    pub const fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::TokyoNight => Self::tokyo_night(),
            ThemeName::CatppuccinMocha => Self::catppuccin_mocha(),
        }
    }

    pub fn border_style(&self) -> Style {
        Style::new().fg(self.border)
    }

    pub fn title_style(&self) -> Style {
        Style::new().fg(self.title).add_modifier(Modifier::BOLD)
    }

    pub fn label_style(&self) -> Style {
        Style::new().fg(self.fg_dim)
    }

    pub fn value_style(&self) -> Style {
        Style::new().fg(self.fg)
    }

    pub fn header_style(&self) -> Style {
        Style::new().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn state_color(&self, playing: bool) -> Color {
        if playing { self.playing } else { self.idle }
    }
}

static THEME: OnceLock<Theme> = OnceLock::new();

/// First call wins; later calls are ignored.
pub fn init_theme(name: ThemeName) {
    let _ = THEME.set(Theme::from_name(name));
}

pub fn get_theme() -> &'static Theme {
    THEME.get_or_init(Theme::catppuccin_mocha)
}
