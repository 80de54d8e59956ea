//! Terminal color palette, loaded from the system kitty theme when
//! available (~/.config/kitty/current-theme.conf), with a built-in
//! fallback palette.

use ratatui::style::Color;
use std::collections::HashMap;
use std::fs;

#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, focused field
    pub danger: Color,      // Error notices
    pub success: Color,     // Success notices, logged-in indicator
    pub warning: Color,     // Info notices, confirm popup
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Hints, placeholders
    pub inactive: Color,    // Unfocused borders
    pub bg_selected: Color, // Selection background
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired fallback
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(249, 226, 175),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            bg_selected: Color::Rgb(69, 71, 90),
        }
    }
}

impl Theme {
    pub fn load() -> Self {
        Self::load_kitty_theme().unwrap_or_default()
    }

    fn load_kitty_theme() -> Option<Self> {
        let theme_path = dirs::home_dir()?.join(".config/kitty/current-theme.conf");
        let content = fs::read_to_string(&theme_path).ok()?;
        let colors = Self::parse_kitty_conf(&content);

        if colors.is_empty() {
            return None;
        }

        let fallback = Theme::default();
        let get = |keys: &[&str], default: Color| {
            keys.iter()
                .find_map(|k| colors.get(*k))
                .copied()
                .unwrap_or(default)
        };

        Some(Self {
            accent: get(&["color4", "color12"], fallback.accent),
            danger: get(&["color1", "color9"], fallback.danger),
            success: get(&["color2", "color10"], fallback.success),
            warning: get(&["color3", "color11"], fallback.warning),
            text: get(&["foreground"], fallback.text),
            text_dim: get(&["color8"], fallback.text_dim),
            inactive: get(&["color8"], fallback.inactive),
            bg_selected: get(&["selection_background", "color0"], fallback.bg_selected),
        })
    }

    /// Parse kitty.conf format: `key #hexcolor`
    fn parse_kitty_conf(content: &str) -> HashMap<String, Color> {
        let mut colors = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.splitn(2, char::is_whitespace).collect();
            if parts.len() == 2 {
                if let Some(color) = Self::parse_hex_color(parts[1].trim()) {
                    colors.insert(parts[0].trim().to_string(), color);
                }
            }
        }

        colors
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');

        // Hex digits only; rules out multi-byte input before slicing
        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}
