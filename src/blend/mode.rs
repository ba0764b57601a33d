use std::str::FromStr;

use crate::foundation::error::{StrataError, StrataResult};

/// Per-pixel color-combination function applied before alpha-over compositing.
///
/// Serialized as the canonical snake_case name (`"soft_light"`, `"color_dodge"`, ...).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Overlay color replaces base color.
    #[default]
    Normal,
    /// `b * o`
    Multiply,
    /// `1 - (1 - b) * (1 - o)`
    Screen,
    /// Multiply or screen, selected by the base channel.
    Overlay,
    /// Darken or lighten by the overlay, gentler than hard light.
    SoftLight,
    /// Multiply or screen, selected by the overlay channel.
    HardLight,
    /// `b / (1 - o)`
    ColorDodge,
    /// `1 - (1 - b) / o`
    ColorBurn,
    /// `min(b, o)`
    Darken,
    /// `max(b, o)`
    Lighten,
    /// `|b - o|`
    Difference,
    /// `b + o - 2 * b * o`
    Exclusion,
}

impl BlendMode {
    /// Every supported mode, in UI order.
    pub const ALL: [BlendMode; 12] = [
        Self::Normal,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::SoftLight,
        Self::HardLight,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::Darken,
        Self::Lighten,
        Self::Difference,
        Self::Exclusion,
    ];

    /// Canonical snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::SoftLight => "soft_light",
            Self::HardLight => "hard_light",
            Self::ColorDodge => "color_dodge",
            Self::ColorBurn => "color_burn",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
        }
    }

    /// Localized name shown by the Chinese layer-editing UI.
    pub fn localized_name(self) -> &'static str {
        match self {
            Self::Normal => "正常",
            Self::Multiply => "正片叠底",
            Self::Screen => "滤色",
            Self::Overlay => "叠加",
            Self::SoftLight => "柔光",
            Self::HardLight => "强光",
            Self::ColorDodge => "颜色减淡",
            Self::ColorBurn => "颜色加深",
            Self::Darken => "变暗",
            Self::Lighten => "变亮",
            Self::Difference => "差值",
            Self::Exclusion => "排除",
        }
    }

    /// Four-byte blend key used in PSD layer records.
    pub fn psd_key(self) -> [u8; 4] {
        match self {
            Self::Normal => *b"norm",
            Self::Multiply => *b"mul ",
            Self::Screen => *b"scrn",
            Self::Overlay => *b"over",
            Self::SoftLight => *b"sLit",
            Self::HardLight => *b"hLit",
            Self::ColorDodge => *b"div ",
            Self::ColorBurn => *b"idiv",
            Self::Darken => *b"dark",
            Self::Lighten => *b"lite",
            Self::Difference => *b"diff",
            Self::Exclusion => *b"smud",
        }
    }

    /// Inverse of [`BlendMode::psd_key`]. Keys for modes outside the supported set yield `None`.
    pub fn from_psd_key(key: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.psd_key() == key)
    }

    /// Parse any known spelling of a mode name.
    ///
    /// Accepts canonical names, localized names, and the spellings PSD libraries produce:
    /// case-insensitive, `-` or `_` separators, `blendmode.` / `blend_mode.` / `blend.`
    /// prefixes, or no separators at all (`colordodge`).
    pub fn parse_lenient(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if let Some(m) = Self::ALL.into_iter().find(|m| m.localized_name() == trimmed) {
            return Some(m);
        }

        let lower = trimmed.to_ascii_lowercase();
        let mut key = lower.as_str();
        for prefix in ["blendmode.", "blend_mode.", "blend."] {
            if let Some(rest) = key.strip_prefix(prefix) {
                key = rest;
                break;
            }
        }
        let squashed: String = key.chars().filter(|c| !matches!(c, '-' | '_' | '.' | ' ')).collect();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().replace('_', "") == squashed)
    }

    /// Parse a mode name, falling back to [`BlendMode::Normal`] for unknown names.
    ///
    /// The fallback is logged so that bad upstream data stays visible.
    pub fn parse_or_normal(name: &str) -> Self {
        Self::parse_lenient(name).unwrap_or_else(|| {
            tracing::warn!(blend_mode = name, "unsupported blend mode, using normal");
            Self::Normal
        })
    }
}

impl std::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlendMode {
    type Err = StrataError;

    fn from_str(s: &str) -> StrataResult<Self> {
        Self::parse_lenient(s).ok_or_else(|| StrataError::unsupported_blend_mode(s.to_string()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/mode.rs"]
mod tests;
