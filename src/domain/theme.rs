use serde::{Deserialize, Serialize};

/// Visual theme selectable in the profile screen
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AppTheme {
    #[default]
    System,
    Light,
    Dark,
    Colorful,
}

impl AppTheme {
    pub fn all() -> &'static [AppTheme] {
        &[Self::System, Self::Light, Self::Dark, Self::Colorful]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Colorful => "colorful",
        }
    }

    /// Parse a theme name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "system" => Some(Self::System),
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "colorful" => Some(Self::Colorful),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_theme_names() {
        assert_eq!(AppTheme::parse("Dark"), Some(AppTheme::Dark));
        assert_eq!(AppTheme::parse(" colorful "), Some(AppTheme::Colorful));
        assert_eq!(AppTheme::parse("neon"), None);
        for theme in AppTheme::all() {
            assert_eq!(AppTheme::parse(theme.as_str()), Some(*theme));
        }
    }
}
