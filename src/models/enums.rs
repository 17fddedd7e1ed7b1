use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(StartupStage {
    Idea => "idea",
    Mvp => "mvp",
    Growth => "growth",
    Scale => "scale",
});

str_enum!(OAuthProvider {
    Google => "google",
});

str_enum!(Difficulty {
    Low => "Low",
    Medium => "Medium",
    High => "High",
});

str_enum!(Theme {
    Light => "light",
    Dark => "dark",
    System => "system",
});

impl Difficulty {
    /// Lenient parse for LLM output ("medium", "HIGH", "Medium-High").
    pub fn from_loose(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        if lower.starts_with("high") {
            Self::High
        } else if lower.starts_with("low") {
            Self::Low
        } else {
            Self::Medium
        }
    }
}

impl StartupStage {
    /// Lenient parse for user input; unknown stages fall back to `Mvp`.
    pub fn from_loose(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "idea" => Self::Idea,
            "growth" => Self::Growth,
            "scale" => Self::Scale,
            _ => Self::Mvp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stage_round_trips_through_str() {
        for stage in [
            StartupStage::Idea,
            StartupStage::Mvp,
            StartupStage::Growth,
            StartupStage::Scale,
        ] {
            assert_eq!(StartupStage::from_str(stage.as_str()).unwrap(), stage);
        }
    }

    #[test]
    fn unknown_value_is_invalid_enum() {
        let err = Theme::from_str("neon").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn difficulty_loose_parsing() {
        assert_eq!(Difficulty::from_loose("HIGH"), Difficulty::High);
        assert_eq!(Difficulty::from_loose(" low "), Difficulty::Low);
        assert_eq!(Difficulty::from_loose("whatever"), Difficulty::Medium);
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&StartupStage::Growth).unwrap();
        assert_eq!(json, "\"growth\"");
        let parsed: Difficulty = serde_json::from_str("\"High\"").unwrap();
        assert_eq!(parsed, Difficulty::High);
    }
}
