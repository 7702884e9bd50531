use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Mark rounding policies configurable per subject (with optional per-part
/// overrides). Wire values are the human-readable labels used by the
/// platform's exam setup screens; anything unrecognized falls back to
/// `At Actual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMethod {
    #[default]
    AtActual,
    AlwaysDown,
    AlwaysUp,
    WithoutFraction,
}

impl RoundingMethod {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Always Down" => RoundingMethod::AlwaysDown,
            "Always Up" => RoundingMethod::AlwaysUp,
            "Without Fraction" => RoundingMethod::WithoutFraction,
            _ => RoundingMethod::AtActual,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoundingMethod::AtActual => "At Actual",
            RoundingMethod::AlwaysDown => "Always Down",
            RoundingMethod::AlwaysUp => "Always Up",
            RoundingMethod::WithoutFraction => "Without Fraction",
        }
    }

    pub fn apply(self, mark: f64) -> f64 {
        match self {
            RoundingMethod::AtActual => mark,
            RoundingMethod::AlwaysDown => mark.floor(),
            RoundingMethod::AlwaysUp => mark.ceil(),
            // Half-up at .50: 2.49 -> 2, 2.50 -> 3.
            RoundingMethod::WithoutFraction => {
                if mark - mark.floor() >= 0.5 {
                    mark.floor() + 1.0
                } else {
                    mark.floor()
                }
            }
        }
    }
}

impl Serialize for RoundingMethod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for RoundingMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| RoundingMethod::parse(&s)).unwrap_or_default())
    }
}
