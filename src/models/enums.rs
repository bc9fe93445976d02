use serde::{Deserialize, Serialize};

/// Error for a string that names no variant of a wire enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {field} value: {value}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same string as `as_str`.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
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

str_enum!(
    /// Dashboard role, as issued by `/auth/login`.
    Role {
        Clinician => "clinician",
        Pharmacist => "pharmacist",
        Admin => "admin",
        Patient => "patient",
    }
);

str_enum!(
    /// Ordinal risk category returned by the risk model.
    RiskLevel {
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Critical => "Critical",
    }
);

impl Role {
    pub const ALL: [Role; 4] = [Role::Clinician, Role::Pharmacist, Role::Admin, Role::Patient];

    /// Interpret a raw server role; `None` for anything unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().to_ascii_lowercase().parse().ok()
    }
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Case-insensitive name lookup, e.g. `"high"` from the command line.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(raw))
    }

    /// Ordinal rank, Low = 0.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }

    /// Anything above Low gets alternatives and may be overridden.
    pub fn is_elevated(self) -> bool {
        self != Self::Low
    }

    /// High and Critical need clinical review.
    pub fn requires_review(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Low => "✅",
            Self::Medium => "⚠️",
            Self::High => "🔴",
            Self::Critical => "🚨",
        }
    }

    /// Color token used by the dashboard theme.
    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "#10b981",
            Self::Medium => "#f59e0b",
            Self::High => "#ef4444",
            Self::Critical => "#dc2626",
        }
    }
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}
