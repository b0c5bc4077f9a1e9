use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stored as an integer so that ordering by the column sorts Low < Medium < High.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum Priority {
    #[sea_orm(num_value = 0)]
    #[serde(alias = "low", alias = "LOW")]
    Low,
    #[default]
    #[sea_orm(num_value = 1)]
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[sea_orm(num_value = 2)]
    #[serde(alias = "high", alias = "HIGH")]
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority '{0}'")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("High", Priority::High)]
    #[case("high", Priority::High)]
    #[case(" LOW ", Priority::Low)]
    #[case("Medium", Priority::Medium)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: Priority) {
        assert_eq!(input.parse::<Priority>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_values() {
        assert!("urgent".parse::<Priority>().is_err());
        assert!("".parse::<Priority>().is_err());
    }

    #[test]
    fn serializes_with_variant_names() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"High\"");
        let parsed: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }
}
