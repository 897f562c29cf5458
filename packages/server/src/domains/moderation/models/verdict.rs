use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of reviewing one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    #[default]
    NotSet,
    Accepted,
    Declined,
}

impl Verdict {
    pub fn is_set(&self) -> bool {
        !matches!(self, Verdict::NotSet)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::NotSet => "not_set",
            Verdict::Accepted => "accepted",
            Verdict::Declined => "declined",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_set" => Ok(Verdict::NotSet),
            "accepted" => Ok(Verdict::Accepted),
            "declined" => Ok(Verdict::Declined),
            other => Err(format!("unknown verdict: {}", other)),
        }
    }
}
