//! Escalation tiers.
//!
//! Support is organised in three tiers of increasing specialist capability.
//! The derived ordering is the escalation ordering: `L1 < L2 < L3`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A support tier. Tickets live at exactly one tier at a time.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  /// First-line support; every new ticket starts here.
  #[default]
  L1,
  L2,
  L3,
}

impl Tier {
  /// All tiers in ascending order.
  pub const ALL: [Tier; 3] = [Tier::L1, Tier::L2, Tier::L3];

  /// The wire form (`"l1"`, `"l2"`, `"l3"`).
  pub fn as_str(self) -> &'static str {
    match self {
      Self::L1 => "l1",
      Self::L2 => "l2",
      Self::L3 => "l3",
    }
  }

  /// Human-facing label used in activity descriptions and notifications.
  pub fn label(self) -> &'static str {
    match self {
      Self::L1 => "L1",
      Self::L2 => "L2",
      Self::L3 => "L3",
    }
  }
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Tier {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "l1" => Ok(Self::L1),
      "l2" => Ok(Self::L2),
      "l3" => Ok(Self::L3),
      other => Err(Error::UnknownTier(other.to_owned())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ordering_is_ascending() {
    assert!(Tier::L1 < Tier::L2);
    assert!(Tier::L2 < Tier::L3);
    assert_eq!(Tier::ALL.iter().max(), Some(&Tier::L3));
  }

  #[test]
  fn parses_case_insensitively() {
    assert_eq!("L2".parse::<Tier>().unwrap(), Tier::L2);
    assert_eq!(" l3 ".parse::<Tier>().unwrap(), Tier::L3);
    assert!(matches!("l4".parse::<Tier>(), Err(Error::UnknownTier(_))));
  }

  #[test]
  fn serde_uses_lowercase() {
    assert_eq!(serde_json::to_string(&Tier::L1).unwrap(), "\"l1\"");
    let t: Tier = serde_json::from_str("\"l3\"").unwrap();
    assert_eq!(t, Tier::L3);
  }
}
