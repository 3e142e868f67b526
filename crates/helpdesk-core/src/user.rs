//! Users: support staff and the clients they serve.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, tier::Tier};

/// The role a user holds. Only the three `Employee*` roles are support staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  EmployeeL1,
  EmployeeL2,
  EmployeeL3,
  Client,
  Admin,
}

impl Role {
  /// The tier a staff role works at; `None` for roles that cannot claim
  /// tickets.
  pub fn staff_tier(self) -> Option<Tier> {
    match self {
      Self::EmployeeL1 => Some(Tier::L1),
      Self::EmployeeL2 => Some(Tier::L2),
      Self::EmployeeL3 => Some(Tier::L3),
      Self::Client | Self::Admin => None,
    }
  }

  pub fn is_staff(self) -> bool { self.staff_tier().is_some() }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "employee_l1" => Ok(Self::EmployeeL1),
      "employee_l2" => Ok(Self::EmployeeL2),
      "employee_l3" => Ok(Self::EmployeeL3),
      "client" => Ok(Self::Client),
      "admin" => Ok(Self::Admin),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

/// A person known to the helpdesk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id: String,
  pub name:    String,
  #[serde(default)]
  pub email:   Option<String>,
  pub role:    Role,
}

impl User {
  pub fn new(
    user_id: impl Into<String>,
    name: impl Into<String>,
    role: Role,
  ) -> Self {
    Self {
      user_id: user_id.into(),
      name: name.into(),
      email: None,
      role,
    }
  }
}
