//! Level resolver: maps a user to the escalation tier they work at.

use crate::{tier::Tier, user::User};

/// The tier `user` works at.
///
/// Total over all roles: non-staff roles resolve to [`Tier::L1`]. Claim and
/// escalation rights are gated on the role separately, so the default never
/// grants anything on its own.
pub fn level_of(user: &User) -> Tier { user.role.staff_tier().unwrap_or_default() }

#[cfg(test)]
mod tests {
  use super::*;
  use crate::user::Role;

  #[test]
  fn staff_roles_map_to_their_tier() {
    assert_eq!(level_of(&User::new("a", "A", Role::EmployeeL1)), Tier::L1);
    assert_eq!(level_of(&User::new("b", "B", Role::EmployeeL2)), Tier::L2);
    assert_eq!(level_of(&User::new("c", "C", Role::EmployeeL3)), Tier::L3);
  }

  #[test]
  fn other_roles_default_to_l1() {
    assert_eq!(level_of(&User::new("d", "D", Role::Client)), Tier::L1);
    assert_eq!(level_of(&User::new("e", "E", Role::Admin)), Tier::L1);
  }
}
