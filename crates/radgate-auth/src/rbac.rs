use serde::{Deserialize, Serialize};

/// Role ordering from spec §4.6: `viewer < member < operator < admin
/// < superadmin`. Derived `Ord` follows declaration order, which is
/// exactly this ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Member,
    Operator,
    Admin,
    Superadmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Member => "member",
            Role::Operator => "operator",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }

    /// `admin`/`superadmin` can access any role-restricted route even
    /// without explicit inclusion in its allow list (spec §4.6).
    fn bypasses_allow_lists(self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    /// Gate check for a route requiring at least `min_role`.
    pub fn satisfies(self, min_role: Role) -> bool {
        self.bypasses_allow_lists() || self >= min_role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_spec_ladder() {
        assert!(Role::Viewer < Role::Member);
        assert!(Role::Member < Role::Operator);
        assert!(Role::Operator < Role::Admin);
        assert!(Role::Admin < Role::Superadmin);
    }

    #[test]
    fn member_does_not_satisfy_operator_gate() {
        assert!(!Role::Member.satisfies(Role::Operator));
    }

    #[test]
    fn admin_bypasses_any_gate() {
        assert!(Role::Admin.satisfies(Role::Superadmin));
    }
}
