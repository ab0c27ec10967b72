//! The authenticated caller of an operation.

use uuid::Uuid;

use super::user::Role;

/// Identity and role taken from verified token claims. Never built from
/// request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }

    /// Owner-scoped read access: the owner, or any admin.
    pub fn can_view(&self, owner_id: Uuid) -> bool {
        self.owns(owner_id) || self.is_admin()
    }
}
