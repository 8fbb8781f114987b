use crate::store::Role;

use super::claims::Identity;

/// Operations a caller can attempt against todo rows. `ListAll` is the
/// cross-tenant listing; the per-owner listing needs no decision because it
/// is scoped to the caller by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoAction {
    Read,
    Update,
    Delete,
    ListAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Decide whether `identity` may perform `action` on a row owned by
/// `owner_id`. Pass `None` when the action targets no particular row (the
/// admin endpoints), so the owner-match rule can never apply. Rules in order:
///
/// 1. admins may list all rows and delete any row;
/// 2. owners may do anything to their own rows;
/// 3. everything else is denied.
///
/// Admins get no create/update rights over other users' rows, and a single
/// `Read` of a foreign row falls through to rule 3 even for admins; only the
/// unfiltered listing exposes foreign rows to them.
pub fn authorize(identity: &Identity, owner_id: Option<i64>, action: TodoAction) -> Access {
    if identity.role == Role::Admin && matches!(action, TodoAction::ListAll | TodoAction::Delete) {
        return Access::Allow;
    }
    match owner_id {
        Some(owner) if owner == identity.id => Access::Allow,
        _ => Access::Deny,
    }
}
