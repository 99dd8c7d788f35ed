//! Workspace access rules.
//!
//! Single source of truth for "can user U do X in workspace W?" decisions.
//! The store layer fetches the workspace and membership rows and defers the
//! decision to these functions, so every component authorizes identically.
//!
//! The permission vocabulary is fixed: owner, member, can-edit, can-share.
//! There is no policy engine behind this module.

use crate::error::{Error, Result};
use crate::models::{Invitation, Workspace, WorkspaceMember, WorkspaceRole};

/// True iff the user owns the workspace or holds a membership with
/// `can_edit`. Owners always have edit rights.
pub fn has_edit_right(
    workspace: &Workspace,
    user_id: i64,
    membership: Option<&WorkspaceMember>,
) -> bool {
    workspace.owner_user_id == user_id || membership.is_some_and(|m| m.can_edit)
}

/// True iff the user owns the workspace, holds `can_share`, or holds the
/// `Admin` role.
pub fn has_share_right(
    workspace: &Workspace,
    user_id: i64,
    membership: Option<&WorkspaceMember>,
) -> bool {
    workspace.owner_user_id == user_id
        || membership.is_some_and(|m| m.can_share || m.role == WorkspaceRole::Admin)
}

/// True iff the user may read notes in the workspace. Any membership
/// suffices; view rights do not require `can_edit`.
pub fn has_view_right(
    workspace: &Workspace,
    user_id: i64,
    membership: Option<&WorkspaceMember>,
) -> bool {
    workspace.owner_user_id == user_id || membership.is_some()
}

/// Authorize removing `target_user_id` from the workspace.
///
/// Only the owner may remove members, and the owner's own entry is never
/// removable.
pub fn check_remove_member(workspace: &Workspace, caller_id: i64, target_user_id: i64) -> Result<()> {
    if workspace.owner_user_id != caller_id {
        return Err(Error::PermissionDenied(
            "only the workspace owner may remove members".to_string(),
        ));
    }
    if target_user_id == workspace.owner_user_id {
        return Err(Error::BusinessRule(
            "the workspace owner cannot be removed".to_string(),
        ));
    }
    Ok(())
}

/// Authorize changing `target_user_id`'s edit/share flags.
///
/// Owner-only, and never applicable to the owner's own entry. A member
/// attempting to modify themself fails the owner check first.
pub fn check_update_permissions(
    workspace: &Workspace,
    caller_id: i64,
    target_user_id: i64,
) -> Result<()> {
    if workspace.owner_user_id != caller_id {
        return Err(Error::PermissionDenied(
            "only the workspace owner may change member permissions".to_string(),
        ));
    }
    if target_user_id == workspace.owner_user_id {
        return Err(Error::BusinessRule(
            "the owner's own permissions cannot be changed".to_string(),
        ));
    }
    Ok(())
}

/// Authorize a self-removal. Any non-owner member may leave; the owner must
/// delete the workspace instead since ownership transfer is unsupported.
pub fn check_leave(workspace: &Workspace, user_id: i64) -> Result<()> {
    if workspace.owner_user_id == user_id {
        return Err(Error::BusinessRule(
            "the owner cannot leave; transfer or delete the workspace instead".to_string(),
        ));
    }
    Ok(())
}

/// Authorize deleting the workspace itself. Owner-only.
pub fn check_delete_workspace(workspace: &Workspace, caller_id: i64) -> Result<()> {
    if workspace.owner_user_id != caller_id {
        return Err(Error::PermissionDenied(
            "only the workspace owner may delete it".to_string(),
        ));
    }
    Ok(())
}

/// Authorize the invitee responding (accept/reject) to an invitation.
///
/// The caller must be the invitee and the invitation must still be pending;
/// terminal states admit no further transitions.
pub fn check_respond(invitation: &Invitation, caller_id: i64) -> Result<()> {
    if invitation.invitee_user_id != caller_id {
        return Err(Error::PermissionDenied(
            "only the invitee may respond to this invitation".to_string(),
        ));
    }
    if invitation.status.is_terminal() {
        return Err(Error::InvalidState(
            "invitation has already been responded to or revoked".to_string(),
        ));
    }
    Ok(())
}

/// Authorize revoking an invitation. Permitted for the inviter or the
/// workspace owner, only while pending.
pub fn check_revoke(
    invitation: &Invitation,
    workspace_owner_id: i64,
    caller_id: i64,
) -> Result<()> {
    if caller_id != invitation.inviter_user_id && caller_id != workspace_owner_id {
        return Err(Error::PermissionDenied(
            "only the inviter or the workspace owner may revoke this invitation".to_string(),
        ));
    }
    if invitation.status.is_terminal() {
        return Err(Error::InvalidState(
            "only pending invitations can be revoked".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{InvitationStatus, WorkspaceType};
    use chrono::Utc;

    fn workspace(owner: i64) -> Workspace {
        Workspace {
            id: 1,
            name: "w".to_string(),
            workspace_type: WorkspaceType::Team,
            owner_user_id: owner,
            created_at_utc: Utc::now(),
        }
    }

    fn member(user_id: i64, role: WorkspaceRole, can_edit: bool, can_share: bool) -> WorkspaceMember {
        WorkspaceMember {
            workspace_id: 1,
            user_id,
            role,
            can_edit,
            can_share,
            joined_at_utc: Utc::now(),
        }
    }

    fn invitation(inviter: i64, invitee: i64, status: InvitationStatus) -> Invitation {
        Invitation {
            id: 10,
            workspace_id: 1,
            inviter_user_id: inviter,
            invitee_user_id: invitee,
            can_edit: false,
            can_share: false,
            message: None,
            status,
            created_at_utc: Utc::now(),
            responded_at_utc: None,
        }
    }

    #[test]
    fn test_owner_always_has_every_right() {
        let w = workspace(1);
        assert!(has_edit_right(&w, 1, None));
        assert!(has_share_right(&w, 1, None));
        assert!(has_view_right(&w, 1, None));
    }

    #[test]
    fn test_member_edit_right_requires_flag() {
        let w = workspace(1);
        let plain = member(2, WorkspaceRole::Member, false, false);
        let editor = member(2, WorkspaceRole::Member, true, false);
        assert!(!has_edit_right(&w, 2, Some(&plain)));
        assert!(has_edit_right(&w, 2, Some(&editor)));
    }

    #[test]
    fn test_admin_role_carries_share_right() {
        let w = workspace(1);
        let admin = member(2, WorkspaceRole::Admin, false, false);
        assert!(has_share_right(&w, 2, Some(&admin)));
        // ...but not edit rights.
        assert!(!has_edit_right(&w, 2, Some(&admin)));
    }

    #[test]
    fn test_any_membership_grants_view() {
        let w = workspace(1);
        let plain = member(2, WorkspaceRole::Member, false, false);
        assert!(has_view_right(&w, 2, Some(&plain)));
        assert!(!has_view_right(&w, 3, None));
    }

    #[test]
    fn test_non_owner_cannot_remove_members() {
        let w = workspace(1);
        let err = check_remove_member(&w, 2, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_owner_entry_is_not_removable() {
        let w = workspace(1);
        let err = check_remove_member(&w, 1, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
    }

    #[test]
    fn test_member_cannot_update_own_permissions() {
        let w = workspace(1);
        let err = check_update_permissions(&w, 2, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_owner_permissions_are_immutable() {
        let w = workspace(1);
        let err = check_update_permissions(&w, 1, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
    }

    #[test]
    fn test_owner_cannot_leave() {
        let w = workspace(1);
        let err = check_leave(&w, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
        assert!(check_leave(&w, 2).is_ok());
    }

    #[test]
    fn test_only_invitee_responds() {
        let inv = invitation(1, 2, InvitationStatus::Pending);
        assert!(check_respond(&inv, 2).is_ok());
        let err = check_respond(&inv, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_terminal_states_reject_response() {
        for status in [
            InvitationStatus::Accepted,
            InvitationStatus::Rejected,
            InvitationStatus::Revoked,
        ] {
            let inv = invitation(1, 2, status);
            let err = check_respond(&inv, 2).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidState);
        }
    }

    #[test]
    fn test_revoke_permitted_for_inviter_and_owner() {
        let inv = invitation(5, 2, InvitationStatus::Pending);
        assert!(check_revoke(&inv, 1, 5).is_ok());
        assert!(check_revoke(&inv, 1, 1).is_ok());
        let err = check_revoke(&inv, 1, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_revoke_requires_pending() {
        let inv = invitation(5, 2, InvitationStatus::Accepted);
        let err = check_revoke(&inv, 1, 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
