//! Invitation workflow: pending → accepted/rejected/revoked, all terminal.

use notarium_db::test_fixtures::{unique_username, TestDatabase};
use notarium_db::{
    CreateWorkspaceRequest, ErrorKind, InvitationStatus, InvitationWorkflow, MembershipRegistry,
    SendInvitationRequest, User, WorkspaceStore, WorkspaceType,
};

async fn team_workspace(test_db: &TestDatabase, owner: &User) -> i64 {
    test_db
        .db
        .workspaces
        .create(
            owner.id,
            CreateWorkspaceRequest {
                name: "shared".to_string(),
                workspace_type: WorkspaceType::Team,
            },
        )
        .await
        .expect("create workspace")
        .id
}

fn invite(username: &str, can_edit: bool) -> SendInvitationRequest {
    SendInvitationRequest {
        invitee_username: username.to_string(),
        can_edit,
        can_share: false,
        message: Some("join us".to_string()),
    }
}

#[tokio::test]
async fn test_invite_accept_grants_membership_with_flags() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("inv-own").await;
    let invitee = test_db.register_user("inv-new").await;
    let ws = team_workspace(&test_db, &owner).await;

    let invitation_id = test_db
        .db
        .invitations
        .send(ws, owner.id, invite(&invitee.username, true))
        .await
        .expect("send invitation");

    let pending = test_db
        .db
        .invitations
        .list_for_user(invitee.id)
        .await
        .expect("list invitations");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].invitation_id, invitation_id);
    assert_eq!(pending[0].status, InvitationStatus::Pending);
    assert_eq!(pending[0].inviter_username, owner.username);
    assert!(pending[0].responded_at_utc.is_none());

    test_db
        .db
        .invitations
        .accept(invitation_id, invitee.id)
        .await
        .expect("accept");

    assert!(test_db.db.members.is_member(ws, invitee.id).await.unwrap());
    assert!(test_db.db.members.has_edit_right(ws, invitee.id).await.unwrap());
    assert!(!test_db.db.members.has_share_right(ws, invitee.id).await.unwrap());

    let responded = test_db
        .db
        .invitations
        .list_for_user(invitee.id)
        .await
        .expect("list invitations");
    assert_eq!(responded[0].status, InvitationStatus::Accepted);
    assert!(responded[0].responded_at_utc.is_some());
}

#[tokio::test]
async fn test_reject_leaves_registry_untouched() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("rej-own").await;
    let invitee = test_db.register_user("rej-new").await;
    let ws = team_workspace(&test_db, &owner).await;

    let invitation_id = test_db
        .db
        .invitations
        .send(ws, owner.id, invite(&invitee.username, true))
        .await
        .expect("send invitation");

    test_db
        .db
        .invitations
        .reject(invitation_id, invitee.id)
        .await
        .expect("reject");
    assert!(!test_db.db.members.is_member(ws, invitee.id).await.unwrap());
}

#[tokio::test]
async fn test_terminal_states_admit_no_transition() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("term-own").await;
    let invitee = test_db.register_user("term-new").await;
    let ws = team_workspace(&test_db, &owner).await;

    let invitation_id = test_db
        .db
        .invitations
        .send(ws, owner.id, invite(&invitee.username, false))
        .await
        .expect("send invitation");

    test_db
        .db
        .invitations
        .revoke(invitation_id, owner.id)
        .await
        .expect("revoke");

    // Accepting a revoked invitation fails with InvalidState.
    let err = test_db
        .db
        .invitations
        .accept(invitation_id, invitee.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let err = test_db
        .db
        .invitations
        .reject(invitation_id, invitee.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let err = test_db
        .db
        .invitations
        .revoke(invitation_id, owner.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_only_invitee_may_respond() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("resp-own").await;
    let invitee = test_db.register_user("resp-new").await;
    let bystander = test_db.register_user("resp-other").await;
    let ws = team_workspace(&test_db, &owner).await;

    let invitation_id = test_db
        .db
        .invitations
        .send(ws, owner.id, invite(&invitee.username, false))
        .await
        .expect("send invitation");

    let err = test_db
        .db
        .invitations
        .accept(invitation_id, bystander.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    // A plain member may not revoke either.
    let err = test_db
        .db
        .invitations
        .revoke(invitation_id, bystander.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_send_guards() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("send-own").await;
    let member = test_db.register_user("send-mem").await;
    let ws = team_workspace(&test_db, &owner).await;

    // Nonexistent invitee.
    let err = test_db
        .db
        .invitations
        .send(ws, owner.id, invite(&unique_username("ghost"), false))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Self-invitation.
    let err = test_db
        .db
        .invitations
        .send(ws, owner.id, invite(&owner.username, false))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BusinessRule);

    // Duplicate pending invitation.
    test_db
        .db
        .invitations
        .send(ws, owner.id, invite(&member.username, false))
        .await
        .expect("first invitation");
    let err = test_db
        .db
        .invitations
        .send(ws, owner.id, invite(&member.username, false))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BusinessRule);
}

#[tokio::test]
async fn test_inviter_needs_share_right() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("share-own").await;
    let member = test_db.register_user("share-mem").await;
    let outsider = test_db.register_user("share-out").await;
    let ws = team_workspace(&test_db, &owner).await;

    let invitation_id = test_db
        .db
        .invitations
        .send(ws, owner.id, invite(&member.username, false))
        .await
        .expect("invite member");
    test_db
        .db
        .invitations
        .accept(invitation_id, member.id)
        .await
        .expect("accept");

    // Member without can_share cannot invite.
    let err = test_db
        .db
        .invitations
        .send(ws, member.id, invite(&outsider.username, false))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    // Granting can_share unlocks sending.
    test_db
        .db
        .members
        .update_permissions(ws, owner.id, member.id, false, true)
        .await
        .expect("grant share");
    test_db
        .db
        .invitations
        .send(ws, member.id, invite(&outsider.username, false))
        .await
        .expect("member with share right invites");
}

#[tokio::test]
async fn test_accept_overwrites_existing_member_flags() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("race-own").await;
    let member = test_db.register_user("race-mem").await;
    let ws = team_workspace(&test_db, &owner).await;

    let invitation_id = test_db
        .db
        .invitations
        .send(ws, owner.id, invite(&member.username, true))
        .await
        .expect("send invitation");

    // A separate join path added the member before they accepted.
    test_db
        .db
        .members
        .add_member(
            ws,
            member.id,
            notarium_db::WorkspaceRole::Member,
            false,
            false,
        )
        .await
        .expect("parallel join");

    test_db
        .db
        .invitations
        .accept(invitation_id, member.id)
        .await
        .expect("accept");

    // The invitation's flags win over the pre-existing row.
    assert!(test_db.db.members.has_edit_right(ws, member.id).await.unwrap());
}
