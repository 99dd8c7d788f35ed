//! Workspace creation, listing with live counts, and the delete cascade.

use notarium_db::test_fixtures::TestDatabase;
use notarium_db::{
    CreateNoteRequest, CreateWorkspaceRequest, ErrorKind, MembershipRegistry, NoteStore, NoteType,
    RecycleBin, WorkspaceRole, WorkspaceStore, WorkspaceType,
};

fn note_in(workspace_id: i64, title: &str) -> CreateNoteRequest {
    CreateNoteRequest {
        workspace_id,
        title: title.to_string(),
        note_type: NoteType::Markdown,
        category_id: None,
        tag_ids: None,
    }
}

#[tokio::test]
async fn test_create_returns_initial_counts() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("ws").await;

    let view = test_db
        .db
        .workspaces
        .create(
            owner.id,
            CreateWorkspaceRequest {
                name: "project".to_string(),
                workspace_type: WorkspaceType::Team,
            },
        )
        .await
        .expect("create");

    assert_eq!(view.member_count, 1);
    assert_eq!(view.note_count, 0);
    assert_eq!(view.owner_user_id, owner.id);
}

#[tokio::test]
async fn test_create_rejects_blank_name() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("ws").await;

    let err = test_db
        .db
        .workspaces
        .create(
            owner.id,
            CreateWorkspaceRequest {
                name: "  ".to_string(),
                workspace_type: WorkspaceType::Team,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_listing_reflects_live_counts() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("ws").await;
    let member = test_db.register_user("ws-mem").await;

    let ws = test_db
        .db
        .workspaces
        .create(
            owner.id,
            CreateWorkspaceRequest {
                name: "counted".to_string(),
                workspace_type: WorkspaceType::Team,
            },
        )
        .await
        .expect("create")
        .id;

    test_db
        .db
        .members
        .add_member(ws, member.id, WorkspaceRole::Member, true, false)
        .await
        .expect("add member");
    test_db
        .db
        .notes
        .create(owner.id, note_in(ws, "first"))
        .await
        .expect("create note");

    let view = test_db
        .db
        .workspaces
        .get_detail(ws, owner.id)
        .await
        .expect("detail");
    assert_eq!(view.member_count, 2);
    assert_eq!(view.note_count, 1);

    // The member sees the shared workspace in their own listing.
    let member_spaces = test_db
        .db
        .workspaces
        .get_user_workspaces(member.id)
        .await
        .expect("member listing");
    assert!(member_spaces.iter().any(|w| w.id == ws));

    // Outsiders get no detail view.
    let outsider = test_db.register_user("ws-out").await;
    let err = test_db
        .db
        .workspaces
        .get_detail(ws, outsider.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_delete_is_owner_only_and_guarded_by_active_notes() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("del").await;
    let member = test_db.register_user("del-mem").await;

    let ws = test_db
        .db
        .workspaces
        .create(
            owner.id,
            CreateWorkspaceRequest {
                name: "doomed".to_string(),
                workspace_type: WorkspaceType::Team,
            },
        )
        .await
        .expect("create")
        .id;
    test_db
        .db
        .members
        .add_member(ws, member.id, WorkspaceRole::Member, true, false)
        .await
        .expect("add member");
    test_db
        .db
        .notes
        .create(owner.id, note_in(ws, "keep me"))
        .await
        .expect("create note");

    let err = test_db
        .db
        .workspaces
        .delete(ws, member.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    // Safe mode refuses while active notes remain.
    let err = test_db
        .db
        .workspaces
        .delete(ws, owner.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BusinessRule);
}

#[tokio::test]
async fn test_force_delete_cascades() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("force").await;
    let member = test_db.register_user("force-mem").await;

    let ws = test_db
        .db
        .workspaces
        .create(
            owner.id,
            CreateWorkspaceRequest {
                name: "cascade".to_string(),
                workspace_type: WorkspaceType::Team,
            },
        )
        .await
        .expect("create")
        .id;
    test_db
        .db
        .members
        .add_member(ws, member.id, WorkspaceRole::Member, true, false)
        .await
        .expect("add member");
    let note_id = test_db
        .db
        .notes
        .create(owner.id, note_in(ws, "swept"))
        .await
        .expect("create note");

    test_db
        .db
        .workspaces
        .delete(ws, owner.id, true)
        .await
        .expect("force delete");

    // Workspace and memberships are gone.
    let err = test_db
        .db
        .workspaces
        .get_detail(ws, owner.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!test_db.db.members.is_member(ws, member.id).await.unwrap());
    assert!(!test_db
        .db
        .notes
        .accessible_workspace_ids(member.id)
        .await
        .unwrap()
        .contains(&ws));

    // The note was soft-deleted, so it is gone from active listings. The
    // recycle bin is scoped through workspace ownership, and the workspace
    // row no longer exists, so the note is not surfaced there either.
    let err = test_db.db.notes.get(note_id, owner.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let deleted = test_db
        .db
        .recycle
        .list_deleted(owner.id)
        .await
        .expect("recycle bin");
    assert!(!deleted.iter().any(|n| n.id == note_id));

    // Deleting an empty workspace without force succeeds.
    let empty = test_db
        .db
        .workspaces
        .create(
            owner.id,
            CreateWorkspaceRequest {
                name: "empty".to_string(),
                workspace_type: WorkspaceType::Team,
            },
        )
        .await
        .expect("create")
        .id;
    test_db
        .db
        .workspaces
        .delete(empty, owner.id, false)
        .await
        .expect("delete empty workspace");
}
