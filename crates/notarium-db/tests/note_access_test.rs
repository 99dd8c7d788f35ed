//! Note access resolution, creation defaults, updates, and filtering.

use notarium_db::test_fixtures::TestDatabase;
use notarium_db::{
    CreateCategoryRequest, CreateNoteRequest, CreateTagRequest, CreateWorkspaceRequest,
    CategoryStore, ErrorKind, MembershipRegistry, NoteFilter, NoteStore, NoteType, TagStore,
    UpdateNoteRequest, User, WorkspaceRole, WorkspaceStore, WorkspaceType,
};

async fn team_workspace(test_db: &TestDatabase, owner: &User) -> i64 {
    test_db
        .db
        .workspaces
        .create(
            owner.id,
            CreateWorkspaceRequest {
                name: "notes".to_string(),
                workspace_type: WorkspaceType::Team,
            },
        )
        .await
        .expect("create workspace")
        .id
}

fn markdown_note(workspace_id: i64, title: &str) -> CreateNoteRequest {
    CreateNoteRequest {
        workspace_id,
        title: title.to_string(),
        note_type: NoteType::Markdown,
        category_id: None,
        tag_ids: None,
    }
}

#[tokio::test]
async fn test_create_seeds_type_default_content() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("seed").await;
    let ws = team_workspace(&test_db, &owner).await;

    let note_id = test_db
        .db
        .notes
        .create(owner.id, markdown_note(ws, "fresh"))
        .await
        .expect("create note");

    let view = test_db.db.notes.get(note_id, owner.id).await.expect("get");
    assert_eq!(view.note_type, NoteType::Markdown);
    assert_eq!(view.content, NoteType::Markdown.default_content());
    assert!(!view.is_deleted);
    assert!(view.tags.is_empty());
}

#[tokio::test]
async fn test_create_requires_edit_right() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("cr").await;
    let viewer = test_db.register_user("cr-view").await;
    let ws = team_workspace(&test_db, &owner).await;

    test_db
        .db
        .members
        .add_member(ws, viewer.id, WorkspaceRole::Member, false, false)
        .await
        .expect("add viewer");

    let err = test_db
        .db
        .notes
        .create(viewer.id, markdown_note(ws, "denied"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    // Blank titles never reach the store.
    let err = test_db
        .db
        .notes
        .create(owner.id, markdown_note(ws, "   "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_membership_gates_note_visibility() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("vis").await;
    let member = test_db.register_user("vis-mem").await;
    let outsider = test_db.register_user("vis-out").await;
    let ws = team_workspace(&test_db, &owner).await;

    test_db
        .db
        .members
        .add_member(ws, member.id, WorkspaceRole::Member, false, false)
        .await
        .expect("add member");
    let note_id = test_db
        .db
        .notes
        .create(owner.id, markdown_note(ws, "shared"))
        .await
        .expect("create note");

    // View rights do not require can_edit.
    let view = test_db.db.notes.get(note_id, member.id).await.expect("get");
    assert_eq!(view.id, note_id);

    let err = test_db.db.notes.get(note_id, outsider.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_removed_member_loses_access_but_notes_remain() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("rm").await;
    let member = test_db.register_user("rm-mem").await;
    let ws = team_workspace(&test_db, &owner).await;

    test_db
        .db
        .members
        .add_member(ws, member.id, WorkspaceRole::Member, true, false)
        .await
        .expect("add editor");
    let note_id = test_db
        .db
        .notes
        .create(member.id, markdown_note(ws, "by member"))
        .await
        .expect("member creates note");

    test_db
        .db
        .members
        .remove_member(ws, owner.id, member.id)
        .await
        .expect("remove member");

    // Ownership is workspace-scoped, not member-scoped: the note survives
    // and the owner still sees it; the removed member does not.
    assert!(!test_db
        .db
        .notes
        .accessible_workspace_ids(member.id)
        .await
        .unwrap()
        .contains(&ws));
    let view = test_db.db.notes.get(note_id, owner.id).await.expect("get");
    assert_eq!(view.title, "by member");
    let err = test_db.db.notes.get(note_id, member.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_update_applies_non_blank_fields_and_category() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("upd").await;
    let ws = team_workspace(&test_db, &owner).await;
    let note_id = test_db
        .db
        .notes
        .create(owner.id, markdown_note(ws, "original"))
        .await
        .expect("create note");
    let category_id = test_db
        .db
        .categories
        .create(
            owner.id,
            CreateCategoryRequest {
                name: "work".to_string(),
                color: None,
            },
        )
        .await
        .expect("create category");

    test_db
        .db
        .notes
        .update(
            note_id,
            owner.id,
            UpdateNoteRequest {
                title: Some("renamed".to_string()),
                content: Some(r#"{"md": "hello", "html": ""}"#.to_string()),
                category_id: Some(Some(category_id)),
            },
        )
        .await
        .expect("update");

    let view = test_db.db.notes.get(note_id, owner.id).await.expect("get");
    assert_eq!(view.title, "renamed");
    assert_eq!(view.category_id, Some(category_id));
    assert_eq!(view.category_name.as_deref(), Some("work"));

    // Blank title is ignored; category can be cleared.
    test_db
        .db
        .notes
        .update(
            note_id,
            owner.id,
            UpdateNoteRequest {
                title: Some("  ".to_string()),
                content: None,
                category_id: Some(None),
            },
        )
        .await
        .expect("update");
    let view = test_db.db.notes.get(note_id, owner.id).await.expect("get");
    assert_eq!(view.title, "renamed");
    assert_eq!(view.category_id, None);
}

#[tokio::test]
async fn test_filter_tags_use_and_semantics() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("flt").await;
    let ws = team_workspace(&test_db, &owner).await;

    let t1 = test_db
        .db
        .tags
        .create(
            owner.id,
            CreateTagRequest {
                name: "rust".to_string(),
                color: None,
            },
        )
        .await
        .expect("tag rust");
    let t2 = test_db
        .db
        .tags
        .create(
            owner.id,
            CreateTagRequest {
                name: "draft".to_string(),
                color: None,
            },
        )
        .await
        .expect("tag draft");

    let both = test_db
        .db
        .notes
        .create(owner.id, markdown_note(ws, "both tags"))
        .await
        .expect("note");
    test_db
        .db
        .tags
        .set_note_tags(both, owner.id, &[t1, t2])
        .await
        .expect("bind both");

    let only_one = test_db
        .db
        .notes
        .create(owner.id, markdown_note(ws, "one tag"))
        .await
        .expect("note");
    test_db
        .db
        .tags
        .set_note_tags(only_one, owner.id, &[t1])
        .await
        .expect("bind one");

    let untagged = test_db
        .db
        .notes
        .create(owner.id, markdown_note(ws, "no tags"))
        .await
        .expect("note");

    let hits = test_db
        .db
        .notes
        .filter(
            owner.id,
            NoteFilter {
                category_id: None,
                tag_ids: Some(vec![t1, t2]),
            },
        )
        .await
        .expect("filter");

    // AND, not OR: a note must carry every listed tag.
    assert!(hits.iter().any(|n| n.id == both));
    assert!(!hits.iter().any(|n| n.id == only_one));
    assert!(!hits.iter().any(|n| n.id == untagged));
}

#[tokio::test]
async fn test_filter_by_category_and_ordering() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.register_user("ord").await;
    let ws = team_workspace(&test_db, &owner).await;

    let category_id = test_db
        .db
        .categories
        .create(
            owner.id,
            CreateCategoryRequest {
                name: "journal".to_string(),
                color: None,
            },
        )
        .await
        .expect("category");

    let older = test_db
        .db
        .notes
        .create(owner.id, markdown_note(ws, "older"))
        .await
        .expect("note");
    let newer = test_db
        .db
        .notes
        .create(owner.id, markdown_note(ws, "newer"))
        .await
        .expect("note");

    // Updating the older note bumps it to the top of the listing.
    test_db
        .db
        .notes
        .update(
            older,
            owner.id,
            UpdateNoteRequest {
                title: None,
                content: None,
                category_id: Some(Some(category_id)),
            },
        )
        .await
        .expect("categorize older");

    let all = test_db
        .db
        .notes
        .list_for_user(owner.id)
        .await
        .expect("list");
    let pos_older = all.iter().position(|n| n.id == older).unwrap();
    let pos_newer = all.iter().position(|n| n.id == newer).unwrap();
    assert!(pos_older < pos_newer);

    let categorized = test_db
        .db
        .notes
        .filter(
            owner.id,
            NoteFilter {
                category_id: Some(category_id),
                tag_ids: None,
            },
        )
        .await
        .expect("filter");
    assert!(categorized.iter().any(|n| n.id == older));
    assert!(!categorized.iter().any(|n| n.id == newer));
}
