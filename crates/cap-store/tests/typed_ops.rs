//! Typed entity operations against the in-memory backend.

use std::sync::Arc;

use cap_core::entities::{Proposal, Student};
use cap_core::enums::ProposalStatus;
use cap_store::{MemoryStore, RecordFilter, RecordStore, RecordStoreExt, StoreError};
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;

fn student(id: &str, group_id: Option<&str>) -> Student {
    let now = Utc::now();
    Student {
        id: id.to_string(),
        name: format!("Student {id}"),
        email: format!("{id}@uni.example"),
        group_id: group_id.map(str::to_string),
        group_name: None,
        is_group_admin: false,
        accepted_invitations: 0,
        created_at: now,
        updated_at: now,
    }
}

fn proposal(id: &str, group_id: &str) -> Proposal {
    let now = Utc::now();
    Proposal {
        id: id.to_string(),
        group_id: group_id.to_string(),
        author_student_id: "stu-00000001".into(),
        title: "Title".into(),
        summary: "Abstract".into(),
        field: "systems".into(),
        project_type: "thesis".into(),
        status: ProposalStatus::Draft,
        reason: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn create_find_update_delete() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());

    let created = store.create(student("stu-00000001", None)).await.unwrap();
    let found: Student = store.get("stu-00000001").await.unwrap();
    assert_eq!(found, created);

    let updated: Student = store
        .update(
            "stu-00000001",
            json!({"group_id": "grp-00000001", "is_group_admin": true}),
        )
        .await
        .unwrap();
    assert_eq!(updated.group_id.as_deref(), Some("grp-00000001"));
    assert!(updated.is_group_admin);
    assert_eq!(updated.name, created.name);

    store.delete::<Student>("stu-00000001").await.unwrap();
    assert!(store.find::<Student>("stu-00000001").await.unwrap().is_none());
}

#[tokio::test]
async fn update_missing_record_is_not_found() {
    let store = MemoryStore::new();
    let err = store
        .update::<Student>("stu-deadbeef", json!({"name": "x"}))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn list_decodes_matching_records() {
    let store = MemoryStore::new();
    store.create(student("stu-00000001", Some("grp-1"))).await.unwrap();
    store.create(student("stu-00000002", None)).await.unwrap();
    store.create(student("stu-00000003", Some("grp-1"))).await.unwrap();

    let members: Vec<Student> = store
        .list_of(&RecordFilter::all().eq("group_id", "grp-1"))
        .await
        .unwrap();
    let ids: Vec<&str> = members.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["stu-00000001", "stu-00000003"]);

    let loners: Vec<Student> = store
        .list_of(&RecordFilter::all().is_null("group_id"))
        .await
        .unwrap();
    assert_eq!(loners.len(), 1);
}

#[tokio::test]
async fn second_proposal_for_group_conflicts() {
    let store = MemoryStore::new();
    store.create(proposal("prp-00000001", "grp-1")).await.unwrap();
    let err = store
        .create(proposal("prp-00000002", "grp-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
    store.create(proposal("prp-00000003", "grp-2")).await.unwrap();
}

#[tokio::test]
async fn undecodable_body_is_corrupt() {
    let store = MemoryStore::new();
    let mut batch = cap_store::WriteBatch::new();
    batch.push(cap_store::Mutation::Insert {
        kind: cap_core::enums::EntityType::Student,
        id: "stu-00000009".into(),
        unique_key: None,
        body: json!({"id": "stu-00000009"}),
    });
    store.commit(batch).await.unwrap();

    let err = store.find::<Student>("stu-00000009").await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}
