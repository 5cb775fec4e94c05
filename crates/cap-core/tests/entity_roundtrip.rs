//! Serde roundtrip and JsonSchema validation tests for stored entity types.

use chrono::Utc;
use pretty_assertions::assert_eq;
use schemars::schema_for;
use cap_core::entities::*;
use cap_core::enums::*;
use cap_core::events::{DomainEvent, EventRecord};

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(recovered, val, "serde roundtrip failed for {}", stringify!($ty));

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

roundtrip_and_validate!(
    student_roundtrip,
    Student,
    Student {
        id: "stu-a3f8b2c1".into(),
        name: "Ada".into(),
        email: "ada@uni.example".into(),
        group_id: Some("grp-0c9e41d7".into()),
        group_name: Some("Compilers".into()),
        is_group_admin: true,
        accepted_invitations: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    teacher_roundtrip,
    Teacher,
    Teacher {
        id: "tch-11aa22bb".into(),
        name: "Dr. Hopper".into(),
        email: "hopper@uni.example".into(),
        max_students: 4,
        current_students_count: 1,
        accepted_topics: vec!["compilers".into(), "databases".into()],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    group_roundtrip,
    Group,
    Group {
        id: "grp-0c9e41d7".into(),
        name: "Compilers".into(),
        description: Some("Incremental parsing".into()),
        leader_student_id: "stu-a3f8b2c1".into(),
        members: vec![
            GroupMember {
                student_id: "stu-a3f8b2c1".into(),
                role: MemberRole::Leader,
            },
            GroupMember {
                student_id: "stu-b4c5d6e7".into(),
                role: MemberRole::Member,
            },
        ],
        status: GroupStatus::Forming,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    invitation_roundtrip,
    GroupInvitation,
    GroupInvitation {
        id: "inv-deadbeef".into(),
        from_student_id: "stu-a3f8b2c1".into(),
        to_student_id: "stu-b4c5d6e7".into(),
        group_id: "grp-0c9e41d7".into(),
        status: InvitationStatus::Pending,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    supervision_roundtrip,
    SupervisionRequest,
    SupervisionRequest {
        id: "svr-01020304".into(),
        group_id: "grp-0c9e41d7".into(),
        proposal_id: "prp-0a0b0c0d".into(),
        teacher_id: "tch-11aa22bb".into(),
        status: SupervisionStatus::Accepted,
        finalized: true,
        finalized_by: Some("admin".into()),
        finalized_at: Some(Utc::now()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    audit_roundtrip,
    AuditEntry,
    AuditEntry {
        id: "aud-00112233".into(),
        entity_type: EntityType::Invitation,
        entity_id: "inv-deadbeef".into(),
        action: AuditAction::StatusChanged,
        actor_id: Some("stu-b4c5d6e7".into()),
        detail: Some(serde_json::json!({"from": "pending", "to": "accepted", "reason": null})),
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    event_record_roundtrip,
    EventRecord,
    EventRecord {
        v: 1,
        ts: Utc::now(),
        event: DomainEvent::SupervisionAccepted {
            request_id: "svr-01020304".into(),
            group_id: "grp-0c9e41d7".into(),
            teacher_id: "tch-11aa22bb".into(),
            superseded_request_ids: vec!["svr-05060708".into()],
        },
    }
);

#[test]
fn proposal_serializes_abstract_field() {
    let proposal = Proposal {
        id: "prp-0a0b0c0d".into(),
        group_id: "grp-0c9e41d7".into(),
        author_student_id: "stu-a3f8b2c1".into(),
        title: "Incremental parsing for IDEs".into(),
        summary: "We study tree-sitter style reparsing.".into(),
        field: "programming languages".into(),
        project_type: "research".into(),
        status: ProposalStatus::Draft,
        reason: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let json = serde_json::to_value(&proposal).unwrap();
    assert_eq!(json["abstract"], "We study tree-sitter style reparsing.");
    assert!(json.get("summary").is_none());
    assert_eq!(proposal.unique_key().as_deref(), Some("grp-0c9e41d7"));

    let recovered: Proposal = serde_json::from_value(json).unwrap();
    assert_eq!(recovered, proposal);
}

#[test]
fn student_without_counter_defaults_to_zero() {
    let json = serde_json::json!({
        "id": "stu-a3f8b2c1",
        "name": "Ada",
        "email": "ada@uni.example",
        "group_id": null,
        "group_name": null,
        "is_group_admin": false,
        "created_at": "2026-02-08T12:00:00Z",
        "updated_at": "2026-02-08T12:00:00Z"
    });
    let student: Student = serde_json::from_value(json).unwrap();
    assert_eq!(student.accepted_invitations, 0);
    assert!(!student.in_group());
}
