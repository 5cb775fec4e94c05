//! Shared test utilities for cap-workflow unit tests.

pub(crate) mod helpers {
    use std::sync::Arc;

    use cap_config::{StoreConfig, WorkflowConfig};
    use cap_core::entities::{Group, Proposal, ProposalFields, Student, Teacher};
    use cap_store::MemoryStore;

    use crate::journal::EventJournal;
    use crate::service::PortalService;

    pub const ADMIN: &str = "admin-1";

    /// In-memory service with default limits and the journal disabled.
    pub fn test_service() -> PortalService {
        test_service_with_store(Arc::new(MemoryStore::new()))
    }

    pub fn test_service_with_store(store: Arc<MemoryStore>) -> PortalService {
        PortalService::from_parts(
            store,
            WorkflowConfig::default(),
            &StoreConfig::default(),
            EventJournal::disabled(),
        )
    }

    pub async fn student(svc: &PortalService, name: &str) -> Student {
        svc.register_student(name, &format!("{}@uni.example", name.to_lowercase()))
            .await
            .unwrap()
    }

    pub async fn teacher(svc: &PortalService, name: &str, max_students: u32) -> Teacher {
        svc.register_teacher(
            name,
            &format!("{}@uni.example", name.to_lowercase()),
            max_students,
            vec![],
        )
        .await
        .unwrap()
    }

    /// Register a leader and walk a creation request through approval.
    pub async fn forming_group(svc: &PortalService, leader_name: &str) -> (Student, Group) {
        let leader = student(svc, leader_name).await;
        let request = svc
            .request_group_creation(&leader.id, &format!("{leader_name}'s group"), None)
            .await
            .unwrap();
        let group = svc.approve_group_creation(ADMIN, &request.id).await.unwrap();
        let leader = svc.get_student(&leader.id).await.unwrap();
        (leader, group)
    }

    /// Invite and accept `extra_members` students into a forming group.
    pub async fn join_members(
        svc: &PortalService,
        leader: &Student,
        group: &Group,
        extra_members: usize,
    ) -> Vec<Student> {
        let mut members = Vec::new();
        for i in 0..extra_members {
            let member = student(svc, &format!("Member{i}")).await;
            let invitation = svc
                .send_invitation(&leader.id, &group.id, &member.id)
                .await
                .unwrap();
            svc.accept_invitation(&member.id, &invitation.id).await.unwrap();
            members.push(svc.get_student(&member.id).await.unwrap());
        }
        members
    }

    /// A confirmed group with one extra member.
    pub async fn active_group(svc: &PortalService, leader_name: &str) -> (Student, Group) {
        let (leader, group) = forming_group(svc, leader_name).await;
        join_members(svc, &leader, &group, 1).await;
        let group = svc.confirm_group(&leader.id, &group.id).await.unwrap();
        (leader, group)
    }

    pub fn fields(title: &str) -> ProposalFields {
        ProposalFields {
            title: title.to_string(),
            summary: format!("{title}, in depth."),
            field: "systems".into(),
            project_type: "thesis".into(),
        }
    }

    pub async fn proposal_for(svc: &PortalService, leader: &Student, group: &Group) -> Proposal {
        svc.create_proposal(&leader.id, &group.id, fields("Lock-free queues"))
            .await
            .unwrap()
    }
}
