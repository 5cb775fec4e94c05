//! Helpers shared by the cap-workflow integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use cap_config::{StoreConfig, WorkflowConfig};
use cap_core::entities::{Group, Proposal, ProposalFields, Student, Teacher};
use cap_store::{MemoryStore, RecordStore};
use cap_workflow::{EventJournal, PortalService};

pub const ADMIN: &str = "admin-1";

pub fn service() -> Arc<PortalService> {
    service_over(Arc::new(MemoryStore::new()))
}

pub fn service_over(store: Arc<dyn RecordStore>) -> Arc<PortalService> {
    Arc::new(PortalService::from_parts(
        store,
        WorkflowConfig::default(),
        &StoreConfig::default(),
        EventJournal::disabled(),
    ))
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
        vec!["systems".to_string()],
    )
    .await
    .unwrap()
}

pub async fn forming_group(svc: &PortalService, leader_name: &str) -> (Student, Group) {
    let leader = student(svc, leader_name).await;
    let request = svc
        .request_group_creation(&leader.id, &format!("{leader_name}'s group"), None)
        .await
        .unwrap();
    let group = svc.approve_group_creation(ADMIN, &request.id).await.unwrap();
    (svc.get_student(&leader.id).await.unwrap(), group)
}

/// Forming group plus one accepted member, confirmed to `active`.
pub async fn active_group(svc: &PortalService, leader_name: &str) -> (Student, Group) {
    let (leader, group) = forming_group(svc, leader_name).await;
    let member = student(svc, &format!("{leader_name}-partner")).await;
    let invitation = svc
        .send_invitation(&leader.id, &group.id, &member.id)
        .await
        .unwrap();
    svc.accept_invitation(&member.id, &invitation.id).await.unwrap();
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

/// Active group with a draft proposal.
pub async fn proposing_group(svc: &PortalService, leader_name: &str) -> (Student, Group, Proposal) {
    let (leader, group) = active_group(svc, leader_name).await;
    let proposal = svc
        .create_proposal(&leader.id, &group.id, fields("Lock-free queues"))
        .await
        .unwrap();
    (leader, group, proposal)
}
