//! Supervision requests: a group asks named teachers to supervise its
//! proposal, one teacher accepts, an admin finalizes.
//!
//! Accepting a request cancels the group's other pending requests in the same
//! batch, so a group holds at most one accepted request.

use cap_core::audit_detail::CapacityDetail;
use cap_core::entities::{Group, Proposal, SupervisionRequest, Teacher};
use cap_core::enums::{
    EntityType, GroupStatus, ProposalStatus, SupervisionDecision, SupervisionStatus,
};
use cap_core::events::DomainEvent;
use cap_core::ids::{PREFIX_SUPERVISION, generate_id};
use cap_store::RecordFilter;

use crate::WorkflowError;
use crate::locks::LockKey;
use crate::service::{Changeset, PortalService, detail, ensure_transition};

fn already_resolved(request: SupervisionRequest) -> WorkflowError {
    WorkflowError::AlreadyResolved {
        kind: EntityType::SupervisionRequest,
        id: request.id,
        status: request.status.to_string(),
    }
}

/// Teacher keys of accepted pairings that have not been finalized.
pub(crate) fn releasable_teacher_keys(requests: &[SupervisionRequest]) -> Vec<LockKey> {
    requests
        .iter()
        .filter(|r| holds_unfinalized_slot(r))
        .map(|r| LockKey::Teacher(r.teacher_id.clone()))
        .collect()
}

const fn holds_unfinalized_slot(request: &SupervisionRequest) -> bool {
    matches!(request.status, SupervisionStatus::Accepted) && !request.finalized
}

impl PortalService {
    /// Stage cancellation of a group's live requests.
    ///
    /// Pending requests are cancelled. An accepted pairing that was never
    /// finalized is cancelled too and hands its slot back to the teacher.
    /// The caller holds the group lock and every key from
    /// [`releasable_teacher_keys`]. Returns the ids of cancelled requests.
    pub(crate) async fn withdraw_requests(
        &self,
        changes: &mut Changeset,
        requests: Vec<SupervisionRequest>,
        reason: &str,
    ) -> Result<Vec<String>, WorkflowError> {
        let now = changes.now();
        let mut withdrawn = Vec::new();
        for mut request in requests {
            let from = request.status;
            let releases_slot = holds_unfinalized_slot(&request);
            if from != SupervisionStatus::Pending && !releases_slot {
                continue;
            }
            if releases_slot {
                let mut teacher: Teacher = self.load(&request.teacher_id).await?;
                teacher.current_students_count = teacher.current_students_count.saturating_sub(1);
                teacher.updated_at = now;
                changes.updated(
                    &teacher,
                    detail(&CapacityDetail {
                        current_students_count: teacher.current_students_count,
                        max_students: teacher.max_students,
                    })?,
                )?;
            }
            request.status = SupervisionStatus::Cancelled;
            request.updated_at = now;
            changes.status_changed(&request, from, SupervisionStatus::Cancelled, Some(reason))?;
            withdrawn.push(request.id);
        }
        Ok(withdrawn)
    }

    /// Ask `teacher_id` to supervise the group's proposal.
    pub async fn request_supervision(
        &self,
        leader_id: &str,
        group_id: &str,
        teacher_id: &str,
    ) -> Result<SupervisionRequest, WorkflowError> {
        let _locks = self.lock([LockKey::Group(group_id.to_string())]).await?;

        let group: Group = self.load(group_id).await?;
        self.require_leader(leader_id, &group).await?;
        if group.status != GroupStatus::Active {
            return Err(WorkflowError::GroupNotActive {
                group_id: group.id,
                status: group.status.to_string(),
            });
        }
        let proposal = match self.get_proposal_for_group(group_id).await? {
            Some(p) if p.status != ProposalStatus::Rejected => p,
            _ => return Err(WorkflowError::ProposalRequired(group_id.to_string())),
        };

        let existing = self.list_group_requests(group_id).await?;
        if existing.iter().any(|r| r.status == SupervisionStatus::Accepted) {
            return Err(WorkflowError::AlreadySupervised(group_id.to_string()));
        }
        if existing
            .iter()
            .any(|r| r.teacher_id == teacher_id && r.status == SupervisionStatus::Pending)
        {
            return Err(WorkflowError::DuplicateRequest {
                group_id: group_id.to_string(),
                teacher_id: teacher_id.to_string(),
            });
        }
        let pending = existing
            .iter()
            .filter(|r| r.status == SupervisionStatus::Pending)
            .count();
        let cap = self.limits().max_pending_supervision_requests;
        if pending >= cap as usize {
            return Err(WorkflowError::RequestCapReached {
                group_id: group_id.to_string(),
                cap,
            });
        }
        let teacher: Teacher = self.load(teacher_id).await?;

        let mut changes = Changeset::new(Some(leader_id));
        let now = changes.now();
        let request = SupervisionRequest {
            id: generate_id(PREFIX_SUPERVISION)?,
            group_id: group_id.to_string(),
            proposal_id: proposal.id,
            teacher_id: teacher.id,
            status: SupervisionStatus::Pending,
            finalized: false,
            finalized_by: None,
            finalized_at: None,
            created_at: now,
            updated_at: now,
        };
        changes.created(&request)?;
        changes.emit(DomainEvent::SupervisionRequested {
            request_id: request.id.clone(),
            group_id: group_id.to_string(),
            teacher_id: request.teacher_id.clone(),
        });
        self.apply(changes).await?;

        tracing::info!(request_id = %request.id, group_id, teacher_id, "supervision requested");
        Ok(request)
    }

    /// The assigned teacher accepts or rejects a pending request.
    pub async fn respond_to_supervision_request(
        &self,
        teacher_id: &str,
        request_id: &str,
        decision: SupervisionDecision,
    ) -> Result<SupervisionRequest, WorkflowError> {
        let snapshot: SupervisionRequest = self.load(request_id).await?;
        let _locks = self
            .lock([
                LockKey::Group(snapshot.group_id),
                LockKey::Teacher(snapshot.teacher_id),
            ])
            .await?;

        let mut request: SupervisionRequest = self.load(request_id).await?;
        if request.teacher_id != teacher_id {
            return Err(WorkflowError::NotAssignedTeacher {
                request_id: request.id,
                teacher_id: teacher_id.to_string(),
            });
        }
        if request.status != SupervisionStatus::Pending {
            return Err(already_resolved(request));
        }
        let proposal = self.find::<Proposal>(&request.proposal_id).await?;
        if proposal.is_none_or(|p| p.status == ProposalStatus::Rejected) {
            return Err(WorkflowError::ProposalRequired(request.group_id));
        }

        let target = decision.target_status();
        let mut changes = Changeset::new(Some(teacher_id));
        let now = changes.now();

        if decision == SupervisionDecision::Reject {
            request.status = target;
            request.updated_at = now;
            changes.status_changed(&request, SupervisionStatus::Pending, target, None)?;
            self.apply(changes).await?;
            tracing::info!(request_id, teacher_id, "supervision request rejected");
            return Ok(request);
        }

        let mut teacher: Teacher = self.load(teacher_id).await?;
        if !teacher.has_capacity() {
            return Err(WorkflowError::TeacherAtCapacity(teacher.id));
        }
        let siblings: Vec<SupervisionRequest> = self
            .query(
                &RecordFilter::all()
                    .eq("group_id", request.group_id.as_str())
                    .eq("status", SupervisionStatus::Pending.as_str()),
            )
            .await?;

        teacher.current_students_count += 1;
        teacher.updated_at = now;
        changes.updated(
            &teacher,
            detail(&CapacityDetail {
                current_students_count: teacher.current_students_count,
                max_students: teacher.max_students,
            })?,
        )?;

        request.status = target;
        request.updated_at = now;
        changes.status_changed(&request, SupervisionStatus::Pending, target, None)?;

        let mut superseded = Vec::new();
        for mut sibling in siblings.into_iter().filter(|s| s.id != request.id) {
            sibling.status = SupervisionStatus::Cancelled;
            sibling.updated_at = now;
            changes.status_changed(
                &sibling,
                SupervisionStatus::Pending,
                SupervisionStatus::Cancelled,
                Some("another teacher accepted"),
            )?;
            superseded.push(sibling.id);
        }

        changes.emit(DomainEvent::SupervisionAccepted {
            request_id: request.id.clone(),
            group_id: request.group_id.clone(),
            teacher_id: teacher_id.to_string(),
            superseded_request_ids: superseded.clone(),
        });
        self.apply(changes).await?;

        tracing::info!(
            request_id,
            teacher_id,
            load = teacher.current_students_count,
            superseded = superseded.len(),
            "supervision request accepted"
        );
        Ok(request)
    }

    /// The group leader withdraws a pending request.
    pub async fn cancel_supervision_request(
        &self,
        leader_id: &str,
        request_id: &str,
    ) -> Result<SupervisionRequest, WorkflowError> {
        let snapshot: SupervisionRequest = self.load(request_id).await?;
        let _locks = self.lock([LockKey::Group(snapshot.group_id)]).await?;

        let mut request: SupervisionRequest = self.load(request_id).await?;
        let group: Group = self.load(&request.group_id).await?;
        self.require_leader(leader_id, &group).await?;
        if request.status != SupervisionStatus::Pending {
            return Err(already_resolved(request));
        }

        let mut changes = Changeset::new(Some(leader_id));
        request.status = SupervisionStatus::Cancelled;
        request.updated_at = changes.now();
        changes.status_changed(
            &request,
            SupervisionStatus::Pending,
            SupervisionStatus::Cancelled,
            None,
        )?;
        self.apply(changes).await?;

        tracing::info!(request_id, leader_id, "supervision request cancelled");
        Ok(request)
    }

    /// Lock in an accepted pairing and approve the group's proposal.
    pub async fn finalize_supervision(
        &self,
        admin_id: &str,
        request_id: &str,
    ) -> Result<SupervisionRequest, WorkflowError> {
        let snapshot: SupervisionRequest = self.load(request_id).await?;
        let _locks = self.lock([LockKey::Group(snapshot.group_id)]).await?;

        let mut request: SupervisionRequest = self.load(request_id).await?;
        if request.status != SupervisionStatus::Accepted {
            return Err(WorkflowError::SupervisionNotAccepted {
                request_id: request.id,
                status: request.status.to_string(),
            });
        }
        if request.finalized {
            return Err(WorkflowError::AlreadyResolved {
                kind: EntityType::SupervisionRequest,
                id: request.id,
                status: "finalized".into(),
            });
        }

        let mut proposal: Proposal = self.load(&request.proposal_id).await?;
        let from = proposal.status;
        ensure_transition(
            EntityType::Proposal,
            &proposal.id,
            from,
            ProposalStatus::Approved,
            from.can_transition_to(ProposalStatus::Approved),
        )?;

        let mut changes = Changeset::new(Some(admin_id));
        let now = changes.now();
        request.finalized = true;
        request.finalized_by = Some(admin_id.to_string());
        request.finalized_at = Some(now);
        request.updated_at = now;
        changes.updated(&request, None)?;

        proposal.status = ProposalStatus::Approved;
        proposal.updated_at = now;
        changes.status_changed(&proposal, from, ProposalStatus::Approved, None)?;

        changes.emit(DomainEvent::SupervisionFinalized {
            request_id: request.id.clone(),
            group_id: request.group_id.clone(),
            proposal_id: proposal.id.clone(),
        });
        self.apply(changes).await?;

        tracing::info!(request_id, admin_id, proposal_id = %proposal.id, "supervision finalized");
        Ok(request)
    }

    pub async fn get_supervision_request(
        &self,
        request_id: &str,
    ) -> Result<SupervisionRequest, WorkflowError> {
        self.load(request_id).await
    }

    pub async fn list_group_requests(
        &self,
        group_id: &str,
    ) -> Result<Vec<SupervisionRequest>, WorkflowError> {
        self.query(&RecordFilter::all().eq("group_id", group_id)).await
    }

    pub async fn list_teacher_requests(
        &self,
        teacher_id: &str,
        status: Option<SupervisionStatus>,
    ) -> Result<Vec<SupervisionRequest>, WorkflowError> {
        let mut filter = RecordFilter::all().eq("teacher_id", teacher_id);
        if let Some(status) = status {
            filter = filter.eq("status", status.as_str());
        }
        self.query(&filter).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cap_core::entities::Proposal;
    use cap_core::enums::{ProposalStatus, SupervisionDecision, SupervisionStatus};
    use cap_core::events::DomainEvent;
    use cap_store::{MemoryStore, RecordStore, WriteBatch};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::ErrorKind;
    use crate::test_support::helpers::{
        ADMIN, active_group, proposal_for, teacher, test_service, test_service_with_store,
    };

    #[tokio::test]
    async fn request_requires_live_proposal() {
        let svc = test_service();
        let (leader, group) = active_group(&svc, "Ada").await;
        let turing = teacher(&svc, "Turing", 2).await;

        let err = svc
            .request_supervision(&leader.id, &group.id, &turing.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProposalRequired);

        let proposal = proposal_for(&svc, &leader, &group).await;
        svc.submit_proposal(&leader.id, &proposal.id).await.unwrap();
        svc.reject_proposal(ADMIN, &proposal.id, None).await.unwrap();

        let err = svc
            .request_supervision(&leader.id, &group.id, &turing.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProposalRequired);
    }

    #[tokio::test]
    async fn duplicate_and_unknown_teacher_are_rejected() {
        let svc = test_service();
        let (leader, group) = active_group(&svc, "Ada").await;
        proposal_for(&svc, &leader, &group).await;
        let turing = teacher(&svc, "Turing", 2).await;

        svc.request_supervision(&leader.id, &group.id, &turing.id).await.unwrap();
        let err = svc
            .request_supervision(&leader.id, &group.id, &turing.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateRequest);

        let err = svc
            .request_supervision(&leader.id, &group.id, "tch-00000000")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn reject_keeps_teacher_load() {
        let svc = test_service();
        let (leader, group) = active_group(&svc, "Ada").await;
        proposal_for(&svc, &leader, &group).await;
        let turing = teacher(&svc, "Turing", 1).await;
        let request = svc.request_supervision(&leader.id, &group.id, &turing.id).await.unwrap();

        let rejected = svc
            .respond_to_supervision_request(&turing.id, &request.id, SupervisionDecision::Reject)
            .await
            .unwrap();
        assert_eq!(rejected.status, SupervisionStatus::Rejected);
        assert_eq!(svc.get_teacher(&turing.id).await.unwrap().current_students_count, 0);

        // A rejected teacher may be asked again.
        svc.request_supervision(&leader.id, &group.id, &turing.id).await.unwrap();
    }

    #[tokio::test]
    async fn only_assigned_teacher_responds() {
        let svc = test_service();
        let (leader, group) = active_group(&svc, "Ada").await;
        proposal_for(&svc, &leader, &group).await;
        let turing = teacher(&svc, "Turing", 1).await;
        let hopper = teacher(&svc, "Hopper", 1).await;
        let request = svc.request_supervision(&leader.id, &group.id, &turing.id).await.unwrap();

        let err = svc
            .respond_to_supervision_request(&hopper.id, &request.id, SupervisionDecision::Accept)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAssignedTeacher);
    }

    #[tokio::test]
    async fn full_teacher_cannot_accept() {
        let svc = test_service();
        let turing = teacher(&svc, "Turing", 1).await;
        let mut requests = Vec::new();
        for name in ["Ada", "Eve"] {
            let (leader, group) = active_group(&svc, name).await;
            proposal_for(&svc, &leader, &group).await;
            requests.push(svc.request_supervision(&leader.id, &group.id, &turing.id).await.unwrap());
        }

        svc.respond_to_supervision_request(&turing.id, &requests[0].id, SupervisionDecision::Accept)
            .await
            .unwrap();
        let err = svc
            .respond_to_supervision_request(&turing.id, &requests[1].id, SupervisionDecision::Accept)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TeacherAtCapacity);

        let turing = svc.get_teacher(&turing.id).await.unwrap();
        assert_eq!(turing.current_students_count, 1);
        let pending = svc
            .list_teacher_requests(&turing.id, Some(SupervisionStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn cancel_loses_to_earlier_response() {
        let svc = test_service();
        let (leader, group) = active_group(&svc, "Ada").await;
        proposal_for(&svc, &leader, &group).await;
        let turing = teacher(&svc, "Turing", 1).await;
        let request = svc.request_supervision(&leader.id, &group.id, &turing.id).await.unwrap();

        svc.respond_to_supervision_request(&turing.id, &request.id, SupervisionDecision::Accept)
            .await
            .unwrap();
        let err = svc
            .cancel_supervision_request(&leader.id, &request.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
    }

    #[tokio::test]
    async fn finalize_approves_proposal_once() {
        let svc = test_service();
        let (leader, group) = active_group(&svc, "Ada").await;
        let proposal = proposal_for(&svc, &leader, &group).await;
        svc.submit_proposal(&leader.id, &proposal.id).await.unwrap();
        let turing = teacher(&svc, "Turing", 1).await;
        let request = svc.request_supervision(&leader.id, &group.id, &turing.id).await.unwrap();

        let err = svc.finalize_supervision(ADMIN, &request.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SupervisionNotAccepted);

        svc.respond_to_supervision_request(&turing.id, &request.id, SupervisionDecision::Accept)
            .await
            .unwrap();
        let mut events = svc.subscribe();
        let finalized = svc.finalize_supervision(ADMIN, &request.id).await.unwrap();
        assert!(finalized.finalized);
        assert_eq!(finalized.finalized_by.as_deref(), Some(ADMIN));
        assert_eq!(
            svc.get_proposal(&proposal.id).await.unwrap().status,
            ProposalStatus::Approved
        );
        assert_eq!(
            events.recv().await.unwrap(),
            DomainEvent::SupervisionFinalized {
                request_id: request.id.clone(),
                group_id: group.id.clone(),
                proposal_id: proposal.id.clone(),
            }
        );

        let err = svc.finalize_supervision(ADMIN, &request.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
    }

    #[tokio::test]
    async fn rejected_proposal_withdraws_pending_requests() {
        let svc = test_service();
        let (leader, group) = active_group(&svc, "Ada").await;
        let proposal = proposal_for(&svc, &leader, &group).await;
        let turing = teacher(&svc, "Turing", 1).await;
        svc.submit_proposal(&leader.id, &proposal.id).await.unwrap();
        let request = svc.request_supervision(&leader.id, &group.id, &turing.id).await.unwrap();

        svc.reject_proposal(ADMIN, &proposal.id, Some("out of scope"))
            .await
            .unwrap();
        let request = svc.get_supervision_request(&request.id).await.unwrap();
        assert_eq!(request.status, SupervisionStatus::Cancelled);

        let err = svc
            .respond_to_supervision_request(&turing.id, &request.id, SupervisionDecision::Accept)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
        assert_eq!(svc.get_teacher(&turing.id).await.unwrap().current_students_count, 0);

        let err = svc
            .request_supervision(&leader.id, &group.id, &turing.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProposalRequired);
    }

    #[tokio::test]
    async fn rejected_proposal_releases_unfinalized_pairing() {
        let svc = test_service();
        let (leader, group) = active_group(&svc, "Ada").await;
        let proposal = proposal_for(&svc, &leader, &group).await;
        let turing = teacher(&svc, "Turing", 1).await;
        svc.submit_proposal(&leader.id, &proposal.id).await.unwrap();
        let request = svc.request_supervision(&leader.id, &group.id, &turing.id).await.unwrap();
        svc.respond_to_supervision_request(&turing.id, &request.id, SupervisionDecision::Accept)
            .await
            .unwrap();
        assert_eq!(svc.get_teacher(&turing.id).await.unwrap().current_students_count, 1);

        svc.reject_proposal(ADMIN, &proposal.id, None).await.unwrap();

        let request = svc.get_supervision_request(&request.id).await.unwrap();
        assert_eq!(request.status, SupervisionStatus::Cancelled);
        assert_eq!(svc.get_teacher(&turing.id).await.unwrap().current_students_count, 0);
        let err = svc.finalize_supervision(ADMIN, &request.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SupervisionNotAccepted);
    }

    #[tokio::test]
    async fn teacher_cannot_accept_for_rejected_proposal() {
        let store = Arc::new(MemoryStore::new());
        let svc = test_service_with_store(Arc::clone(&store));
        let (leader, group) = active_group(&svc, "Ada").await;
        let proposal = proposal_for(&svc, &leader, &group).await;
        let turing = teacher(&svc, "Turing", 1).await;
        let request = svc.request_supervision(&leader.id, &group.id, &turing.id).await.unwrap();

        // Leave the request pending behind a rejected proposal.
        let mut batch = WriteBatch::new();
        batch.patch::<Proposal>(&proposal.id, json!({ "status": "rejected" }));
        store.commit(batch).await.unwrap();

        let err = svc
            .respond_to_supervision_request(&turing.id, &request.id, SupervisionDecision::Accept)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProposalRequired);
        assert_eq!(svc.get_teacher(&turing.id).await.unwrap().current_students_count, 0);
        assert_eq!(
            svc.get_supervision_request(&request.id).await.unwrap().status,
            SupervisionStatus::Pending
        );
    }
}
