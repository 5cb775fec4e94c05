//! Proposal lifecycle: one proposal per active group.
//!
//! ```text
//! draft ──submit──▶ submitted ──reject──▶ rejected
//!   └───────────────────┴──finalize──▶ approved
//! ```
//!
//! Approval only happens through supervision finalization.

use cap_core::entities::{Group, Proposal, ProposalFields, SupervisionRequest};
use cap_core::enums::{EntityType, GroupStatus, ProposalStatus, SupervisionStatus};
use cap_core::ids::{PREFIX_PROPOSAL, generate_id};
use cap_store::RecordFilter;
use serde::Serialize;

use crate::WorkflowError;
use crate::flows::supervision::releasable_teacher_keys;
use crate::locks::LockKey;
use crate::service::{Changeset, PortalService, detail, ensure_transition};

/// Partial edit of a draft proposal. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProposalUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
}

impl ProposalUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.field.is_none()
            && self.project_type.is_none()
    }

    fn apply_to(self, proposal: &mut Proposal) {
        if let Some(title) = self.title {
            proposal.title = title;
        }
        if let Some(summary) = self.summary {
            proposal.summary = summary;
        }
        if let Some(field) = self.field {
            proposal.field = field;
        }
        if let Some(project_type) = self.project_type {
            proposal.project_type = project_type;
        }
    }
}

#[derive(Debug, Default)]
pub struct ProposalUpdateBuilder(ProposalUpdate);

impl ProposalUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ProposalUpdate::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.0.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.0.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn project_type(mut self, project_type: impl Into<String>) -> Self {
        self.0.project_type = Some(project_type.into());
        self
    }

    #[must_use]
    pub fn build(self) -> ProposalUpdate {
        self.0
    }
}

fn require_title(title: &str) -> Result<(), WorkflowError> {
    if title.trim().is_empty() {
        return Err(WorkflowError::Validation("proposal title must not be empty".into()));
    }
    Ok(())
}

impl PortalService {
    /// Create the group's proposal as a draft.
    pub async fn create_proposal(
        &self,
        leader_id: &str,
        group_id: &str,
        fields: ProposalFields,
    ) -> Result<Proposal, WorkflowError> {
        require_title(&fields.title)?;

        let _locks = self.lock([LockKey::Group(group_id.to_string())]).await?;
        let group: Group = self.load(group_id).await?;
        self.require_leader(leader_id, &group).await?;
        if group.status != GroupStatus::Active {
            return Err(WorkflowError::GroupNotActive {
                group_id: group.id,
                status: group.status.to_string(),
            });
        }
        if self.get_proposal_for_group(group_id).await?.is_some() {
            return Err(WorkflowError::ProposalAlreadyExists(group_id.to_string()));
        }

        let mut changes = Changeset::new(Some(leader_id));
        let now = changes.now();
        let proposal = Proposal {
            id: generate_id(PREFIX_PROPOSAL)?,
            group_id: group_id.to_string(),
            author_student_id: leader_id.to_string(),
            title: fields.title.trim().to_string(),
            summary: fields.summary,
            field: fields.field,
            project_type: fields.project_type,
            status: ProposalStatus::Draft,
            reason: None,
            created_at: now,
            updated_at: now,
        };
        changes.created(&proposal)?;
        // A unique-key conflict from the store surfaces as ProposalAlreadyExists.
        self.apply(changes).await?;

        tracing::info!(proposal_id = %proposal.id, group_id, "proposal created");
        Ok(proposal)
    }

    /// Edit a draft proposal.
    pub async fn update_proposal(
        &self,
        leader_id: &str,
        proposal_id: &str,
        update: ProposalUpdate,
    ) -> Result<Proposal, WorkflowError> {
        if let Some(title) = &update.title {
            require_title(title)?;
        }
        let snapshot: Proposal = self.load(proposal_id).await?;
        let _locks = self.lock([LockKey::Group(snapshot.group_id)]).await?;

        let mut proposal: Proposal = self.load(proposal_id).await?;
        let group: Group = self.load(&proposal.group_id).await?;
        self.require_leader(leader_id, &group).await?;
        if proposal.status != ProposalStatus::Draft {
            return Err(WorkflowError::Validation(format!(
                "proposal {} is {} and can no longer be edited",
                proposal.id, proposal.status
            )));
        }
        if update.is_empty() {
            return Ok(proposal);
        }

        let mut changes = Changeset::new(Some(leader_id));
        let audit = detail(&update)?;
        update.apply_to(&mut proposal);
        proposal.updated_at = changes.now();
        changes.updated(&proposal, audit)?;
        self.apply(changes).await?;

        tracing::info!(proposal_id, "proposal updated");
        Ok(proposal)
    }

    /// `draft → submitted`.
    pub async fn submit_proposal(
        &self,
        leader_id: &str,
        proposal_id: &str,
    ) -> Result<Proposal, WorkflowError> {
        let snapshot: Proposal = self.load(proposal_id).await?;
        let _locks = self.lock([LockKey::Group(snapshot.group_id)]).await?;

        let mut proposal: Proposal = self.load(proposal_id).await?;
        let group: Group = self.load(&proposal.group_id).await?;
        self.require_leader(leader_id, &group).await?;
        let from = proposal.status;
        ensure_transition(
            EntityType::Proposal,
            &proposal.id,
            from,
            ProposalStatus::Submitted,
            from.can_transition_to(ProposalStatus::Submitted),
        )?;

        let mut changes = Changeset::new(Some(leader_id));
        proposal.status = ProposalStatus::Submitted;
        proposal.updated_at = changes.now();
        changes.status_changed(&proposal, from, ProposalStatus::Submitted, None)?;
        self.apply(changes).await?;

        tracing::info!(proposal_id, "proposal submitted");
        Ok(proposal)
    }

    /// `submitted → rejected`.
    ///
    /// The group's live supervision requests are withdrawn in the same batch,
    /// releasing the slot of an accepted pairing that was never finalized.
    pub async fn reject_proposal(
        &self,
        admin_id: &str,
        proposal_id: &str,
        reason: Option<&str>,
    ) -> Result<Proposal, WorkflowError> {
        let snapshot: Proposal = self.load(proposal_id).await?;
        let _group_lock = self.lock([LockKey::Group(snapshot.group_id)]).await?;

        let mut proposal: Proposal = self.load(proposal_id).await?;
        let from = proposal.status;
        ensure_transition(
            EntityType::Proposal,
            &proposal.id,
            from,
            ProposalStatus::Rejected,
            from.can_transition_to(ProposalStatus::Rejected),
        )?;

        // Request statuses only change under the group lock, so this read
        // stays valid once the teacher keys are held.
        let requests: Vec<SupervisionRequest> = self
            .query(&RecordFilter::all().eq("group_id", proposal.group_id.as_str()))
            .await?;
        let _teacher_locks = self.lock(releasable_teacher_keys(&requests)).await?;

        let mut changes = Changeset::new(Some(admin_id));
        proposal.status = ProposalStatus::Rejected;
        proposal.reason = reason.map(str::to_string);
        proposal.updated_at = changes.now();
        changes.status_changed(&proposal, from, ProposalStatus::Rejected, reason)?;
        let withdrawn = self
            .withdraw_requests(&mut changes, requests, "proposal rejected")
            .await?;
        self.apply(changes).await?;

        tracing::info!(
            proposal_id,
            admin_id,
            withdrawn = withdrawn.len(),
            "proposal rejected"
        );
        Ok(proposal)
    }

    /// Hard-delete a draft proposal so the group can start over.
    ///
    /// Refused while the group has a pending or accepted supervision request.
    pub async fn delete_proposal(
        &self,
        leader_id: &str,
        proposal_id: &str,
    ) -> Result<(), WorkflowError> {
        let snapshot: Proposal = self.load(proposal_id).await?;
        let _locks = self.lock([LockKey::Group(snapshot.group_id)]).await?;

        let proposal: Proposal = self.load(proposal_id).await?;
        let group: Group = self.load(&proposal.group_id).await?;
        self.require_leader(leader_id, &group).await?;
        if proposal.status != ProposalStatus::Draft {
            return Err(WorkflowError::Validation(format!(
                "proposal {} is {} and can no longer be deleted",
                proposal.id, proposal.status
            )));
        }
        let live: Vec<SupervisionRequest> = self
            .query(
                &RecordFilter::all()
                    .eq("proposal_id", proposal_id)
                    .any_of(
                        "status",
                        [SupervisionStatus::Pending.as_str(), SupervisionStatus::Accepted.as_str()],
                    ),
            )
            .await?;
        if !live.is_empty() {
            return Err(WorkflowError::Validation(format!(
                "proposal {proposal_id} has {} open supervision request(s)",
                live.len()
            )));
        }

        let mut changes = Changeset::new(Some(leader_id));
        changes.deleted::<Proposal>(proposal_id)?;
        self.apply(changes).await?;

        tracing::info!(proposal_id, leader_id, "proposal deleted");
        Ok(())
    }

    pub async fn get_proposal(&self, proposal_id: &str) -> Result<Proposal, WorkflowError> {
        self.load(proposal_id).await
    }

    pub async fn get_proposal_for_group(
        &self,
        group_id: &str,
    ) -> Result<Option<Proposal>, WorkflowError> {
        let mut found: Vec<Proposal> = self
            .query(&RecordFilter::all().eq("group_id", group_id).limit(1))
            .await?;
        Ok(found.pop())
    }
}
