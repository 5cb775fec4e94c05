//! Invitation subsystem.
//!
//! ```text
//! pending → accepted
//!         → declined
//!         → cancelled
//! ```
//!
//! Every operation locks the invitation's group and its addressee, so an
//! accept that declines the student's other invitations cannot interleave with
//! a decline or cancel of those same invitations.

use cap_core::audit_detail::MembershipDetail;
use cap_core::entities::{Group, GroupInvitation, Student};
use cap_core::enums::{EntityType, GroupStatus, InvitationStatus};
use cap_core::events::DomainEvent;
use cap_core::ids::{PREFIX_INVITATION, generate_id};
use cap_store::RecordFilter;

use crate::WorkflowError;
use crate::locks::LockKey;
use crate::service::{Changeset, PortalService, detail};

fn lock_keys(invitation: &GroupInvitation) -> [LockKey; 2] {
    [
        LockKey::Group(invitation.group_id.clone()),
        LockKey::Student(invitation.to_student_id.clone()),
    ]
}

fn already_resolved(invitation: GroupInvitation) -> WorkflowError {
    WorkflowError::AlreadyResolved {
        kind: EntityType::Invitation,
        id: invitation.id,
        status: invitation.status.to_string(),
    }
}

impl PortalService {
    /// Invite `target_student_id` into a forming group.
    ///
    /// Checks, in order: group exists, caller leads it, group is forming, no
    /// self-invite, target is free, no open duplicate, group capacity
    /// (members + pending invitations), then the leader's open invitation cap.
    pub async fn send_invitation(
        &self,
        leader_id: &str,
        group_id: &str,
        target_student_id: &str,
    ) -> Result<GroupInvitation, WorkflowError> {
        let _locks = self
            .lock([
                LockKey::Group(group_id.to_string()),
                LockKey::Student(target_student_id.to_string()),
            ])
            .await?;

        let group: Group = self.load(group_id).await?;
        self.require_leader(leader_id, &group).await?;
        if group.status != GroupStatus::Forming {
            return Err(WorkflowError::GroupNotForming {
                group_id: group.id,
                status: group.status.to_string(),
            });
        }
        if target_student_id == leader_id {
            return Err(WorkflowError::Validation(
                "a leader cannot invite themselves".into(),
            ));
        }
        let target: Student = self.load(target_student_id).await?;
        if target.in_group() {
            return Err(WorkflowError::TargetAlreadyInGroup(target.id));
        }

        let invitations: Vec<GroupInvitation> = self
            .query(&RecordFilter::all().eq("group_id", group_id))
            .await?;
        if invitations.iter().any(|i| {
            i.from_student_id == leader_id
                && i.to_student_id == target_student_id
                && i.status.is_outstanding()
        }) {
            return Err(WorkflowError::DuplicateInvitation {
                group_id: group_id.to_string(),
                student_id: target_student_id.to_string(),
            });
        }

        let pending = invitations
            .iter()
            .filter(|i| i.status == InvitationStatus::Pending)
            .count();
        if group.size() + pending >= self.max_group_size() {
            return Err(WorkflowError::GroupFull {
                group_id: group_id.to_string(),
                max: self.limits().max_group_size,
            });
        }

        let outstanding = invitations
            .iter()
            .filter(|i| i.from_student_id == leader_id && i.status.is_outstanding())
            .count();
        let cap = self.limits().max_outstanding_invitations;
        if outstanding >= cap as usize {
            return Err(WorkflowError::InvitationCapReached {
                group_id: group_id.to_string(),
                cap,
            });
        }

        let mut changes = Changeset::new(Some(leader_id));
        let now = changes.now();
        let invitation = GroupInvitation {
            id: generate_id(PREFIX_INVITATION)?,
            from_student_id: leader_id.to_string(),
            to_student_id: target_student_id.to_string(),
            group_id: group_id.to_string(),
            status: InvitationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        changes.created(&invitation)?;
        changes.emit(DomainEvent::InvitationSent {
            invitation_id: invitation.id.clone(),
            group_id: group_id.to_string(),
            to_student_id: target_student_id.to_string(),
        });
        self.apply(changes).await?;

        tracing::info!(invitation_id = %invitation.id, group_id, to = target_student_id, "invitation sent");
        Ok(invitation)
    }

    /// Accept an invitation and join its group.
    ///
    /// The student's other pending invitations are declined in the same batch.
    pub async fn accept_invitation(
        &self,
        student_id: &str,
        invitation_id: &str,
    ) -> Result<Group, WorkflowError> {
        let snapshot: GroupInvitation = self.load(invitation_id).await?;
        let _locks = self.lock(lock_keys(&snapshot)).await?;

        let mut invitation: GroupInvitation = self.load(invitation_id).await?;
        if invitation.to_student_id != student_id {
            return Err(WorkflowError::NotInvitee {
                invitation_id: invitation.id,
                student_id: student_id.to_string(),
            });
        }
        if invitation.status != InvitationStatus::Pending {
            return Err(already_resolved(invitation));
        }

        let mut student: Student = self.load(student_id).await?;
        if student.in_group() {
            return Err(WorkflowError::AlreadyInGroup(student.id));
        }
        if student.accepted_invitations >= self.limits().max_lifetime_accepts {
            return Err(WorkflowError::LifetimeAcceptCapReached(student.id));
        }

        let mut group: Group = self.load(&invitation.group_id).await?;
        if group.status != GroupStatus::Forming {
            return Err(WorkflowError::GroupNotForming {
                group_id: group.id,
                status: group.status.to_string(),
            });
        }
        if group.size() >= self.max_group_size() {
            return Err(WorkflowError::GroupFull {
                group_id: group.id,
                max: self.limits().max_group_size,
            });
        }

        let others: Vec<GroupInvitation> = self
            .query(
                &RecordFilter::all()
                    .eq("to_student_id", student_id)
                    .eq("status", InvitationStatus::Pending.as_str()),
            )
            .await?;

        let mut changes = Changeset::new(Some(student_id));
        let now = changes.now();

        group.add_member(student_id, self.max_group_size())?;
        group.updated_at = now;
        changes.updated(
            &group,
            detail(&MembershipDetail {
                student_id: student_id.to_string(),
                joined: true,
            })?,
        )?;

        student.group_id = Some(group.id.clone());
        student.group_name = Some(group.name.clone());
        student.is_group_admin = false;
        student.accepted_invitations += 1;
        student.updated_at = now;
        changes.updated(&student, None)?;

        invitation.status = InvitationStatus::Accepted;
        invitation.updated_at = now;
        changes.status_changed(
            &invitation,
            InvitationStatus::Pending,
            InvitationStatus::Accepted,
            None,
        )?;

        let mut declined = 0usize;
        for mut other in others.into_iter().filter(|o| o.id != invitation.id) {
            other.status = InvitationStatus::Declined;
            other.updated_at = now;
            changes.status_changed(
                &other,
                InvitationStatus::Pending,
                InvitationStatus::Declined,
                Some("joined another group"),
            )?;
            declined += 1;
        }

        changes.emit(DomainEvent::InvitationAccepted {
            invitation_id: invitation.id.clone(),
            group_id: group.id.clone(),
            student_id: student_id.to_string(),
        });
        self.apply(changes).await?;

        tracing::info!(invitation_id, group_id = %group.id, student_id, declined, "invitation accepted");
        Ok(group)
    }

    pub async fn decline_invitation(
        &self,
        student_id: &str,
        invitation_id: &str,
    ) -> Result<GroupInvitation, WorkflowError> {
        let snapshot: GroupInvitation = self.load(invitation_id).await?;
        let _locks = self.lock(lock_keys(&snapshot)).await?;

        let mut invitation: GroupInvitation = self.load(invitation_id).await?;
        if invitation.to_student_id != student_id {
            return Err(WorkflowError::NotInvitee {
                invitation_id: invitation.id,
                student_id: student_id.to_string(),
            });
        }
        if invitation.status != InvitationStatus::Pending {
            return Err(already_resolved(invitation));
        }

        let mut changes = Changeset::new(Some(student_id));
        invitation.status = InvitationStatus::Declined;
        invitation.updated_at = changes.now();
        changes.status_changed(
            &invitation,
            InvitationStatus::Pending,
            InvitationStatus::Declined,
            None,
        )?;
        self.apply(changes).await?;

        tracing::info!(invitation_id, student_id, "invitation declined");
        Ok(invitation)
    }

    /// Withdraw a pending invitation. Only its sender may cancel it.
    pub async fn cancel_invitation(
        &self,
        leader_id: &str,
        invitation_id: &str,
    ) -> Result<GroupInvitation, WorkflowError> {
        let snapshot: GroupInvitation = self.load(invitation_id).await?;
        let _locks = self.lock(lock_keys(&snapshot)).await?;

        let mut invitation: GroupInvitation = self.load(invitation_id).await?;
        if invitation.from_student_id != leader_id {
            return Err(WorkflowError::NotLeader {
                student_id: leader_id.to_string(),
                group_id: invitation.group_id,
            });
        }
        if invitation.status != InvitationStatus::Pending {
            return Err(already_resolved(invitation));
        }

        let mut changes = Changeset::new(Some(leader_id));
        invitation.status = InvitationStatus::Cancelled;
        invitation.updated_at = changes.now();
        changes.status_changed(
            &invitation,
            InvitationStatus::Pending,
            InvitationStatus::Cancelled,
            None,
        )?;
        self.apply(changes).await?;

        tracing::info!(invitation_id, leader_id, "invitation cancelled");
        Ok(invitation)
    }

    pub async fn get_invitation(&self, invitation_id: &str) -> Result<GroupInvitation, WorkflowError> {
        self.load(invitation_id).await
    }

    pub async fn list_sent_invitations(
        &self,
        leader_id: &str,
    ) -> Result<Vec<GroupInvitation>, WorkflowError> {
        self.query(&RecordFilter::all().eq("from_student_id", leader_id))
            .await
    }

    pub async fn list_received_invitations(
        &self,
        student_id: &str,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<GroupInvitation>, WorkflowError> {
        let mut filter = RecordFilter::all().eq("to_student_id", student_id);
        if let Some(status) = status {
            filter = filter.eq("status", status.as_str());
        }
        self.query(&filter).await
    }
}
