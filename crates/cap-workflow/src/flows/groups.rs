//! Group formation engine: creation requests, approval, confirmation, and
//! dissolution.
//!
//! ```text
//! request ──approve──▶ group(forming) ──confirm──▶ group(active)
//!    └──reject                 └────────dissolve────────┴──▶ dissolved
//! ```

use cap_core::audit_detail::MembershipDetail;
use cap_core::entities::{
    Group, GroupCreationRequest, GroupInvitation, GroupMember, Student, SupervisionRequest,
};
use cap_core::enums::{
    CreationRequestStatus, EntityType, GroupStatus, InvitationStatus, MemberRole,
};
use cap_core::events::DomainEvent;
use cap_core::ids::{PREFIX_CREATION_REQUEST, PREFIX_GROUP, generate_id};
use cap_store::RecordFilter;

use crate::WorkflowError;
use crate::flows::supervision::releasable_teacher_keys;
use crate::locks::LockKey;
use crate::service::{Changeset, PortalService, detail, ensure_transition};

impl PortalService {
    /// Load `student_id` and check that they lead `group`.
    pub(crate) async fn require_leader(
        &self,
        student_id: &str,
        group: &Group,
    ) -> Result<Student, WorkflowError> {
        let not_leader = || WorkflowError::NotLeader {
            student_id: student_id.to_string(),
            group_id: group.id.clone(),
        };
        if group.leader_student_id != student_id {
            return Err(not_leader());
        }
        let student: Student = self.load(student_id).await?;
        if !student.leads(&group.id) {
            return Err(not_leader());
        }
        Ok(student)
    }

    /// Pending invitations into `group_id`. Callers holding the group lock
    /// see no new ones appear, but an invitee's accept elsewhere can still
    /// decline one until the invitee's key is held too.
    async fn pending_invitations(&self, group_id: &str) -> Result<Vec<GroupInvitation>, WorkflowError> {
        self.query(
            &RecordFilter::all()
                .eq("group_id", group_id)
                .eq("status", InvitationStatus::Pending.as_str()),
        )
        .await
    }

    async fn load_creation_request(
        &self,
        request_id: &str,
    ) -> Result<GroupCreationRequest, WorkflowError> {
        self.find(request_id)
            .await?
            .ok_or_else(|| WorkflowError::RequestNotFound(request_id.to_string()))
    }

    /// Ask an admin to found a group led by `student_id`.
    pub async fn request_group_creation(
        &self,
        student_id: &str,
        group_name: &str,
        description: Option<&str>,
    ) -> Result<GroupCreationRequest, WorkflowError> {
        let group_name = group_name.trim();
        if group_name.is_empty() {
            return Err(WorkflowError::Validation("group name must not be empty".into()));
        }

        let _locks = self.lock([LockKey::Student(student_id.to_string())]).await?;
        let student: Student = self.load(student_id).await?;
        if student.in_group() {
            return Err(WorkflowError::AlreadyInGroup(student_id.to_string()));
        }

        let previous: Vec<GroupCreationRequest> = self
            .query(&RecordFilter::all().eq("student_id", student_id))
            .await?;
        for request in &previous {
            let blocks = match request.status {
                CreationRequestStatus::Pending => true,
                CreationRequestStatus::Approved => match &request.group_id {
                    Some(group_id) => self
                        .find::<Group>(group_id)
                        .await?
                        .is_some_and(|g| g.status != GroupStatus::Dissolved),
                    None => false,
                },
                CreationRequestStatus::Rejected => false,
            };
            if blocks {
                return Err(WorkflowError::DuplicatePendingRequest(student_id.to_string()));
            }
        }

        let mut changes = Changeset::new(Some(student_id));
        let now = changes.now();
        let request = GroupCreationRequest {
            id: generate_id(PREFIX_CREATION_REQUEST)?,
            student_id: student_id.to_string(),
            group_name: group_name.to_string(),
            description: description.map(str::to_string),
            status: CreationRequestStatus::Pending,
            group_id: None,
            reason: None,
            created_at: now,
            updated_at: now,
        };
        changes.created(&request)?;
        self.apply(changes).await?;

        tracing::info!(request_id = %request.id, student_id, "group creation requested");
        Ok(request)
    }

    /// Approve a pending creation request: the group is created in `forming`
    /// with the requester as its sole leader member.
    pub async fn approve_group_creation(
        &self,
        admin_id: &str,
        request_id: &str,
    ) -> Result<Group, WorkflowError> {
        let snapshot = self.load_creation_request(request_id).await?;
        let _locks = self
            .lock([LockKey::Student(snapshot.student_id.clone())])
            .await?;

        let mut request = self.load_creation_request(request_id).await?;
        if request.status != CreationRequestStatus::Pending {
            return Err(WorkflowError::RequestNotPending {
                id: request.id,
                status: request.status.to_string(),
            });
        }
        let mut student: Student = self.load(&request.student_id).await?;
        if student.in_group() {
            return Err(WorkflowError::AlreadyInGroup(student.id));
        }

        let mut changes = Changeset::new(Some(admin_id));
        let now = changes.now();
        let group = Group {
            id: generate_id(PREFIX_GROUP)?,
            name: request.group_name.clone(),
            description: request.description.clone(),
            leader_student_id: student.id.clone(),
            members: vec![GroupMember {
                student_id: student.id.clone(),
                role: MemberRole::Leader,
            }],
            status: GroupStatus::Forming,
            created_at: now,
            updated_at: now,
        };
        group.validate(self.max_group_size())?;

        student.group_id = Some(group.id.clone());
        student.group_name = Some(group.name.clone());
        student.is_group_admin = true;
        student.updated_at = now;

        request.status = CreationRequestStatus::Approved;
        request.group_id = Some(group.id.clone());
        request.updated_at = now;

        changes.created(&group)?;
        changes.updated(
            &student,
            detail(&MembershipDetail {
                student_id: student.id.clone(),
                joined: true,
            })?,
        )?;
        changes.status_changed(
            &request,
            CreationRequestStatus::Pending,
            CreationRequestStatus::Approved,
            None,
        )?;
        changes.emit(DomainEvent::GroupFormed {
            group_id: group.id.clone(),
            leader_student_id: student.id.clone(),
        });
        self.apply(changes).await?;

        tracing::info!(group_id = %group.id, leader = %student.id, request_id, "group formed");
        Ok(group)
    }

    pub async fn reject_group_creation(
        &self,
        admin_id: &str,
        request_id: &str,
        reason: Option<&str>,
    ) -> Result<GroupCreationRequest, WorkflowError> {
        let snapshot = self.load_creation_request(request_id).await?;
        let _locks = self
            .lock([LockKey::Student(snapshot.student_id.clone())])
            .await?;

        let mut request = self.load_creation_request(request_id).await?;
        if request.status != CreationRequestStatus::Pending {
            return Err(WorkflowError::RequestNotPending {
                id: request.id,
                status: request.status.to_string(),
            });
        }

        let mut changes = Changeset::new(Some(admin_id));
        request.status = CreationRequestStatus::Rejected;
        request.reason = reason.map(str::to_string);
        request.updated_at = changes.now();
        changes.status_changed(
            &request,
            CreationRequestStatus::Pending,
            CreationRequestStatus::Rejected,
            reason,
        )?;
        self.apply(changes).await?;

        tracing::info!(request_id, "group creation rejected");
        Ok(request)
    }

    /// Close membership: `forming → active`. Outstanding invitations are
    /// cancelled since they can no longer be accepted.
    pub async fn confirm_group(&self, leader_id: &str, group_id: &str) -> Result<Group, WorkflowError> {
        let _locks = self.lock([LockKey::Group(group_id.to_string())]).await?;
        let mut group: Group = self.load(group_id).await?;
        self.require_leader(leader_id, &group).await?;
        if group.status != GroupStatus::Forming {
            return Err(WorkflowError::GroupNotForming {
                group_id: group.id,
                status: group.status.to_string(),
            });
        }
        group.validate(self.max_group_size())?;

        let invitees = self.pending_invitations(group_id).await?;
        let _invitee_locks = self
            .lock(invitees.into_iter().map(|i| LockKey::Student(i.to_student_id)))
            .await?;
        let pending = self.pending_invitations(group_id).await?;

        let mut changes = Changeset::new(Some(leader_id));
        let now = changes.now();
        for mut invitation in pending {
            invitation.status = InvitationStatus::Cancelled;
            invitation.updated_at = now;
            changes.status_changed(
                &invitation,
                InvitationStatus::Pending,
                InvitationStatus::Cancelled,
                Some("group confirmed"),
            )?;
        }
        group.status = GroupStatus::Active;
        group.updated_at = now;
        changes.status_changed(&group, GroupStatus::Forming, GroupStatus::Active, None)?;
        changes.emit(DomainEvent::GroupActivated {
            group_id: group.id.clone(),
            member_ids: group.member_ids(),
        });
        self.apply(changes).await?;

        tracing::info!(group_id, members = group.size(), "group activated");
        Ok(group)
    }

    /// Dissolve a group and release everything attached to it.
    ///
    /// Members lose their group fields, pending invitations and pending
    /// supervision requests are cancelled, and an accepted request that has
    /// not been finalized is cancelled with its teacher slot released.
    /// Authorization of `actor_id` (leader or admin) is the caller's concern;
    /// the actor is recorded in the audit trail.
    pub async fn dissolve_group(&self, actor_id: &str, group_id: &str) -> Result<Group, WorkflowError> {
        let _group_lock = self.lock([LockKey::Group(group_id.to_string())]).await?;
        let mut group: Group = self.load(group_id).await?;
        ensure_transition(
            EntityType::Group,
            group_id,
            group.status,
            GroupStatus::Dissolved,
            group.status.can_transition_to(GroupStatus::Dissolved),
        )?;

        let requests: Vec<SupervisionRequest> = self
            .query(&RecordFilter::all().eq("group_id", group_id))
            .await?;
        let teacher_keys = releasable_teacher_keys(&requests);

        let invitee_keys: Vec<LockKey> = self
            .pending_invitations(group_id)
            .await?
            .into_iter()
            .map(|i| LockKey::Student(i.to_student_id))
            .collect();

        // Student and teacher keys sort after every group key.
        let member_keys = group.member_ids().into_iter().map(LockKey::Student);
        let _member_locks = self
            .lock(member_keys.chain(invitee_keys).chain(teacher_keys))
            .await?;

        // An invitee may have joined elsewhere before we held their key.
        let invitations = self.pending_invitations(group_id).await?;

        let mut changes = Changeset::new(Some(actor_id));
        let now = changes.now();

        let mut released = Vec::with_capacity(group.size());
        for student_id in group.member_ids() {
            let Some(mut student) = self.find::<Student>(&student_id).await? else {
                tracing::warn!(group_id, student_id, "member record missing during dissolution");
                continue;
            };
            if student.group_id.as_deref() == Some(group_id) {
                student.leave_group(now);
                changes.updated(
                    &student,
                    detail(&MembershipDetail {
                        student_id: student.id.clone(),
                        joined: false,
                    })?,
                )?;
            }
            released.push(student_id);
        }

        for mut invitation in invitations {
            invitation.status = InvitationStatus::Cancelled;
            invitation.updated_at = now;
            changes.status_changed(
                &invitation,
                InvitationStatus::Pending,
                InvitationStatus::Cancelled,
                Some("group dissolved"),
            )?;
        }

        self.withdraw_requests(&mut changes, requests, "group dissolved")
            .await?;

        let from = group.status;
        group.status = GroupStatus::Dissolved;
        group.updated_at = now;
        changes.status_changed(&group, from, GroupStatus::Dissolved, None)?;
        changes.emit(DomainEvent::GroupDissolved {
            group_id: group.id.clone(),
            released_student_ids: released,
        });
        self.apply(changes).await?;

        tracing::info!(group_id, actor_id, "group dissolved");
        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group, WorkflowError> {
        self.load(group_id).await
    }

    pub async fn list_groups(&self, status: Option<GroupStatus>) -> Result<Vec<Group>, WorkflowError> {
        let filter = match status {
            Some(status) => RecordFilter::all().eq("status", status.as_str()),
            None => RecordFilter::all(),
        };
        self.query(&filter).await
    }

    pub async fn get_creation_request(
        &self,
        request_id: &str,
    ) -> Result<GroupCreationRequest, WorkflowError> {
        self.load_creation_request(request_id).await
    }

    pub async fn list_creation_requests(
        &self,
        status: Option<CreationRequestStatus>,
    ) -> Result<Vec<GroupCreationRequest>, WorkflowError> {
        let filter = match status {
            Some(status) => RecordFilter::all().eq("status", status.as_str()),
            None => RecordFilter::all(),
        };
        self.query(&filter).await
    }
}
