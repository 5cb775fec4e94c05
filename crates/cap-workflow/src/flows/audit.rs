//! Read access to the audit trail.

use cap_core::entities::AuditEntry;
use cap_store::RecordFilter;

use crate::WorkflowError;
use crate::service::PortalService;

impl PortalService {
    /// Newest-first audit entries, optionally for a single entity.
    pub async fn list_audit(
        &self,
        entity_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, WorkflowError> {
        let mut filter = RecordFilter::all().newest_first().limit(limit);
        if let Some(entity_id) = entity_id {
            filter = filter.eq("entity_id", entity_id);
        }
        self.query(&filter).await
    }
}

#[cfg(test)]
mod tests {
    use cap_core::enums::{AuditAction, EntityType};
    use pretty_assertions::assert_eq;

    use crate::test_support::helpers::{ADMIN, student, test_service};

    #[tokio::test]
    async fn entries_are_newest_first_with_actor() {
        let svc = test_service();
        let ada = student(&svc, "Ada").await;
        let request = svc.request_group_creation(&ada.id, "Parsers", None).await.unwrap();
        svc.reject_group_creation(ADMIN, &request.id, Some("name taken"))
            .await
            .unwrap();

        let entries = svc.list_audit(Some(&request.id), 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::StatusChanged);
        assert_eq!(entries[0].entity_type, EntityType::CreationRequest);
        assert_eq!(entries[0].actor_id.as_deref(), Some(ADMIN));
        assert_eq!(entries[0].detail.as_ref().unwrap()["reason"], "name taken");
        assert_eq!(entries[1].action, AuditAction::Created);
    }

    #[tokio::test]
    async fn limit_applies_across_entities() {
        let svc = test_service();
        for name in ["Ada", "Bob", "Carol"] {
            student(&svc, name).await;
        }
        assert_eq!(svc.list_audit(None, 2).await.unwrap().len(), 2);
    }
}
