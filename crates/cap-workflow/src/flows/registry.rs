//! Student and teacher registration and lookup.
//!
//! Accounts are created here rather than written to the store directly, so
//! every record carries an audit entry and a well-formed id.

use cap_core::entities::{Student, Teacher};
use cap_core::ids::{PREFIX_STUDENT, PREFIX_TEACHER, generate_id};
use cap_store::RecordFilter;

use crate::WorkflowError;
use crate::service::{Changeset, PortalService};

fn validate_contact(name: &str, email: &str) -> Result<(), WorkflowError> {
    if name.trim().is_empty() {
        return Err(WorkflowError::Validation("name must not be empty".into()));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(WorkflowError::Validation(format!(
            "'{email}' is not an email address"
        )));
    }
    Ok(())
}

impl PortalService {
    pub async fn register_student(&self, name: &str, email: &str) -> Result<Student, WorkflowError> {
        validate_contact(name, email)?;
        let mut changes = Changeset::new(None);
        let now = changes.now();
        let student = Student {
            id: generate_id(PREFIX_STUDENT)?,
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            group_id: None,
            group_name: None,
            is_group_admin: false,
            accepted_invitations: 0,
            created_at: now,
            updated_at: now,
        };
        changes.created(&student)?;
        self.apply(changes).await?;

        tracing::info!(student_id = %student.id, "student registered");
        Ok(student)
    }

    pub async fn register_teacher(
        &self,
        name: &str,
        email: &str,
        max_students: u32,
        accepted_topics: Vec<String>,
    ) -> Result<Teacher, WorkflowError> {
        validate_contact(name, email)?;
        if max_students == 0 {
            return Err(WorkflowError::Validation(
                "max_students must be at least 1".into(),
            ));
        }
        let mut changes = Changeset::new(None);
        let now = changes.now();
        let teacher = Teacher {
            id: generate_id(PREFIX_TEACHER)?,
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            max_students,
            current_students_count: 0,
            accepted_topics,
            created_at: now,
            updated_at: now,
        };
        changes.created(&teacher)?;
        self.apply(changes).await?;

        tracing::info!(teacher_id = %teacher.id, max_students, "teacher registered");
        Ok(teacher)
    }

    pub async fn get_student(&self, student_id: &str) -> Result<Student, WorkflowError> {
        self.load(student_id).await
    }

    pub async fn get_teacher(&self, teacher_id: &str) -> Result<Teacher, WorkflowError> {
        self.load(teacher_id).await
    }

    /// Students in `group_id`, or every student without a group when `None`.
    pub async fn list_students(&self, group_id: Option<&str>) -> Result<Vec<Student>, WorkflowError> {
        let filter = match group_id {
            Some(group_id) => RecordFilter::all().eq("group_id", group_id),
            None => RecordFilter::all().is_null("group_id"),
        };
        self.query(&filter).await
    }

    /// Teachers, optionally only those with an open supervision slot.
    pub async fn list_teachers(&self, available_only: bool) -> Result<Vec<Teacher>, WorkflowError> {
        let teachers: Vec<Teacher> = self.query(&RecordFilter::all()).await?;
        Ok(teachers
            .into_iter()
            .filter(|t| !available_only || t.has_capacity())
            .collect())
    }
}
