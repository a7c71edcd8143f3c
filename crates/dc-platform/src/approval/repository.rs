//! Approval request queries

use crate::approval::entity::ApprovalRequest;
use crate::lifecycle::ApprovalStatus;
use crate::shared::error::Result;
use crate::store::Repository;

pub trait ApprovalQueries {
    fn find_by_student(&self, student_id: &str) -> Result<Vec<ApprovalRequest>>;

    /// Requests waiting on a professor's decision, oldest first.
    fn find_pending_for_professor(&self, professor_id: &str) -> Result<Vec<ApprovalRequest>>;

    /// An open request by the same student for the same patient and specialty.
    fn find_open_duplicate(
        &self,
        student_id: &str,
        patient_id: &str,
        specialty: &str,
    ) -> Result<Option<ApprovalRequest>>;
}

impl<R: Repository<ApprovalRequest> + ?Sized> ApprovalQueries for R {
    fn find_by_student(&self, student_id: &str) -> Result<Vec<ApprovalRequest>> {
        self.find_where(&|r: &ApprovalRequest| r.student_id == student_id)
    }

    fn find_pending_for_professor(&self, professor_id: &str) -> Result<Vec<ApprovalRequest>> {
        self.find_where(&|r: &ApprovalRequest| {
            r.professor_id == professor_id && r.status == ApprovalStatus::Pending
        })
    }

    fn find_open_duplicate(
        &self,
        student_id: &str,
        patient_id: &str,
        specialty: &str,
    ) -> Result<Option<ApprovalRequest>> {
        Ok(self
            .find_where(&|r: &ApprovalRequest| {
                r.is_pending()
                    && r.student_id == student_id
                    && r.patient_id == patient_id
                    && r.specialty.eq_ignore_ascii_case(specialty)
            })?
            .into_iter()
            .next())
    }
}
