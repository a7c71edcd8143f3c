//! Clinical case queries

use crate::clinical_case::entity::ClinicalCase;
use crate::lifecycle::CaseApprovalStatus;
use crate::shared::error::Result;
use crate::store::Repository;

pub trait CaseQueries {
    fn find_by_student(&self, student_id: &str) -> Result<Vec<ClinicalCase>>;

    fn find_by_patient(&self, patient_id: &str) -> Result<Vec<ClinicalCase>>;

    /// Cases waiting on the professor's review.
    fn find_awaiting_review(&self, professor_id: &str) -> Result<Vec<ClinicalCase>>;
}

impl<R: Repository<ClinicalCase> + ?Sized> CaseQueries for R {
    fn find_by_student(&self, student_id: &str) -> Result<Vec<ClinicalCase>> {
        self.find_where(&|c: &ClinicalCase| c.student_id == student_id)
    }

    fn find_by_patient(&self, patient_id: &str) -> Result<Vec<ClinicalCase>> {
        self.find_where(&|c: &ClinicalCase| c.patient_id == patient_id)
    }

    fn find_awaiting_review(&self, professor_id: &str) -> Result<Vec<ClinicalCase>> {
        self.find_where(&|c: &ClinicalCase| {
            c.professor_id == professor_id && c.approval_status == CaseApprovalStatus::Pending
        })
    }
}
