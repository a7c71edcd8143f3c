//! Assignment queries

use crate::assignment::entity::Assignment;
use crate::shared::error::Result;
use crate::store::Repository;

pub trait AssignmentQueries {
    fn find_by_professor(&self, professor_id: &str) -> Result<Vec<Assignment>>;

    /// Assignments whose cohort includes the student.
    fn find_for_student(&self, student_id: &str) -> Result<Vec<Assignment>>;
}

impl<R: Repository<Assignment> + ?Sized> AssignmentQueries for R {
    fn find_by_professor(&self, professor_id: &str) -> Result<Vec<Assignment>> {
        self.find_where(&|a: &Assignment| a.professor_id == professor_id)
    }

    fn find_for_student(&self, student_id: &str) -> Result<Vec<Assignment>> {
        self.find_where(&|a: &Assignment| a.cohort.iter().any(|s| s == student_id))
    }
}
