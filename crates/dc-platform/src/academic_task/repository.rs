//! Academic task queries

use crate::academic_task::entity::AcademicTask;
use crate::shared::error::Result;
use crate::store::Repository;

pub trait TaskQueries {
    fn find_by_student(&self, student_id: &str) -> Result<Vec<AcademicTask>>;

    fn find_by_professor(&self, professor_id: &str) -> Result<Vec<AcademicTask>>;

    fn find_by_assignment(&self, assignment_id: &str) -> Result<Vec<AcademicTask>>;
}

impl<R: Repository<AcademicTask> + ?Sized> TaskQueries for R {
    fn find_by_student(&self, student_id: &str) -> Result<Vec<AcademicTask>> {
        self.find_where(&|t: &AcademicTask| t.student_id == student_id)
    }

    fn find_by_professor(&self, professor_id: &str) -> Result<Vec<AcademicTask>> {
        self.find_where(&|t: &AcademicTask| t.professor_id == professor_id)
    }

    fn find_by_assignment(&self, assignment_id: &str) -> Result<Vec<AcademicTask>> {
        self.find_where(&|t: &AcademicTask| t.assignment_id.as_deref() == Some(assignment_id))
    }
}
