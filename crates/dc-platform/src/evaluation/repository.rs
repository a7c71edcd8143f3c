//! Evaluation queries

use crate::evaluation::entity::Evaluation;
use crate::shared::error::Result;
use crate::store::Repository;

pub trait EvaluationQueries {
    fn find_by_student(&self, student_id: &str) -> Result<Vec<Evaluation>>;

    fn find_by_professor(&self, professor_id: &str) -> Result<Vec<Evaluation>>;
}

impl<R: Repository<Evaluation> + ?Sized> EvaluationQueries for R {
    fn find_by_student(&self, student_id: &str) -> Result<Vec<Evaluation>> {
        self.find_where(&|e: &Evaluation| e.student_id == student_id)
    }

    fn find_by_professor(&self, professor_id: &str) -> Result<Vec<Evaluation>> {
        self.find_where(&|e: &Evaluation| e.professor_id == professor_id)
    }
}
