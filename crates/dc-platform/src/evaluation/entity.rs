//! Evaluation Entity

use chrono::{DateTime, Utc};
use dc_common::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::lifecycle::EvaluationStatus;
use crate::shared::authorization_service::{Governed, Target};
use crate::shared::tsid::TsidGenerator;
use crate::store::{Entity, EntityKind, EntityStore, Repository, StoredEntity};
use crate::usecase::{Audience, Recipient};

/// Highest overall grade.
pub const GRADE_SCALE: f64 = 10.0;

/// One graded aspect of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub name: String,
    /// Relative weight, > 0
    pub weight: f64,
    /// Highest score for this criterion, > 0
    pub max_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Criterion {
    pub fn new(name: impl Into<String>, weight: f64, max_score: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            max_score,
            score: None,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.score.is_some()
    }
}

/// A professor's graded assessment of a student.
///
/// The overall grade is derived from the criteria on every read and never
/// stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: String,
    pub student_id: String,
    pub professor_id: String,
    pub title: String,
    pub criteria: Vec<Criterion>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,

    pub status: EvaluationStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn new(
        student_id: impl Into<String>,
        professor_id: impl Into<String>,
        title: impl Into<String>,
        criteria: Vec<Criterion>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            student_id: student_id.into(),
            professor_id: professor_id.into(),
            title: title.into(),
            criteria,
            comments: None,
            status: EvaluationStatus::Pending,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn all_scored(&self) -> bool {
        self.criteria.iter().all(Criterion::is_scored)
    }

    /// Weighted average of the scored criteria on a 0-10 scale, rounded to
    /// two decimals. `None` until at least one criterion is scored.
    pub fn overall_grade(&self) -> Option<f64> {
        let (weighted, weights) = self
            .criteria
            .iter()
            .filter_map(|c| c.score.map(|s| (s / c.max_score * c.weight, c.weight)))
            .fold((0.0, 0.0), |(sum, total), (part, weight)| (sum + part, total + weight));

        if weights <= 0.0 {
            return None;
        }

        let grade = weighted / weights * GRADE_SCALE;
        Some((grade * 100.0).round() / 100.0)
    }
}

impl Entity for Evaluation {
    const KIND: EntityKind = EntityKind::Evaluation;

    fn id(&self) -> &str {
        &self.id
    }

    fn summary(&self) -> String {
        self.title.clone()
    }

    fn audience(&self) -> Audience {
        Audience::new(Recipient::new(&self.professor_id, Role::Professor))
            .with_participant(Recipient::new(&self.student_id, Role::Student))
    }
}

impl StoredEntity for Evaluation {
    fn repository(store: &EntityStore) -> &dyn Repository<Self> {
        store.evaluations.as_ref()
    }
}

impl Governed for Evaluation {
    fn target(&self) -> Target<'_> {
        Target {
            owner_id: Some(&self.professor_id),
            assignee_id: None,
            participant_ids: vec![self.student_id.as_str()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(name: &str, weight: f64, max: f64, score: Option<f64>) -> Criterion {
        Criterion {
            score,
            ..Criterion::new(name, weight, max)
        }
    }

    #[test]
    fn test_grade_is_weighted_and_normalized() {
        let eval = Evaluation::new(
            "stu-1",
            "prof-1",
            "Midterm practical",
            vec![
                scored("Technique", 2.0, 20.0, Some(15.0)),
                scored("Hygiene", 1.0, 5.0, Some(5.0)),
            ],
        );
        // (0.75 * 2 + 1.0 * 1) / 3 * 10 = 8.33
        assert_eq!(eval.overall_grade(), Some(8.33));
    }

    #[test]
    fn test_grade_ignores_unscored_criteria() {
        let eval = Evaluation::new(
            "stu-1",
            "prof-1",
            "Lab check",
            vec![
                scored("Setup", 1.0, 10.0, Some(10.0)),
                scored("Report", 3.0, 10.0, None),
            ],
        );
        assert_eq!(eval.overall_grade(), Some(10.0));
        assert!(!eval.all_scored());
    }

    #[test]
    fn test_no_scores_no_grade() {
        let eval = Evaluation::new("stu-1", "prof-1", "Quiz", vec![Criterion::new("Theory", 1.0, 10.0)]);
        assert_eq!(eval.overall_grade(), None);
    }
}
