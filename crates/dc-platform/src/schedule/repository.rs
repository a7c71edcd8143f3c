//! Schedule queries

use chrono::NaiveTime;

use crate::lifecycle::ScheduleStatus;
use crate::schedule::entity::{DayOfWeek, Schedule};
use crate::shared::error::Result;
use crate::store::Repository;

pub trait ScheduleQueries {
    fn find_by_status(&self, status: ScheduleStatus) -> Result<Vec<Schedule>>;

    fn find_by_instructor(&self, instructor_id: &str) -> Result<Vec<Schedule>>;

    /// A non-cancelled schedule, other than `exclude_id`, that holds the same
    /// room or instructor at an overlapping time on the same weekday.
    fn find_clash(
        &self,
        exclude_id: Option<&str>,
        room: &str,
        instructor_id: &str,
        day: DayOfWeek,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Option<Schedule>>;
}

impl<R: Repository<Schedule> + ?Sized> ScheduleQueries for R {
    fn find_by_status(&self, status: ScheduleStatus) -> Result<Vec<Schedule>> {
        self.find_where(&|s: &Schedule| s.status == status)
    }

    fn find_by_instructor(&self, instructor_id: &str) -> Result<Vec<Schedule>> {
        self.find_where(&|s: &Schedule| s.instructor_id == instructor_id)
    }

    fn find_clash(
        &self,
        exclude_id: Option<&str>,
        room: &str,
        instructor_id: &str,
        day: DayOfWeek,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Option<Schedule>> {
        Ok(self
            .find_where(&|s: &Schedule| {
                Some(s.id.as_str()) != exclude_id
                    && s.status != ScheduleStatus::Cancelled
                    && s.day_of_week == day
                    && (s.room.eq_ignore_ascii_case(room) || s.instructor_id == instructor_id)
                    && s.start_time < end
                    && start < s.end_time
            })?
            .into_iter()
            .next())
    }
}
