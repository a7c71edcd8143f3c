//! Schedule Operations

pub mod create;
pub mod delete;
pub mod enroll;
pub mod status;
pub mod update;

pub use create::{CreateScheduleCommand, CreateScheduleUseCase};
pub use delete::DeleteScheduleUseCase;
pub use enroll::{EnrollInScheduleUseCase, ReleaseReservationUseCase};
pub use status::SetScheduleStatusUseCase;
pub use update::{UpdateScheduleCommand, UpdateScheduleUseCase};
