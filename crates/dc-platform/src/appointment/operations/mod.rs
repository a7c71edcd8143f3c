//! Appointment Operations

pub mod book;
pub mod transition;

pub use book::{BookAppointmentCommand, BookAppointmentUseCase};
pub use transition::{TransitionAppointmentCommand, TransitionAppointmentUseCase};
