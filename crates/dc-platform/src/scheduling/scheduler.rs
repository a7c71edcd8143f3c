//! Capacity Scheduler
//!
//! Sole writer of schedule enrollment and appointment slot occupancy. Every
//! check-and-update runs under a per-resource lock (`schedule:{id}` or
//! `practitioner:{id}`), so concurrent requests for one resource are served
//! one at a time in arrival order.

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use dc_common::Role;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::policy::BookingPolicy;
use super::slot::TimeSlot;
use crate::appointment::entity::Appointment;
use crate::appointment::repository::AppointmentQueries;
use crate::lifecycle::{apply_transition, AppointmentLifecycle, AppointmentStatus, ScheduleStatus, TransitionPayload};
use crate::schedule::entity::Schedule;
use crate::shared::error::{PlatformError, Result};
use crate::shared::tsid::TsidGenerator;
use crate::store::EntityStore;
use crate::usecase::{ExecutionContext, UnitOfWork, WorkflowEvent};

/// What a reservation holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReservationKind {
    #[serde(rename_all = "camelCase")]
    Seat { schedule_id: String, holder_id: String },
    #[serde(rename_all = "camelCase")]
    Slot {
        appointment_id: String,
        practitioner_id: String,
        patient_id: String,
    },
}

/// Proof of a successful reservation, used to release it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationToken {
    pub id: String,
    pub kind: ReservationKind,
    pub issued_at: DateTime<Utc>,
}

impl ReservationToken {
    fn new(kind: ReservationKind) -> Self {
        Self {
            id: TsidGenerator::generate(),
            kind,
            issued_at: Utc::now(),
        }
    }

    /// Person the reservation was made for.
    pub fn holder_id(&self) -> &str {
        match &self.kind {
            ReservationKind::Seat { holder_id, .. } => holder_id,
            ReservationKind::Slot { patient_id, .. } => patient_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub schedule_id: String,
    pub capacity: u32,
    pub enrolled: u32,
    pub is_full: bool,
}

/// Everything needed to claim an appointment slot.
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub patient_id: String,
    pub practitioner_id: String,
    pub practitioner_role: Role,
    pub specialty: String,
    pub slot: TimeSlot,
    pub notes: Option<String>,
}

pub struct CapacityScheduler {
    store: Arc<EntityStore>,
    unit_of_work: Arc<dyn UnitOfWork>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    held: DashMap<String, ReservationToken>,
    policy: RwLock<BookingPolicy>,
}

impl CapacityScheduler {
    pub fn new(store: Arc<EntityStore>, unit_of_work: Arc<dyn UnitOfWork>, policy: BookingPolicy) -> Self {
        Self {
            store,
            unit_of_work,
            locks: DashMap::new(),
            held: DashMap::new(),
            policy: RwLock::new(policy),
        }
    }

    fn lock_for(&self, key: String) -> Arc<Mutex<()>> {
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding the schedule's lock. Any write to a schedule
    /// record goes through here so it cannot interleave with enrollment.
    pub fn with_schedule_lock<R>(&self, schedule_id: &str, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let lock = self.lock_for(format!("schedule:{schedule_id}"));
        let _guard = lock.lock();
        f()
    }

    pub fn with_practitioner_lock<R>(&self, practitioner_id: &str, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let lock = self.lock_for(format!("practitioner:{practitioner_id}"));
        let _guard = lock.lock();
        f()
    }

    // ------------------------------------------------------------------------
    // Seats
    // ------------------------------------------------------------------------

    /// Take one seat on an active schedule.
    pub fn reserve_seat(&self, ctx: &ExecutionContext, schedule_id: &str, requester_id: &str) -> Result<ReservationToken> {
        self.with_schedule_lock(schedule_id, || {
            let mut schedule = self.store.schedules.require(schedule_id)?;

            if schedule.status != ScheduleStatus::Active {
                return Err(PlatformError::validation(
                    "SCHEDULE_NOT_ACTIVE",
                    format!("schedule {} is {}", schedule.id, schedule.status),
                ));
            }

            if self.holds_seat(schedule_id, requester_id) {
                return Err(PlatformError::validation(
                    "ALREADY_ENROLLED",
                    format!("{} already holds a seat on schedule {}", requester_id, schedule_id),
                ));
            }

            if schedule.is_full() {
                warn!(
                    schedule_id,
                    requester_id,
                    capacity = schedule.capacity,
                    "Seat reservation rejected: schedule full"
                );
                return Err(PlatformError::CapacityExceeded {
                    schedule_id: schedule.id.clone(),
                    capacity: schedule.capacity,
                });
            }

            schedule.enrolled += 1;
            schedule.updated_at = Utc::now();

            let event = WorkflowEvent::updated(ctx, &schedule, &["enrolled"]);
            self.unit_of_work.commit(&schedule, event)?;

            let token = ReservationToken::new(ReservationKind::Seat {
                schedule_id: schedule.id.clone(),
                holder_id: requester_id.to_string(),
            });
            self.held.insert(token.id.clone(), token.clone());

            info!(
                schedule_id,
                requester_id,
                enrolled = schedule.enrolled,
                capacity = schedule.capacity,
                "Seat reserved"
            );
            Ok(token)
        })
    }

    fn holds_seat(&self, schedule_id: &str, holder: &str) -> bool {
        self.held.iter().any(|entry| {
            matches!(
                &entry.value().kind,
                ReservationKind::Seat { schedule_id: s, holder_id: h } if s == schedule_id && h == holder
            )
        })
    }

    /// Ids of everyone holding a seat on the schedule.
    pub fn seat_holders(&self, schedule_id: &str) -> Vec<String> {
        self.held
            .iter()
            .filter_map(|entry| match &entry.value().kind {
                ReservationKind::Seat { schedule_id: s, holder_id } if s == schedule_id => Some(holder_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn check_availability(&self, schedule_id: &str) -> Result<Availability> {
        let schedule = self.store.schedules.require(schedule_id)?;
        Ok(Availability {
            schedule_id: schedule.id.clone(),
            capacity: schedule.capacity,
            enrolled: schedule.enrolled,
            is_full: schedule.is_full(),
        })
    }

    /// Capacity rules for a schedule about to change size.
    pub fn check_resize(schedule: &Schedule, capacity: u32) -> Result<()> {
        if capacity == 0 {
            return Err(PlatformError::validation("INVALID_CAPACITY", "capacity must be at least 1"));
        }
        if capacity < schedule.enrolled {
            return Err(PlatformError::validation(
                "CAPACITY_BELOW_ENROLLED",
                format!(
                    "capacity {} is below the {} seats already taken",
                    capacity, schedule.enrolled
                ),
            ));
        }
        Ok(())
    }

    pub fn resize(&self, ctx: &ExecutionContext, schedule_id: &str, capacity: u32) -> Result<Schedule> {
        self.with_schedule_lock(schedule_id, || {
            let mut schedule = self.store.schedules.require(schedule_id)?;
            Self::check_resize(&schedule, capacity)?;

            schedule.capacity = capacity;
            schedule.updated_at = Utc::now();

            let event = WorkflowEvent::updated(ctx, &schedule, &["capacity"]);
            self.unit_of_work.commit(&schedule, event)?;
            Ok(schedule)
        })
    }

    /// Drop the tokens of a deleted schedule; releasing them later is a no-op.
    pub fn forget_schedule(&self, schedule_id: &str) {
        self.held.retain(|_, token| {
            !matches!(&token.kind, ReservationKind::Seat { schedule_id: s, .. } if s == schedule_id)
        });
    }

    // ------------------------------------------------------------------------
    // Appointment slots
    // ------------------------------------------------------------------------

    /// Create a pending appointment if the practitioner is free for the slot.
    pub fn reserve_slot(&self, ctx: &ExecutionContext, request: SlotRequest) -> Result<(ReservationToken, Appointment)> {
        let slot = request.slot.validated()?;

        self.with_practitioner_lock(&request.practitioner_id, || {
            if let Some(existing) = self.store.appointments.find_conflict(&request.practitioner_id, &slot)? {
                warn!(
                    practitioner_id = %request.practitioner_id,
                    slot = %slot,
                    conflicting_id = %existing.id,
                    "Slot reservation rejected: overlap"
                );
                return Err(PlatformError::SlotConflict {
                    practitioner_id: request.practitioner_id.clone(),
                    conflicting_id: existing.id,
                });
            }

            let mut appointment = Appointment::new(
                &request.patient_id,
                &request.practitioner_id,
                request.practitioner_role,
                &request.specialty,
                slot,
            );
            if let Some(notes) = &request.notes {
                appointment = appointment.with_notes(notes);
            }

            let event = WorkflowEvent::created(ctx, &appointment);
            self.unit_of_work.commit(&appointment, event)?;

            let token = ReservationToken::new(ReservationKind::Slot {
                appointment_id: appointment.id.clone(),
                practitioner_id: appointment.practitioner_id.clone(),
                patient_id: appointment.patient_id.clone(),
            });
            self.held.insert(token.id.clone(), token.clone());

            info!(
                appointment_id = %appointment.id,
                practitioner_id = %appointment.practitioner_id,
                slot = %slot,
                "Slot reserved"
            );
            Ok((token, appointment))
        })
    }

    /// Drop the token of an appointment cancelled through its lifecycle.
    pub fn forget_slot(&self, appointment_id: &str) {
        self.held.retain(|_, token| {
            !matches!(&token.kind, ReservationKind::Slot { appointment_id: a, .. } if a == appointment_id)
        });
    }

    /// Free slots of a practitioner on a date under the booking policy.
    pub fn open_slots(&self, practitioner_id: &str, date: NaiveDate) -> Result<Vec<TimeSlot>> {
        let booked: Vec<TimeSlot> = self
            .store
            .appointments
            .find_active_on(practitioner_id, date)?
            .iter()
            .map(Appointment::slot)
            .collect();

        Ok(self
            .policy
            .read()
            .slots_for(date)
            .into_iter()
            .filter(|slot| !booked.iter().any(|b| b.overlaps(slot)))
            .collect())
    }

    // ------------------------------------------------------------------------
    // Release
    // ------------------------------------------------------------------------

    pub fn token(&self, token_id: &str) -> Option<ReservationToken> {
        self.held.get(token_id).map(|t| t.value().clone())
    }

    /// Give back a reservation. Returns `false` when the token was already
    /// released (or never existed); releasing twice is the same as once.
    pub fn release(&self, ctx: &ExecutionContext, token_id: &str) -> Result<bool> {
        let Some((_, token)) = self.held.remove(token_id) else {
            return Ok(false);
        };

        match &token.kind {
            ReservationKind::Seat { schedule_id, holder_id } => self.with_schedule_lock(schedule_id, || {
                let Some(mut schedule) = self.store.schedules.find_by_id(schedule_id)? else {
                    return Ok(true);
                };

                schedule.enrolled = schedule.enrolled.saturating_sub(1);
                schedule.updated_at = Utc::now();

                let event = WorkflowEvent::updated(ctx, &schedule, &["enrolled"]);
                self.unit_of_work.commit(&schedule, event)?;

                info!(schedule_id = %schedule_id, holder_id = %holder_id, enrolled = schedule.enrolled, "Seat released");
                Ok(true)
            }),
            ReservationKind::Slot { appointment_id, practitioner_id, .. } => {
                self.with_practitioner_lock(practitioner_id, || {
                    let Some(appointment) = self.store.appointments.find_by_id(appointment_id)? else {
                        return Ok(true);
                    };
                    if !appointment.is_active() {
                        return Ok(true);
                    }

                    let cancelled = apply_transition::<AppointmentLifecycle>(
                        &appointment,
                        AppointmentStatus::Cancelled,
                        ctx.actor.role,
                        &TransitionPayload::reason("reservation released"),
                    )?;
                    let event = WorkflowEvent::transitioned(
                        ctx,
                        &cancelled,
                        "status",
                        appointment.status,
                        AppointmentStatus::Cancelled,
                    );
                    self.unit_of_work.commit(&cancelled, event)?;

                    info!(appointment_id = %appointment_id, "Slot released");
                    Ok(true)
                })
            }
        }
    }

    // ------------------------------------------------------------------------
    // Policy
    // ------------------------------------------------------------------------

    pub fn policy(&self) -> BookingPolicy {
        self.policy.read().clone()
    }

    pub fn set_policy(&self, policy: BookingPolicy) -> Result<()> {
        policy.validate()?;
        *self.policy.write() = policy;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::entity::{DayOfWeek, ScheduleType};
    use crate::store::{EventLog, Repository};
    use crate::usecase::InMemoryUnitOfWork;
    use chrono::NaiveTime;
    use dc_common::Actor;

    fn setup() -> (Arc<EntityStore>, CapacityScheduler) {
        let store = Arc::new(EntityStore::in_memory());
        let uow: Arc<dyn UnitOfWork> = Arc::new(InMemoryUnitOfWork::new(store.clone(), Arc::new(EventLog::new())));
        let scheduler = CapacityScheduler::new(store.clone(), uow, BookingPolicy::default());
        (store, scheduler)
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn schedule(store: &EntityStore, capacity: u32, enrolled: u32) -> Schedule {
        let mut s = Schedule::new(
            "Oral surgery lab",
            ScheduleType::Lab,
            "prof-1",
            "B-12",
            DayOfWeek::Tuesday,
            hm(14, 0),
            hm(16, 0),
            capacity,
            "admin-1",
        );
        s.enrolled = enrolled;
        store.schedules.save(&s).unwrap();
        s
    }

    fn slot_request(practitioner: &str, start: (u32, u32), end: (u32, u32)) -> SlotRequest {
        SlotRequest {
            patient_id: "pat-1".into(),
            practitioner_id: practitioner.into(),
            practitioner_role: Role::Student,
            specialty: "Orthodontics".into(),
            slot: TimeSlot {
                date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                start_time: hm(start.0, start.1),
                end_time: hm(end.0, end.1),
            },
            notes: None,
        }
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::create(Actor::student("stu-1"))
    }

    #[test]
    fn test_full_schedule_rejects_and_keeps_count() {
        let (store, scheduler) = setup();
        let s = schedule(&store, 8, 8);

        let err = scheduler.reserve_seat(&ctx(), &s.id, "stu-9").unwrap_err();
        assert!(matches!(err, PlatformError::CapacityExceeded { capacity: 8, .. }));
        assert_eq!(store.schedules.require(&s.id).unwrap().enrolled, 8);
    }

    #[test]
    fn test_release_twice_is_release_once() {
        let (store, scheduler) = setup();
        let s = schedule(&store, 2, 0);

        let token = scheduler.reserve_seat(&ctx(), &s.id, "stu-1").unwrap();
        assert_eq!(store.schedules.require(&s.id).unwrap().enrolled, 1);

        assert!(scheduler.release(&ctx(), &token.id).unwrap());
        assert!(!scheduler.release(&ctx(), &token.id).unwrap());
        assert_eq!(store.schedules.require(&s.id).unwrap().enrolled, 0);
    }

    #[test]
    fn test_duplicate_seat_rejected() {
        let (store, scheduler) = setup();
        let s = schedule(&store, 5, 0);

        scheduler.reserve_seat(&ctx(), &s.id, "stu-1").unwrap();
        let err = scheduler.reserve_seat(&ctx(), &s.id, "stu-1").unwrap_err();
        assert_eq!(err.code(), "ALREADY_ENROLLED");
        assert_eq!(scheduler.seat_holders(&s.id), vec!["stu-1".to_string()]);
    }

    #[test]
    fn test_inactive_schedule_rejects_seats() {
        let (store, scheduler) = setup();
        let mut s = schedule(&store, 5, 0);
        s.status = ScheduleStatus::Inactive;
        store.schedules.save(&s).unwrap();

        let err = scheduler.reserve_seat(&ctx(), &s.id, "stu-1").unwrap_err();
        assert_eq!(err.code(), "SCHEDULE_NOT_ACTIVE");
    }

    #[test]
    fn test_resize_below_enrolled_rejected() {
        let (store, scheduler) = setup();
        let s = schedule(&store, 10, 6);

        let err = scheduler.resize(&ctx(), &s.id, 5).unwrap_err();
        assert_eq!(err.code(), "CAPACITY_BELOW_ENROLLED");
        assert_eq!(scheduler.resize(&ctx(), &s.id, 6).unwrap().capacity, 6);
    }

    #[test]
    fn test_overlapping_slot_conflicts() {
        let (store, scheduler) = setup();
        let (_, first) = scheduler.reserve_slot(&ctx(), slot_request("stu-7", (9, 0), (10, 0))).unwrap();

        let err = scheduler
            .reserve_slot(&ctx(), slot_request("stu-7", (9, 30), (10, 30)))
            .unwrap_err();
        assert_eq!(
            err,
            PlatformError::SlotConflict {
                practitioner_id: "stu-7".into(),
                conflicting_id: first.id.clone(),
            }
        );
        assert_eq!(store.appointments.count().unwrap(), 1);

        // Adjacent slots and other practitioners are fine
        scheduler.reserve_slot(&ctx(), slot_request("stu-7", (10, 0), (11, 0))).unwrap();
        scheduler.reserve_slot(&ctx(), slot_request("stu-8", (9, 0), (10, 0))).unwrap();
    }

    #[test]
    fn test_released_slot_can_be_rebooked() {
        let (store, scheduler) = setup();
        let (token, appointment) = scheduler.reserve_slot(&ctx(), slot_request("stu-7", (9, 0), (10, 0))).unwrap();

        assert!(scheduler.release(&ctx(), &token.id).unwrap());
        let cancelled = store.appointments.require(&appointment.id).unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("reservation released"));

        scheduler.reserve_slot(&ctx(), slot_request("stu-7", (9, 0), (10, 0))).unwrap();
    }

    #[test]
    fn test_open_slots_skip_booked_time() {
        let (_, scheduler) = setup();
        scheduler.reserve_slot(&ctx(), slot_request("stu-7", (9, 0), (10, 0))).unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let open = scheduler.open_slots("stu-7", date).unwrap();
        assert_eq!(open.len(), 9);
        assert!(open.iter().all(|s| s.start_time != hm(9, 0)));
    }

    #[test]
    fn test_deleted_schedule_token_release_is_noop() {
        let (store, scheduler) = setup();
        let s = schedule(&store, 3, 0);
        let token = scheduler.reserve_seat(&ctx(), &s.id, "stu-1").unwrap();

        store.schedules.delete(&s.id).unwrap();
        scheduler.forget_schedule(&s.id);

        assert!(!scheduler.release(&ctx(), &token.id).unwrap());
    }
}
