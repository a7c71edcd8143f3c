//! Clinic Platform
//!
//! The action surface of the workflow engine. Wires the entity store, the
//! unit of work, the capacity scheduler, the authorization gate and the
//! notification emitter together, and exposes one method per caller action.

use chrono::NaiveDate;
use dc_config::AppConfig;
use std::sync::Arc;
use tracing::info;

use crate::academic_task::entity::AcademicTask;
use crate::academic_task::operations::{CloseTaskUseCase, GiveTaskFeedbackUseCase, UpdateTaskProgressUseCase};
use crate::academic_task::repository::TaskQueries;
use crate::appointment::entity::Appointment;
use crate::appointment::operations::{
    BookAppointmentCommand, BookAppointmentUseCase, TransitionAppointmentCommand, TransitionAppointmentUseCase,
};
use crate::approval::entity::ApprovalRequest;
use crate::approval::operations::{
    RespondToApprovalCommand, RespondToApprovalUseCase, SubmitApprovalRequestCommand, SubmitApprovalRequestUseCase,
};
use crate::approval::repository::ApprovalQueries;
use crate::assignment::entity::Assignment;
use crate::assignment::operations::{CreateAssignmentCommand, CreateAssignmentUseCase, PublishAssignmentUseCase};
use crate::booking::{BookingCoordinator, BookingFlow, BookingStep};
use crate::clinical_case::entity::ClinicalCase;
use crate::clinical_case::operations::{
    OpenCaseCommand, OpenCaseUseCase, RecordCaseProgressCommand, RecordCaseProgressUseCase, ReviewCaseCommand,
    ReviewCaseUseCase, TransitionCaseCommand, TransitionCaseUseCase,
};
use crate::directory::{Practitioner, PractitionerDirectory};
use crate::evaluation::entity::Evaluation;
use crate::evaluation::operations::{
    CreateEvaluationCommand, CreateEvaluationUseCase, SubmitScoresCommand, SubmitScoresUseCase,
};
use crate::lifecycle::{ApprovalStatus, ScheduleStatus};
use crate::notification::emitter::NotificationEmitter;
use crate::notification::entity::Notification;
use crate::notification::operations::{NotificationFilter, NotificationInboxUseCase};
use crate::schedule::entity::Schedule;
use crate::schedule::operations::{
    CreateScheduleCommand, CreateScheduleUseCase, DeleteScheduleUseCase, EnrollInScheduleUseCase,
    ReleaseReservationUseCase, SetScheduleStatusUseCase, UpdateScheduleCommand, UpdateScheduleUseCase,
};
use crate::scheduling::{Availability, BookingPolicy, CapacityScheduler, ReservationToken, TimeSlot};
use crate::shared::authorization_service::{Action, AuthorizationGate, DenyReason, Governed, Target};
use crate::shared::error::{PlatformError, Result};
use crate::store::{EntityStore, EventLog, StoredEntity};
use crate::usecase::{ExecutionContext, InMemoryUnitOfWork, UnitOfWork};

pub struct ClinicPlatform {
    store: Arc<EntityStore>,
    events: Arc<EventLog>,
    gate: Arc<AuthorizationGate>,
    directory: Arc<dyn PractitionerDirectory>,
    scheduler: Arc<CapacityScheduler>,
    emitter: Arc<NotificationEmitter>,

    // Appointments and booking
    book_appointment: Arc<BookAppointmentUseCase>,
    transition_appointment: TransitionAppointmentUseCase,
    booking: BookingCoordinator,

    // Schedules
    create_schedule: CreateScheduleUseCase,
    update_schedule: UpdateScheduleUseCase,
    delete_schedule: DeleteScheduleUseCase,
    set_schedule_status: SetScheduleStatusUseCase,
    enroll: EnrollInScheduleUseCase,
    release: ReleaseReservationUseCase,

    // Approvals
    submit_approval: SubmitApprovalRequestUseCase,
    respond_approval: RespondToApprovalUseCase,

    // Clinical cases
    open_case: OpenCaseUseCase,
    case_progress: RecordCaseProgressUseCase,
    review_case: ReviewCaseUseCase,
    transition_case: TransitionCaseUseCase,

    // Assignments and tasks
    create_assignment: CreateAssignmentUseCase,
    publish_assignment: PublishAssignmentUseCase,
    task_progress: UpdateTaskProgressUseCase,
    task_feedback: GiveTaskFeedbackUseCase,
    close_task: CloseTaskUseCase,

    // Evaluations
    create_evaluation: CreateEvaluationUseCase,
    submit_scores: SubmitScoresUseCase,

    inbox: NotificationInboxUseCase,
}

impl ClinicPlatform {
    pub fn new(config: &AppConfig, directory: Arc<dyn PractitionerDirectory>) -> Result<Self> {
        let policy = BookingPolicy::from_config(&config.booking)?;
        Ok(Self::assemble(
            Arc::new(EntityStore::in_memory()),
            directory,
            policy,
            config.notifications.enabled,
        ))
    }

    /// Platform over an empty in-memory store with the default policy.
    pub fn in_memory(directory: Arc<dyn PractitionerDirectory>) -> Self {
        Self::assemble(
            Arc::new(EntityStore::in_memory()),
            directory,
            BookingPolicy::default(),
            true,
        )
    }

    fn assemble(
        store: Arc<EntityStore>,
        directory: Arc<dyn PractitionerDirectory>,
        policy: BookingPolicy,
        notifications_enabled: bool,
    ) -> Self {
        let events = Arc::new(EventLog::new());
        let gate = Arc::new(AuthorizationGate::new());
        let emitter = Arc::new(NotificationEmitter::new(store.clone(), notifications_enabled));
        let uow: Arc<dyn UnitOfWork> =
            Arc::new(InMemoryUnitOfWork::new(store.clone(), events.clone()).with_emitter(emitter.clone()));
        let scheduler = Arc::new(CapacityScheduler::new(store.clone(), uow.clone(), policy));

        let book_appointment = Arc::new(BookAppointmentUseCase::new(
            gate.clone(),
            directory.clone(),
            scheduler.clone(),
        ));
        let booking = BookingCoordinator::new(
            gate.clone(),
            directory.clone(),
            scheduler.clone(),
            book_appointment.clone(),
        );

        info!(notifications = notifications_enabled, "Clinic platform assembled");

        Self {
            transition_appointment: TransitionAppointmentUseCase::new(
                store.clone(),
                gate.clone(),
                scheduler.clone(),
                uow.clone(),
            ),
            create_schedule: CreateScheduleUseCase::new(store.clone(), gate.clone(), uow.clone()),
            update_schedule: UpdateScheduleUseCase::new(store.clone(), gate.clone(), scheduler.clone(), uow.clone()),
            delete_schedule: DeleteScheduleUseCase::new(store.clone(), gate.clone(), scheduler.clone(), uow.clone()),
            set_schedule_status: SetScheduleStatusUseCase::new(
                store.clone(),
                gate.clone(),
                scheduler.clone(),
                uow.clone(),
            ),
            enroll: EnrollInScheduleUseCase::new(gate.clone(), scheduler.clone()),
            release: ReleaseReservationUseCase::new(scheduler.clone()),
            submit_approval: SubmitApprovalRequestUseCase::new(store.clone(), gate.clone(), uow.clone()),
            respond_approval: RespondToApprovalUseCase::new(store.clone(), gate.clone(), uow.clone()),
            open_case: OpenCaseUseCase::new(gate.clone(), uow.clone()),
            case_progress: RecordCaseProgressUseCase::new(store.clone(), gate.clone(), uow.clone()),
            review_case: ReviewCaseUseCase::new(store.clone(), gate.clone(), uow.clone()),
            transition_case: TransitionCaseUseCase::new(store.clone(), gate.clone(), uow.clone()),
            create_assignment: CreateAssignmentUseCase::new(gate.clone(), uow.clone()),
            publish_assignment: PublishAssignmentUseCase::new(store.clone(), gate.clone(), uow.clone()),
            task_progress: UpdateTaskProgressUseCase::new(store.clone(), gate.clone(), uow.clone()),
            task_feedback: GiveTaskFeedbackUseCase::new(store.clone(), gate.clone(), uow.clone()),
            close_task: CloseTaskUseCase::new(store.clone(), gate.clone(), uow.clone()),
            create_evaluation: CreateEvaluationUseCase::new(gate.clone(), uow.clone()),
            submit_scores: SubmitScoresUseCase::new(store.clone(), gate.clone(), uow),
            inbox: NotificationInboxUseCase::new(store.clone(), gate.clone()),
            book_appointment,
            booking,
            store,
            events,
            gate,
            directory,
            scheduler,
            emitter,
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    pub fn directory(&self) -> &Arc<dyn PractitionerDirectory> {
        &self.directory
    }

    pub fn scheduler(&self) -> &Arc<CapacityScheduler> {
        &self.scheduler
    }

    pub fn notifications_enabled(&self) -> bool {
        self.emitter.is_enabled()
    }

    // ------------------------------------------------------------------------
    // Scoped reads
    // ------------------------------------------------------------------------

    fn read_one<T: StoredEntity + Governed>(&self, ctx: &ExecutionContext, action: Action, id: &str) -> Result<T> {
        let record = self.store.repository::<T>().require(id)?;
        self.gate.require_on(&ctx.actor, action, &record)?;
        Ok(record)
    }

    /// Every record the caller may see under `action`.
    fn read_visible<T: StoredEntity + Governed>(&self, ctx: &ExecutionContext, action: Action) -> Result<Vec<T>> {
        if !self.gate.role_may(ctx.actor.role, action) {
            return Err(PlatformError::forbidden(
                DenyReason::RoleNotPermitted,
                format!("{} may not perform {:?}", ctx.actor.role, action),
            ));
        }

        Ok(self
            .store
            .repository::<T>()
            .find_all()?
            .into_iter()
            .filter(|r| self.gate.authorize(&ctx.actor, action, &r.target()).is_allowed())
            .collect())
    }

    // ------------------------------------------------------------------------
    // Approval requests
    // ------------------------------------------------------------------------

    pub fn submit_approval_request(
        &self,
        ctx: &ExecutionContext,
        command: SubmitApprovalRequestCommand,
    ) -> Result<ApprovalRequest> {
        self.submit_approval.execute(command, ctx.clone())
    }

    pub fn respond_to_approval_request(
        &self,
        ctx: &ExecutionContext,
        request_id: &str,
        decision: ApprovalStatus,
        response: Option<String>,
    ) -> Result<ApprovalRequest> {
        let command = RespondToApprovalCommand {
            request_id: request_id.to_string(),
            decision,
            response,
        };
        self.respond_approval.execute(command, ctx.clone())
    }

    pub fn get_approval_request(&self, ctx: &ExecutionContext, id: &str) -> Result<ApprovalRequest> {
        self.read_one(ctx, Action::ReadApprovalRequest, id)
    }

    pub fn list_approval_requests(&self, ctx: &ExecutionContext) -> Result<Vec<ApprovalRequest>> {
        self.read_visible(ctx, Action::ReadApprovalRequest)
    }

    /// Pending requests assigned to `professor_id`. Professors only see
    /// their own queue.
    pub fn pending_queue(&self, ctx: &ExecutionContext, professor_id: &str) -> Result<Vec<ApprovalRequest>> {
        self.gate.require(
            &ctx.actor,
            Action::ReadPendingQueue,
            &Target::assigned_to(professor_id),
        )?;
        self.store.approvals.find_pending_for_professor(professor_id)
    }

    // ------------------------------------------------------------------------
    // Appointments
    // ------------------------------------------------------------------------

    pub fn book_appointment(&self, ctx: &ExecutionContext, command: BookAppointmentCommand) -> Result<Appointment> {
        self.book_appointment.execute(command, ctx.clone())
    }

    pub fn confirm_appointment(&self, ctx: &ExecutionContext, appointment_id: &str) -> Result<Appointment> {
        self.transition_appointment
            .execute(TransitionAppointmentCommand::confirm(appointment_id), ctx.clone())
    }

    pub fn complete_appointment(&self, ctx: &ExecutionContext, appointment_id: &str) -> Result<Appointment> {
        self.transition_appointment
            .execute(TransitionAppointmentCommand::complete(appointment_id), ctx.clone())
    }

    pub fn cancel_appointment(
        &self,
        ctx: &ExecutionContext,
        appointment_id: &str,
        reason: Option<String>,
    ) -> Result<Appointment> {
        self.transition_appointment
            .execute(TransitionAppointmentCommand::cancel(appointment_id, reason), ctx.clone())
    }

    pub fn get_appointment(&self, ctx: &ExecutionContext, id: &str) -> Result<Appointment> {
        self.read_one(ctx, Action::ReadAppointment, id)
    }

    pub fn list_appointments(&self, ctx: &ExecutionContext) -> Result<Vec<Appointment>> {
        self.read_visible(ctx, Action::ReadAppointment)
    }

    /// Free slots of a practitioner on a date.
    pub fn open_slots(&self, ctx: &ExecutionContext, practitioner_id: &str, date: NaiveDate) -> Result<Vec<TimeSlot>> {
        self.gate.require(&ctx.actor, Action::ReadAppointment, &Target::none())
            .or_else(|_| self.gate.require(&ctx.actor, Action::BookAppointment, &Target::none()))?;
        if self.directory.find(practitioner_id).is_none() {
            return Err(PlatformError::not_found("Practitioner", practitioner_id));
        }
        self.scheduler.open_slots(practitioner_id, date)
    }

    pub fn specialties(&self) -> Vec<String> {
        self.directory.specialties()
    }

    pub fn practitioners_for(&self, specialty: &str) -> Vec<Practitioner> {
        self.directory.serving(specialty)
    }

    // ------------------------------------------------------------------------
    // Booking flow
    // ------------------------------------------------------------------------

    pub fn start_booking(&self, ctx: &ExecutionContext) -> Result<BookingFlow> {
        self.booking.start(ctx)
    }

    pub fn booking(&self, ctx: &ExecutionContext, flow_id: &str) -> Result<BookingFlow> {
        self.booking.get(flow_id, ctx)
    }

    pub fn select_specialty(&self, ctx: &ExecutionContext, flow_id: &str, specialty: &str) -> Result<BookingFlow> {
        self.booking.select_specialty(flow_id, specialty, ctx)
    }

    pub fn select_practitioner(
        &self,
        ctx: &ExecutionContext,
        flow_id: &str,
        practitioner_id: &str,
    ) -> Result<BookingFlow> {
        self.booking.select_practitioner(flow_id, practitioner_id, ctx)
    }

    pub fn select_slot(
        &self,
        ctx: &ExecutionContext,
        flow_id: &str,
        slot: TimeSlot,
        notes: Option<String>,
    ) -> Result<BookingFlow> {
        self.booking.select_slot(flow_id, slot, notes, ctx)
    }

    pub fn booking_back_to(&self, ctx: &ExecutionContext, flow_id: &str, step: BookingStep) -> Result<BookingFlow> {
        self.booking.back_to(flow_id, step, ctx)
    }

    pub fn booking_advance(&self, ctx: &ExecutionContext, flow_id: &str) -> Result<BookingFlow> {
        self.booking.advance(flow_id, ctx)
    }

    pub fn booking_practitioners(&self, ctx: &ExecutionContext, flow_id: &str) -> Result<Vec<Practitioner>> {
        self.booking.practitioners(flow_id, ctx)
    }

    pub fn booking_slots(&self, ctx: &ExecutionContext, flow_id: &str, date: NaiveDate) -> Result<Vec<TimeSlot>> {
        self.booking.open_slots(flow_id, date, ctx)
    }

    pub fn confirm_booking(&self, ctx: &ExecutionContext, flow_id: &str) -> Result<(BookingFlow, Appointment)> {
        self.booking.confirm(flow_id, ctx)
    }

    pub fn abandon_booking(&self, ctx: &ExecutionContext, flow_id: &str) -> Result<()> {
        self.booking.abandon(flow_id, ctx)
    }

    // ------------------------------------------------------------------------
    // Schedules
    // ------------------------------------------------------------------------

    pub fn create_schedule(&self, ctx: &ExecutionContext, command: CreateScheduleCommand) -> Result<Schedule> {
        self.create_schedule.execute(command, ctx.clone())
    }

    pub fn update_schedule(
        &self,
        ctx: &ExecutionContext,
        schedule_id: &str,
        command: UpdateScheduleCommand,
    ) -> Result<Schedule> {
        self.update_schedule.execute(schedule_id, command, ctx.clone())
    }

    pub fn delete_schedule(&self, ctx: &ExecutionContext, schedule_id: &str) -> Result<()> {
        self.delete_schedule.execute(schedule_id, ctx.clone())
    }

    pub fn set_schedule_status(
        &self,
        ctx: &ExecutionContext,
        schedule_id: &str,
        status: ScheduleStatus,
    ) -> Result<Schedule> {
        self.set_schedule_status.execute(schedule_id, status, ctx.clone())
    }

    pub fn enroll_in_schedule(
        &self,
        ctx: &ExecutionContext,
        schedule_id: &str,
        student_id: Option<&str>,
    ) -> Result<ReservationToken> {
        self.enroll.execute(schedule_id, student_id, ctx.clone())
    }

    pub fn release_reservation(&self, ctx: &ExecutionContext, token_id: &str) -> Result<bool> {
        self.release.execute(token_id, ctx.clone())
    }

    pub fn schedule_availability(&self, ctx: &ExecutionContext, schedule_id: &str) -> Result<Availability> {
        self.enroll.availability(schedule_id, ctx)
    }

    pub fn get_schedule(&self, ctx: &ExecutionContext, id: &str) -> Result<Schedule> {
        self.read_one(ctx, Action::ReadSchedule, id)
    }

    pub fn list_schedules(&self, ctx: &ExecutionContext) -> Result<Vec<Schedule>> {
        self.read_visible(ctx, Action::ReadSchedule)
    }

    // ------------------------------------------------------------------------
    // Clinical cases
    // ------------------------------------------------------------------------

    pub fn open_case(&self, ctx: &ExecutionContext, command: OpenCaseCommand) -> Result<ClinicalCase> {
        self.open_case.execute(command, ctx.clone())
    }

    pub fn record_case_progress(
        &self,
        ctx: &ExecutionContext,
        command: RecordCaseProgressCommand,
    ) -> Result<ClinicalCase> {
        self.case_progress.execute(command, ctx.clone())
    }

    pub fn review_case(&self, ctx: &ExecutionContext, command: ReviewCaseCommand) -> Result<ClinicalCase> {
        self.review_case.execute(command, ctx.clone())
    }

    pub fn resubmit_case(&self, ctx: &ExecutionContext, case_id: &str) -> Result<ClinicalCase> {
        self.review_case.resubmit(case_id, ctx.clone())
    }

    pub fn transition_case(&self, ctx: &ExecutionContext, command: TransitionCaseCommand) -> Result<ClinicalCase> {
        self.transition_case.execute(command, ctx.clone())
    }

    pub fn get_case(&self, ctx: &ExecutionContext, id: &str) -> Result<ClinicalCase> {
        self.read_one(ctx, Action::ReadClinicalCase, id)
    }

    pub fn list_cases(&self, ctx: &ExecutionContext) -> Result<Vec<ClinicalCase>> {
        self.read_visible(ctx, Action::ReadClinicalCase)
    }

    // ------------------------------------------------------------------------
    // Assignments and academic tasks
    // ------------------------------------------------------------------------

    pub fn create_assignment(&self, ctx: &ExecutionContext, command: CreateAssignmentCommand) -> Result<Assignment> {
        self.create_assignment.execute(command, ctx.clone())
    }

    pub fn publish_assignment(&self, ctx: &ExecutionContext, assignment_id: &str) -> Result<Assignment> {
        self.publish_assignment.execute(assignment_id, ctx.clone())
    }

    pub fn close_assignment(&self, ctx: &ExecutionContext, assignment_id: &str) -> Result<Assignment> {
        self.publish_assignment.close(assignment_id, ctx.clone())
    }

    pub fn get_assignment(&self, ctx: &ExecutionContext, id: &str) -> Result<Assignment> {
        self.read_one(ctx, Action::ReadAssignment, id)
    }

    pub fn list_assignments(&self, ctx: &ExecutionContext) -> Result<Vec<Assignment>> {
        self.read_visible(ctx, Action::ReadAssignment)
    }

    /// Tasks fanned out from an assignment that the caller may see.
    pub fn assignment_tasks(&self, ctx: &ExecutionContext, assignment_id: &str) -> Result<Vec<AcademicTask>> {
        self.get_assignment(ctx, assignment_id)?;
        Ok(self
            .store
            .tasks
            .find_by_assignment(assignment_id)?
            .into_iter()
            .filter(|t| {
                self.gate
                    .authorize(&ctx.actor, Action::ReadAcademicTask, &t.target())
                    .is_allowed()
            })
            .collect())
    }

    pub fn update_task_progress(&self, ctx: &ExecutionContext, task_id: &str, progress: u8) -> Result<AcademicTask> {
        self.task_progress.execute(task_id, progress, ctx.clone())
    }

    pub fn give_task_feedback(&self, ctx: &ExecutionContext, task_id: &str, feedback: &str) -> Result<AcademicTask> {
        self.task_feedback.execute(task_id, feedback, ctx.clone())
    }

    pub fn close_task(&self, ctx: &ExecutionContext, task_id: &str) -> Result<AcademicTask> {
        self.close_task.execute(task_id, ctx.clone())
    }

    pub fn get_task(&self, ctx: &ExecutionContext, id: &str) -> Result<AcademicTask> {
        self.read_one(ctx, Action::ReadAcademicTask, id)
    }

    pub fn list_tasks(&self, ctx: &ExecutionContext) -> Result<Vec<AcademicTask>> {
        self.read_visible(ctx, Action::ReadAcademicTask)
    }

    // ------------------------------------------------------------------------
    // Evaluations
    // ------------------------------------------------------------------------

    pub fn create_evaluation(&self, ctx: &ExecutionContext, command: CreateEvaluationCommand) -> Result<Evaluation> {
        self.create_evaluation.execute(command, ctx.clone())
    }

    pub fn submit_evaluation_scores(&self, ctx: &ExecutionContext, command: SubmitScoresCommand) -> Result<Evaluation> {
        self.submit_scores.execute(command, ctx.clone())
    }

    pub fn get_evaluation(&self, ctx: &ExecutionContext, id: &str) -> Result<Evaluation> {
        self.read_one(ctx, Action::ReadEvaluation, id)
    }

    pub fn list_evaluations(&self, ctx: &ExecutionContext) -> Result<Vec<Evaluation>> {
        self.read_visible(ctx, Action::ReadEvaluation)
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    pub fn list_notifications(&self, ctx: &ExecutionContext, filter: &NotificationFilter) -> Result<Vec<Notification>> {
        self.inbox.list(filter, ctx)
    }

    pub fn unread_count(&self, ctx: &ExecutionContext) -> Result<usize> {
        self.inbox.unread_count(ctx)
    }

    pub fn mark_read(&self, ctx: &ExecutionContext, notification_id: &str) -> Result<Notification> {
        self.inbox.mark_read(notification_id, ctx)
    }

    pub fn mark_unread(&self, ctx: &ExecutionContext, notification_id: &str) -> Result<Notification> {
        self.inbox.mark_unread(notification_id, ctx)
    }

    pub fn mark_all_read(&self, ctx: &ExecutionContext) -> Result<usize> {
        self.inbox.mark_all_read(ctx)
    }

    pub fn delete_notification(&self, ctx: &ExecutionContext, notification_id: &str) -> Result<()> {
        self.inbox.delete(notification_id, ctx)
    }

    // ------------------------------------------------------------------------
    // System configuration
    // ------------------------------------------------------------------------

    pub fn booking_policy(&self) -> BookingPolicy {
        self.scheduler.policy()
    }

    pub fn update_booking_policy(&self, ctx: &ExecutionContext, policy: BookingPolicy) -> Result<BookingPolicy> {
        self.gate
            .require(&ctx.actor, Action::ManageSystemConfig, &Target::none())?;
        self.scheduler.set_policy(policy.clone())?;

        info!(
            day_start = %policy.day_start,
            day_end = %policy.day_end,
            slot_minutes = policy.slot_minutes,
            actor = %ctx.actor,
            "Booking policy updated"
        );
        Ok(policy)
    }
}
