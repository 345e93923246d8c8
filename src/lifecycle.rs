//! Appointment lifecycle — legal status transitions and the guarded
//! two-phase cancellation of prepaid appointments.
//!
//! `Programada` is the only live status; the other three are terminal.
//! Cancelling an appointment that holds a deposit is split into a
//! request phase (no mutation, surfaces the refund-or-credit decision)
//! and a commit phase (status write + settlement delivery in one
//! transaction). Dropping the pending value abandons the cancellation
//! with no side effect.

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::billing::{PrepaymentSettlement, SettlementSink};
use crate::db::repository::{get_appointment, set_appointment_status};
use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus, SettlementAction};

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Cancelling appointment {appointment_id} requires a refund-or-credit decision")]
    MissingSettlementDecision { appointment_id: Uuid },

    #[error("Settlement rejected, appointment left as scheduled: {0}")]
    SettlementRejected(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ─── Transition table ─────────────────────────────────────────────────────────

/// Legal next statuses for a given current status.
pub fn valid_transitions(status: AppointmentStatus) -> &'static [AppointmentStatus] {
    match status {
        AppointmentStatus::Programada => &[
            AppointmentStatus::Completada,
            AppointmentStatus::Cancelada,
            AppointmentStatus::NoAsistio,
        ],
        // Terminal states admit nothing.
        AppointmentStatus::Completada
        | AppointmentStatus::Cancelada
        | AppointmentStatus::NoAsistio => &[],
    }
}

pub fn validate_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), LifecycleError> {
    if !valid_transitions(from).contains(&to) {
        warn!(%from, %to, "invalid status transition attempted");
        return Err(LifecycleError::InvalidTransition { from, to });
    }
    debug!(%from, %to, "status transition validated");
    Ok(())
}

// ─── Unconditional transitions ────────────────────────────────────────────────

/// `Programada -> Completada`. Never touches the deposit; applying it
/// toward the invoice is the billing side's job.
pub fn complete_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, LifecycleError> {
    transition(conn, id, AppointmentStatus::Completada)
}

/// `Programada -> NoAsistio`.
pub fn mark_no_show(conn: &Connection, id: &Uuid) -> Result<Appointment, LifecycleError> {
    transition(conn, id, AppointmentStatus::NoAsistio)
}

fn transition(
    conn: &Connection,
    id: &Uuid,
    to: AppointmentStatus,
) -> Result<Appointment, LifecycleError> {
    let current = get_appointment(conn, id)?;
    validate_transition(current.status, to)?;
    set_appointment_status(conn, id, to)?;
    info!(appointment_id = %id, status = %to, "appointment status updated");
    Ok(get_appointment(conn, id)?)
}

// ─── Two-phase cancellation ───────────────────────────────────────────────────

/// Explicit intermediate state between cancellation request and commit.
/// The appointment stays `Programada` while this value is held; dropping
/// it abandons the cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCancellation {
    pub appointment_id: Uuid,
    pub amount: f64,
}

#[derive(Debug)]
pub enum CancellationOutcome {
    /// No deposit was held: cancelled in a single step.
    Cancelled(Appointment),
    /// A deposit is held: the caller must decide refund or credit, then
    /// call [`commit_cancellation`].
    DecisionRequired(PendingCancellation),
}

/// Phase 1: signal intent to cancel. Mutates nothing unless the
/// appointment holds no deposit, in which case the cancellation
/// completes immediately.
pub fn request_cancellation(
    conn: &Connection,
    id: &Uuid,
) -> Result<CancellationOutcome, LifecycleError> {
    let current = get_appointment(conn, id)?;
    validate_transition(current.status, AppointmentStatus::Cancelada)?;

    let amount = current.deposit();
    if amount <= 0.0 {
        set_appointment_status(conn, id, AppointmentStatus::Cancelada)?;
        info!(appointment_id = %id, "appointment cancelled, no deposit held");
        return Ok(CancellationOutcome::Cancelled(get_appointment(conn, id)?));
    }

    debug!(appointment_id = %id, amount, "cancellation awaiting settlement decision");
    Ok(CancellationOutcome::DecisionRequired(PendingCancellation {
        appointment_id: *id,
        amount,
    }))
}

/// Phase 2: commit the cancellation with the chosen disposition.
///
/// Status write and settlement delivery happen inside one transaction;
/// if the sink rejects, the transaction rolls back and the appointment
/// remains `Programada`. The transition is re-validated here because the
/// record may have moved between the two phases.
pub fn commit_cancellation(
    conn: &Connection,
    pending: &PendingCancellation,
    action: SettlementAction,
    sink: &dyn SettlementSink,
) -> Result<Appointment, LifecycleError> {
    let id = pending.appointment_id;
    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

    let current = get_appointment(&tx, &id)?;
    validate_transition(current.status, AppointmentStatus::Cancelada)?;

    set_appointment_status(&tx, &id, AppointmentStatus::Cancelada)?;

    let settlement = PrepaymentSettlement {
        appointment_id: id,
        amount: current.deposit(),
        action,
    };
    if let Err(e) = sink.settle(&settlement) {
        // Dropping the transaction rolls the status write back.
        warn!(appointment_id = %id, error = %e, "settlement rejected, rolling back");
        return Err(LifecycleError::SettlementRejected(e.to_string()));
    }

    tx.commit().map_err(DatabaseError::from)?;
    info!(
        appointment_id = %id,
        amount = settlement.amount,
        action = settlement.action.as_str(),
        "appointment cancelled with settlement"
    );
    Ok(get_appointment(conn, &id)?)
}

// ─── Status-update operation ──────────────────────────────────────────────────

/// Single entry point matching the records API surface: apply a status
/// change, supplying the settlement decision when cancelling a prepaid
/// appointment.
pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
    decision: Option<SettlementAction>,
    sink: &dyn SettlementSink,
) -> Result<Appointment, LifecycleError> {
    match status {
        AppointmentStatus::Completada => complete_appointment(conn, id),
        AppointmentStatus::NoAsistio => mark_no_show(conn, id),
        AppointmentStatus::Cancelada => match request_cancellation(conn, id)? {
            CancellationOutcome::Cancelled(appt) => Ok(appt),
            CancellationOutcome::DecisionRequired(pending) => match decision {
                Some(action) => commit_cancellation(conn, &pending, action, sink),
                None => Err(LifecycleError::MissingSettlementDecision {
                    appointment_id: *id,
                }),
            },
        },
        AppointmentStatus::Programada => {
            let current = get_appointment(conn, id)?;
            Err(LifecycleError::InvalidTransition {
                from: current.status,
                to: AppointmentStatus::Programada,
            })
        }
    }
}
