//! Booking — creates appointments after validating the request against
//! the slot grid, so no two live appointments share a slot.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::db::repository::{insert_appointment, list_day_schedule};
use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus, AppointmentType};
use crate::slots::{day_grid, is_grid_aligned, DaySlot};

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Requested time {requested} is outside the bookable grid")]
    OutsideGrid { requested: NaiveDateTime },

    #[error("A reason is required to book an appointment")]
    EmptyReason,

    #[error("Deposit cannot be negative: {amount}")]
    NegativePrepayment { amount: f64 },

    #[error("Slot {time} is already taken")]
    SlotTaken { time: NaiveTime },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// What the front desk submits to book an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub patient_id: Uuid,
    pub appointment_type: AppointmentType,
    pub scheduled_at: NaiveDateTime,
    pub reason: String,
    pub observations: Option<String>,
    /// Deposit collected up front, if any.
    pub prepaid_amount: Option<f64>,
}

/// Books an appointment: validates the request, consults the slot grid
/// for the target day, and inserts the record as `Programada`.
pub fn book_appointment(
    conn: &Connection,
    request: BookingRequest,
) -> Result<Appointment, BookingError> {
    if request.reason.trim().is_empty() {
        return Err(BookingError::EmptyReason);
    }
    if let Some(amount) = request.prepaid_amount {
        if amount < 0.0 {
            return Err(BookingError::NegativePrepayment { amount });
        }
    }
    if !is_grid_aligned(request.scheduled_at.time()) {
        return Err(BookingError::OutsideGrid {
            requested: request.scheduled_at,
        });
    }

    let time = request.scheduled_at.time();
    let grid = schedule_for_date(conn, request.scheduled_at.date())?;
    let taken = grid
        .iter()
        .any(|slot| slot.occupied && slot.time == time);
    if taken {
        return Err(BookingError::SlotTaken { time });
    }

    let now = Local::now().naive_local();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: request.patient_id,
        appointment_type: request.appointment_type,
        scheduled_at: request.scheduled_at,
        status: AppointmentStatus::Programada,
        reason: request.reason,
        observations: request.observations,
        prepaid_amount: request.prepaid_amount,
        created_at: now,
        updated_at: now,
    };
    insert_appointment(conn, &appointment)?;
    info!(
        appointment_id = %appointment.id,
        scheduled_at = %appointment.scheduled_at,
        "appointment booked"
    );
    Ok(appointment)
}

/// Slot grid for one day, assembled from the stored appointment book.
pub fn schedule_for_date(conn: &Connection, date: NaiveDate) -> Result<Vec<DaySlot>, BookingError> {
    let day = list_day_schedule(conn, date)?;
    Ok(day_grid(date, &day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_patient;
    use crate::db::sqlite::open_memory_database;
    use crate::lifecycle::request_cancellation;
    use crate::models::{Patient, SCHEDULED_AT_FORMAT};

    fn seed_patient(conn: &Connection) -> Uuid {
        let patient = Patient {
            id: Uuid::new_v4(),
            name: "Luna".into(),
            species: "perro".into(),
            owner_name: "Ana Torres".into(),
        };
        insert_patient(conn, &patient).unwrap();
        patient.id
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, SCHEDULED_AT_FORMAT).unwrap()
    }

    fn request(patient_id: Uuid, when: &str) -> BookingRequest {
        BookingRequest {
            patient_id,
            appointment_type: AppointmentType::Consulta,
            scheduled_at: at(when),
            reason: "Cojea de la pata trasera".into(),
            observations: None,
            prepaid_amount: None,
        }
    }

    #[test]
    fn booking_creates_scheduled_appointment() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);

        let appt = book_appointment(&conn, request(patient_id, "2025-03-10 14:30")).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Programada);
        assert_eq!(appt.scheduled_at, at("2025-03-10 14:30"));

        let grid = schedule_for_date(&conn, appt.scheduled_at.date()).unwrap();
        let slot = grid.iter().find(|s| s.label == "14:30").unwrap();
        assert!(slot.occupied);
        assert_eq!(slot.occupant.as_ref().unwrap().patient_name, "Luna");
    }

    #[test]
    fn double_booking_a_slot_is_rejected() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);

        book_appointment(&conn, request(patient_id, "2025-03-10 14:30")).unwrap();
        let err = book_appointment(&conn, request(patient_id, "2025-03-10 14:30")).unwrap_err();
        assert!(matches!(err, BookingError::SlotTaken { .. }));
    }

    #[test]
    fn cancelled_slot_can_be_rebooked() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);

        let first = book_appointment(&conn, request(patient_id, "2025-03-10 14:30")).unwrap();
        request_cancellation(&conn, &first.id).unwrap();

        let second = book_appointment(&conn, request(patient_id, "2025-03-10 14:30")).unwrap();
        assert_eq!(second.status, AppointmentStatus::Programada);
    }

    #[test]
    fn same_time_other_day_does_not_conflict() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);

        book_appointment(&conn, request(patient_id, "2025-03-10 14:30")).unwrap();
        let other_day = book_appointment(&conn, request(patient_id, "2025-03-11 14:30"));
        assert!(other_day.is_ok());
    }

    #[test]
    fn off_grid_times_are_rejected() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);

        for when in ["2025-03-10 14:15", "2025-03-10 06:30", "2025-03-10 22:00"] {
            let err = book_appointment(&conn, request(patient_id, when)).unwrap_err();
            assert!(matches!(err, BookingError::OutsideGrid { .. }), "{when}");
        }
    }

    #[test]
    fn blank_reason_is_rejected() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);

        let mut req = request(patient_id, "2025-03-10 09:00");
        req.reason = "   ".into();
        let err = book_appointment(&conn, req).unwrap_err();
        assert!(matches!(err, BookingError::EmptyReason));
    }

    #[test]
    fn negative_deposit_is_rejected() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);

        let mut req = request(patient_id, "2025-03-10 09:00");
        req.prepaid_amount = Some(-10.0);
        let err = book_appointment(&conn, req).unwrap_err();
        assert!(matches!(err, BookingError::NegativePrepayment { .. }));
    }
}
