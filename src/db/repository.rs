//! Repository layer — entity-scoped database operations.
//!
//! The scheduling core never holds the appointment book in memory: it
//! reads day snapshots and issues single-appointment writes through the
//! functions here.

use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::{
    Appointment, AppointmentStatus, AppointmentType, DayAppointment, Patient,
    SCHEDULED_AT_FORMAT,
};

/// Storage format for `created_at` / `updated_at`.
const AUDIT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, species, owner_name)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.species,
            patient.owner_name,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Patient, DatabaseError> {
    conn.query_row(
        "SELECT id, name, species, owner_name FROM patients WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(Patient {
                id: *id,
                name: row.get(1)?,
                species: row.get(2)?,
                owner_name: row.get(3)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        },
        other => DatabaseError::from(other),
    })
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, appointment_type, scheduled_at,
         status, reason, observations, prepaid_amount, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.appointment_type.as_str(),
            appt.scheduled_at.format(SCHEDULED_AT_FORMAT).to_string(),
            appt.status.as_str(),
            appt.reason,
            appt.observations,
            appt.prepaid_amount,
            appt.created_at.format(AUDIT_FORMAT).to_string(),
            appt.updated_at.format(AUDIT_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT id, patient_id, appointment_type, scheduled_at, status,
             reason, observations, prepaid_amount, created_at, updated_at
             FROM appointments WHERE id = ?1",
            params![id.to_string()],
            raw_appointment_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Appointment".into(),
                id: id.to_string(),
            },
            other => DatabaseError::from(other),
        })?;
    appointment_from_raw(raw)
}

/// All appointments scheduled on the given calendar day, any status,
/// ordered by time.
pub fn list_appointments_for_date(
    conn: &Connection,
    date: NaiveDate,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, appointment_type, scheduled_at, status,
         reason, observations, prepaid_amount, created_at, updated_at
         FROM appointments
         WHERE substr(scheduled_at, 1, 10) = ?1
         ORDER BY scheduled_at ASC",
    )?;

    let rows = stmt.query_map(params![date.to_string()], raw_appointment_row)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_raw(row?)?);
    }
    Ok(appointments)
}

/// Day snapshot for the slot grid: same-day appointments joined with the
/// patient name for occupant disclosure. `scheduled_at` is returned as
/// stored so one corrupt timestamp cannot blank the whole grid.
pub fn list_day_schedule(
    conn: &Connection,
    date: NaiveDate,
) -> Result<Vec<DayAppointment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT a.scheduled_at, a.status, COALESCE(p.name, 'Unknown'), a.reason
         FROM appointments a
         LEFT JOIN patients p ON a.patient_id = p.id
         WHERE substr(a.scheduled_at, 1, 10) = ?1
         ORDER BY a.scheduled_at ASC",
    )?;

    let rows = stmt.query_map(params![date.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut schedule = Vec::new();
    for row in rows {
        let (scheduled_at, status, patient_name, reason) = row?;
        schedule.push(DayAppointment {
            scheduled_at,
            status: AppointmentStatus::from_str(&status)?,
            patient_name,
            reason,
        });
    }
    Ok(schedule)
}

/// Single-row status write, bumping `updated_at`.
pub fn set_appointment_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
) -> Result<(), DatabaseError> {
    let now = Local::now().naive_local().format(AUDIT_FORMAT).to_string();
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

type RawAppointment = (
    String,         // id
    String,         // patient_id
    String,         // appointment_type
    String,         // scheduled_at
    String,         // status
    String,         // reason
    Option<String>, // observations
    Option<f64>,    // prepaid_amount
    String,         // created_at
    String,         // updated_at
);

fn raw_appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAppointment> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn appointment_from_raw(raw: RawAppointment) -> Result<Appointment, DatabaseError> {
    let (id, patient_id, appointment_type, scheduled_at, status, reason, observations, prepaid_amount, created_at, updated_at) =
        raw;

    Ok(Appointment {
        id: parse_uuid("id", &id)?,
        patient_id: parse_uuid("patient_id", &patient_id)?,
        appointment_type: AppointmentType::from_str(&appointment_type)?,
        scheduled_at: parse_datetime("scheduled_at", &scheduled_at, SCHEDULED_AT_FORMAT)?,
        status: AppointmentStatus::from_str(&status)?,
        reason,
        observations,
        prepaid_amount,
        created_at: parse_datetime("created_at", &created_at, AUDIT_FORMAT)?,
        updated_at: parse_datetime("updated_at", &updated_at, AUDIT_FORMAT)?,
    })
}

fn parse_uuid(column: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::ConstraintViolation(format!(
        "column {column} holds a non-UUID value: {value}"
    )))
}

fn parse_datetime(
    column: &str,
    value: &str,
    format: &str,
) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, format).map_err(|_| DatabaseError::InvalidTimestamp {
        column: column.into(),
        value: value.into(),
    })
}
