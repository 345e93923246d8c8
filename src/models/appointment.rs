use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AppointmentStatus, AppointmentType};

/// Datetime format used for `scheduled_at` in storage and on the wire.
pub const SCHEDULED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_type: AppointmentType,
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub reason: String,
    pub observations: Option<String>,
    /// Deposit taken at booking time. Read-only after creation; settled
    /// exactly once if the appointment is cancelled.
    pub prepaid_amount: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    /// Deposit amount, treating "none" and "zero" alike.
    pub fn deposit(&self) -> f64 {
        self.prepaid_amount.unwrap_or(0.0)
    }
}

/// Read snapshot of one same-day appointment, as assembled by
/// `db::repository::list_day_schedule`. `scheduled_at` stays raw text so
/// a single corrupt row cannot abort the whole grid computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAppointment {
    pub scheduled_at: String,
    pub status: AppointmentStatus,
    pub patient_name: String,
    pub reason: String,
}
