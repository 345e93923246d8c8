//! Day slot grid — computes the clinic's bookable half-hour positions
//! and marks which are taken by an active appointment.
//!
//! Pure over its inputs: safe to recompute on every query. Records with
//! unparsable timestamps, or timestamps from another calendar day, are
//! skipped with a warning instead of aborting the whole grid.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{CLOSE_HOUR, OPEN_HOUR, SLOTS_PER_DAY, SLOT_INTERVAL_MINUTES};
use crate::models::{AppointmentStatus, DayAppointment, SCHEDULED_AT_FORMAT};

// ─── Types ────────────────────────────────────────────────────────────────────

/// One bookable position in the day grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySlot {
    pub time: NaiveTime,
    /// "HH:MM" display label.
    pub label: String,
    pub occupied: bool,
    pub occupant: Option<OccupantSummary>,
}

/// Who holds an occupied slot, for hover/tooltip disclosure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupantSummary {
    pub patient_name: String,
    pub reason: String,
}

// ─── Grid computation ─────────────────────────────────────────────────────────

/// Candidate start times for any day: every half hour in `[07:00, 22:00)`.
pub fn slot_times() -> impl Iterator<Item = NaiveTime> {
    (0..SLOTS_PER_DAY as u32).map(|i| {
        let minutes = OPEN_HOUR * 60 + i * SLOT_INTERVAL_MINUTES;
        NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap()
    })
}

/// Whether a time lands on the bookable grid: inside the operating
/// window and on a half-hour boundary.
pub fn is_grid_aligned(time: NaiveTime) -> bool {
    time.hour() >= OPEN_HOUR
        && time.hour() < CLOSE_HOUR
        && time.minute() % SLOT_INTERVAL_MINUTES == 0
        && time.second() == 0
}

/// Builds the ordered slot grid for `date` from a same-day snapshot.
///
/// A slot is occupied iff an appointment with status `Programada` starts
/// at exactly that hour and minute. Completed, cancelled and no-show
/// appointments never occupy a slot, so their time can be re-booked.
/// The day filter is enforced here rather than trusted to the caller:
/// snapshot rows from other dates cannot mark slots on this one.
pub fn day_grid(date: NaiveDate, day: &[DayAppointment]) -> Vec<DaySlot> {
    let active = active_occupants(date, day);

    slot_times()
        .map(|time| {
            let occupant = active
                .iter()
                .find(|(at, _)| at.hour() == time.hour() && at.minute() == time.minute())
                .map(|(_, appt)| OccupantSummary {
                    patient_name: appt.patient_name.clone(),
                    reason: appt.reason.clone(),
                });
            DaySlot {
                time,
                label: time.format("%H:%M").to_string(),
                occupied: occupant.is_some(),
                occupant,
            }
        })
        .collect()
}

/// Parses and filters the snapshot down to active same-day occupants.
fn active_occupants<'a>(
    date: NaiveDate,
    day: &'a [DayAppointment],
) -> Vec<(NaiveTime, &'a DayAppointment)> {
    let mut active = Vec::new();
    for appt in day {
        let parsed = match NaiveDateTime::parse_from_str(&appt.scheduled_at, SCHEDULED_AT_FORMAT) {
            Ok(dt) => dt,
            Err(_) => {
                warn!(
                    scheduled_at = %appt.scheduled_at,
                    "skipping appointment with malformed timestamp"
                );
                continue;
            }
        };
        if parsed.date() != date {
            warn!(
                scheduled_at = %appt.scheduled_at,
                expected_date = %date,
                "skipping appointment outside the requested day"
            );
            continue;
        }
        if appt.status != AppointmentStatus::Programada {
            continue;
        }
        active.push((parsed.time(), appt));
    }
    active
}
