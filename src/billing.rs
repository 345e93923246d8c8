//! Prepayment settlement contract shared with the billing side.
//!
//! The scheduling core only ever emits `PrepaymentSettlement` events;
//! how the billing collaborator turns them into refunds or owner credit
//! is its own concern. `SqliteLedger` is the local implementation used
//! by tests and single-machine deployments.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::SettlementAction;

/// Refund-or-credit disposition of a deposit, emitted exactly once when
/// a prepaid cancellation commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentSettlement {
    pub appointment_id: Uuid,
    pub amount: f64,
    pub action: SettlementAction,
}

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Appointment {0} already has a settlement")]
    AlreadySettled(Uuid),

    #[error("Billing rejected the settlement: {0}")]
    Rejected(String),
}

/// Boundary to the billing collaborator. A rejection here must leave the
/// appointment untouched; the caller decides whether to retry or pick
/// another disposition.
pub trait SettlementSink {
    fn settle(&self, settlement: &PrepaymentSettlement) -> Result<(), SettlementError>;
}

/// Ledger-backed sink writing one `prepayment_settlements` row per
/// appointment.
pub struct SqliteLedger<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Looks up a recorded settlement, if any.
    pub fn get(
        &self,
        appointment_id: &Uuid,
    ) -> Result<Option<PrepaymentSettlement>, SettlementError> {
        use std::str::FromStr;

        let row = self
            .conn
            .query_row(
                "SELECT amount, action FROM prepayment_settlements
                 WHERE appointment_id = ?1",
                params![appointment_id.to_string()],
                |row| Ok((row.get::<_, f64>(0)?, row.get::<_, String>(1)?)),
            );

        match row {
            Ok((amount, action)) => Ok(Some(PrepaymentSettlement {
                appointment_id: *appointment_id,
                amount,
                action: SettlementAction::from_str(&action)
                    .map_err(|e| SettlementError::Rejected(e.to_string()))?,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SettlementError::Rejected(e.to_string())),
        }
    }
}

impl SettlementSink for SqliteLedger<'_> {
    fn settle(&self, settlement: &PrepaymentSettlement) -> Result<(), SettlementError> {
        if self.get(&settlement.appointment_id)?.is_some() {
            return Err(SettlementError::AlreadySettled(settlement.appointment_id));
        }

        self.conn
            .execute(
                "INSERT INTO prepayment_settlements (appointment_id, amount, action)
                 VALUES (?1, ?2, ?3)",
                params![
                    settlement.appointment_id.to_string(),
                    settlement.amount,
                    settlement.action.as_str(),
                ],
            )
            .map_err(|e| SettlementError::Rejected(e.to_string()))?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::db::repository::{insert_appointment, insert_patient};
    use crate::models::{
        Appointment, AppointmentStatus, AppointmentType, Patient, SCHEDULED_AT_FORMAT,
    };
    use chrono::NaiveDateTime;

    fn seed_appointment(conn: &Connection) -> Uuid {
        let patient = Patient {
            id: Uuid::new_v4(),
            name: "Luna".into(),
            species: "gato".into(),
            owner_name: "Ana Torres".into(),
        };
        insert_patient(conn, &patient).unwrap();

        let scheduled_at =
            NaiveDateTime::parse_from_str("2025-03-10 14:30", SCHEDULED_AT_FORMAT).unwrap();
        let appt = Appointment {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            appointment_type: AppointmentType::Cirugia,
            scheduled_at,
            status: AppointmentStatus::Programada,
            reason: "Esterilización".into(),
            observations: None,
            prepaid_amount: Some(50.0),
            created_at: scheduled_at,
            updated_at: scheduled_at,
        };
        insert_appointment(conn, &appt).unwrap();
        appt.id
    }

    #[test]
    fn ledger_records_settlement() {
        let conn = open_memory_database().unwrap();
        let appointment_id = seed_appointment(&conn);
        let ledger = SqliteLedger::new(&conn);

        let settlement = PrepaymentSettlement {
            appointment_id,
            amount: 50.0,
            action: SettlementAction::Refund,
        };
        ledger.settle(&settlement).unwrap();

        let found = ledger.get(&appointment_id).unwrap().unwrap();
        assert_eq!(found, settlement);
    }

    #[test]
    fn ledger_settles_once() {
        let conn = open_memory_database().unwrap();
        let appointment_id = seed_appointment(&conn);
        let ledger = SqliteLedger::new(&conn);

        let settlement = PrepaymentSettlement {
            appointment_id,
            amount: 50.0,
            action: SettlementAction::KeepAsCredit,
        };
        ledger.settle(&settlement).unwrap();

        let err = ledger.settle(&settlement).unwrap_err();
        assert!(matches!(err, SettlementError::AlreadySettled(id) if id == appointment_id));
    }

    #[test]
    fn ledger_empty_for_unsettled() {
        let conn = open_memory_database().unwrap();
        let appointment_id = seed_appointment(&conn);
        let ledger = SqliteLedger::new(&conn);
        assert!(ledger.get(&appointment_id).unwrap().is_none());
    }
}
