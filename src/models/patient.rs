use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal patient read model. Patients are owned by the surrounding
/// records system; the scheduling core only needs the name for slot
/// occupant disclosure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    pub owner_name: String,
}
