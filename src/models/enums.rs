use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentType {
    Consulta => "consulta",
    Peluqueria => "peluqueria",
    Laboratorio => "laboratorio",
    Vacuna => "vacuna",
    Cirugia => "cirugia",
    Tratamiento => "tratamiento",
});

str_enum!(AppointmentStatus {
    Programada => "programada",
    Completada => "completada",
    Cancelada => "cancelada",
    NoAsistio => "no_asistio",
});

str_enum!(SettlementAction {
    Refund => "refund",
    KeepAsCredit => "keep_as_credit",
});

impl AppointmentStatus {
    /// Every status except `Programada` admits no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Programada)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
