/// Application-level constants
pub const APP_NAME: &str = "Clinivet";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Clinic operating window: slots are generated for `[OPEN_HOUR, CLOSE_HOUR)`
/// on every calendar day. Fixed configuration, not derived from data.
pub const OPEN_HOUR: u32 = 7;
pub const CLOSE_HOUR: u32 = 22;

/// Appointment grid granularity, in minutes.
pub const SLOT_INTERVAL_MINUTES: u32 = 30;

/// Bookable slots per day for the configured window.
pub const SLOTS_PER_DAY: usize =
    ((CLOSE_HOUR - OPEN_HOUR) * 60 / SLOT_INTERVAL_MINUTES) as usize;

/// Default log filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_yields_thirty_slots() {
        assert_eq!(SLOTS_PER_DAY, 30);
    }

    #[test]
    fn interval_divides_the_window() {
        assert_eq!((CLOSE_HOUR - OPEN_HOUR) * 60 % SLOT_INTERVAL_MINUTES, 0);
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_scopes_to_crate() {
        assert_eq!(default_log_filter(), "clinivet=info");
    }
}
