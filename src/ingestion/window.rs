//! Execution window policy and window key generation.
//!
//! Daily methods run inside `[daily_start, daily_end]` local time.
//! Monthly methods (names containing `mesmadr` or `abas`) run on the
//! configured days of month from `monthly_start` onward, or anytime on
//! the grace day immediately after a configured day. The window key is
//! the local date `YYYY-MM-DD` in both cases, so retries inside one
//! legal region collide on the `(method, window_key)` uniqueness.

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;

use crate::config::{parse_local_time, parse_run_days, AppConfig, ConfigError};
use crate::error::IngestError;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct WindowPolicy {
    daily_start: NaiveTime,
    daily_end: NaiveTime,
    monthly_run_days: BTreeSet<u32>,
    monthly_start: NaiveTime,
    zone: Tz,
}

impl WindowPolicy {
    pub fn new(
        daily_start: NaiveTime,
        daily_end: NaiveTime,
        monthly_run_days: BTreeSet<u32>,
        monthly_start: NaiveTime,
        zone: Tz,
    ) -> Self {
        Self {
            daily_start,
            daily_end,
            monthly_run_days,
            monthly_start,
            zone,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            parse_local_time("DAILY_WINDOW_START", &config.ingestion.daily_window_start)?,
            parse_local_time("DAILY_WINDOW_END", &config.ingestion.daily_window_end)?,
            parse_run_days(&config.ingestion.monthly_run_days)?,
            parse_local_time("MONTHLY_WINDOW_START", &config.ingestion.monthly_window_start)?,
            config.zone()?,
        ))
    }

    /// Validates `now` against the method's window and returns the key.
    ///
    /// `force=true` skips validation but still computes the key.
    pub fn validate_and_get_key(
        &self,
        method_name: &str,
        force: bool,
    ) -> Result<String, IngestError> {
        let now = Utc::now().with_timezone(&self.zone);
        self.evaluate_at(method_name, force, now)
    }

    /// Clock-pinned evaluation; `validate_and_get_key` with `now` supplied.
    pub fn evaluate_at(
        &self,
        method_name: &str,
        force: bool,
        now: DateTime<Tz>,
    ) -> Result<String, IngestError> {
        if is_monthly_method(method_name) {
            self.validate_monthly(now, force)
        } else {
            self.validate_daily(now, force)
        }
    }

    fn validate_daily(&self, now: DateTime<Tz>, force: bool) -> Result<String, IngestError> {
        let key = now.format(DATE_FORMAT).to_string();
        if force {
            return Ok(key);
        }

        let time = now.time();
        if time < self.daily_start || time > self.daily_end {
            return Err(IngestError::WindowViolation(format!(
                "Daily run outside window. Current: {:02}:{:02}, Allowed: {}-{}",
                time.hour(),
                time.minute(),
                self.daily_start.format("%H:%M"),
                self.daily_end.format("%H:%M"),
            )));
        }
        Ok(key)
    }

    fn validate_monthly(&self, now: DateTime<Tz>, force: bool) -> Result<String, IngestError> {
        let key = now.format(DATE_FORMAT).to_string();
        if force {
            return Ok(key);
        }

        let day = now.day();
        let time = now.time();

        if self.monthly_run_days.contains(&day) && time >= self.monthly_start {
            return Ok(key);
        }

        // Grace day: the whole day after a configured run day is valid.
        if day >= 2 && self.monthly_run_days.contains(&(day - 1)) {
            return Ok(key);
        }

        Err(IngestError::WindowViolation(format!(
            "Monthly run outside window. Current Day: {day} Time: {:02}:{:02}",
            time.hour(),
            time.minute(),
        )))
    }
}

/// Methods containing `mesmadr` or `abas` (case-insensitive) are monthly.
fn is_monthly_method(method_name: &str) -> bool {
    let lowered = method_name.to_lowercase();
    lowered.contains("mesmadr") || lowered.contains("abas")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Bogota;

    fn policy() -> WindowPolicy {
        WindowPolicy::new(
            NaiveTime::from_hms_opt(14, 20, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
            [8, 10].into_iter().collect(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            Bogota,
        )
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        Bogota.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn daily_inside_window_yields_date_key() {
        let key = policy()
            .evaluate_at("promediosSipsaCiudad", false, at(2026, 1, 2, 14, 25))
            .unwrap();
        assert_eq!(key, "2026-01-02");
    }

    #[test]
    fn daily_outside_window_is_rejected() {
        let result = policy().evaluate_at("promediosSipsaCiudad", false, at(2026, 1, 2, 9, 0));
        assert!(matches!(result, Err(IngestError::WindowViolation(_))));
    }

    #[test]
    fn daily_boundaries_are_inclusive() {
        assert!(policy()
            .evaluate_at("promediosSipsaParcial", false, at(2026, 1, 2, 14, 20))
            .is_ok());
        assert!(policy()
            .evaluate_at("promediosSipsaParcial", false, at(2026, 1, 2, 23, 59))
            .is_ok());
        assert!(policy()
            .evaluate_at("promediosSipsaParcial", false, at(2026, 1, 2, 14, 19))
            .is_err());
    }

    #[test]
    fn force_bypasses_validation_but_returns_key() {
        let key = policy()
            .evaluate_at("promediosSipsaCiudad", true, at(2026, 1, 2, 3, 0))
            .unwrap();
        assert_eq!(key, "2026-01-02");
    }

    #[test]
    fn monthly_on_run_day_after_start_time() {
        let key = policy()
            .evaluate_at("promediosSipsaMesMadr", false, at(2026, 2, 8, 6, 30))
            .unwrap();
        assert_eq!(key, "2026-02-08");
    }

    #[test]
    fn monthly_on_run_day_before_start_time_is_rejected() {
        let result = policy().evaluate_at("promediosSipsaMesMadr", false, at(2026, 2, 8, 5, 59));
        assert!(matches!(result, Err(IngestError::WindowViolation(_))));
    }

    #[test]
    fn monthly_grace_day_is_valid_all_day() {
        assert_eq!(
            policy()
                .evaluate_at("promedioAbasSipsaMesMadr", false, at(2026, 2, 11, 1, 0))
                .unwrap(),
            "2026-02-11"
        );
    }

    #[test]
    fn monthly_off_day_is_rejected() {
        let result =
            policy().evaluate_at("promedioAbasSipsaMesMadr", false, at(2026, 2, 5, 6, 0));
        assert!(matches!(result, Err(IngestError::WindowViolation(_))));
    }

    #[test]
    fn grace_day_produces_distinct_window_key() {
        let on_day = policy()
            .evaluate_at("promediosSipsaMesMadr", false, at(2026, 2, 8, 7, 0))
            .unwrap();
        let grace = policy()
            .evaluate_at("promediosSipsaMesMadr", false, at(2026, 2, 9, 7, 0))
            .unwrap();
        assert_ne!(on_day, grace);
    }

    #[test]
    fn key_is_stable_within_a_day() {
        let morning = policy()
            .evaluate_at("promediosSipsaCiudad", true, at(2026, 1, 2, 0, 1))
            .unwrap();
        let evening = policy()
            .evaluate_at("promediosSipsaCiudad", true, at(2026, 1, 2, 23, 58))
            .unwrap();
        assert_eq!(morning, evening);
    }

    #[test]
    fn method_classification() {
        assert!(is_monthly_method("promediosSipsaMesMadr"));
        assert!(is_monthly_method("promedioAbasSipsaMesMadr"));
        assert!(!is_monthly_method("promediosSipsaCiudad"));
        assert!(!is_monthly_method("promediosSipsaSemanaMadr"));
    }
}
