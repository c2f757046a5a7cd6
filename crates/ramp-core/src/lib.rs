#![deny(warnings)]

//! Core domain model for the furnace ramp simulator.
//!
//! This crate defines the serializable configuration and ledger types
//! shared across the workspace, with validation helpers that guarantee
//! the basic invariants before a run starts.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Months are four weeks long by convention; the simulator performs no
/// calendar-accurate week arithmetic.
pub const WEEKS_PER_MONTH: u32 = 4;

/// Immutable input for one simulation run.
///
/// All knobs are whole numbers except `start_month` (a calendar date,
/// day-of-month ignored) and the USD costs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// First simulated calendar month.
    pub start_month: NaiveDate,
    /// Number of months to simulate (>= 1).
    pub horizon_months: u32,
    /// Total number of furnaces to bring up (>= 1).
    pub total_furnace_limit: u32,
    /// Furnaces scheduled for bring-up each month (>= 0).
    pub furnaces_per_month: u32,
    /// Bring-up lead time per furnace, in weeks (>= 1).
    pub furnace_lead_time_weeks: u32,
    /// Cost to bring up one furnace, USD (>= 0).
    pub cost_per_furnace_usd: Decimal,
    /// Boards per module (>= 1).
    pub boards_per_module: u32,
    /// Maximum boards one furnace can hold (>= 1).
    pub max_boards_per_furnace: u32,
    /// Boards carried by one fixture (>= 1).
    pub boards_per_fixture: u32,
    /// Fixtures fabricated per week (>= 0).
    pub fixtures_per_week: u32,
    /// Cost of one fixture, USD (>= 0).
    pub cost_per_fixture_usd: Decimal,
}

impl SimulationConfig {
    /// Fixtures a furnace consumes at activation and holds for the rest
    /// of the run (floored).
    pub fn fixtures_per_furnace(&self) -> u32 {
        self.max_boards_per_furnace / self.boards_per_fixture
    }

    /// Bring-up lead time in whole months (floored).
    pub fn lead_time_months(&self) -> u32 {
        self.furnace_lead_time_weeks / WEEKS_PER_MONTH
    }

    /// Fixture fabrication rate per month.
    pub fn fixture_rate_per_month(&self) -> u64 {
        u64::from(self.fixtures_per_week) * u64::from(WEEKS_PER_MONTH)
    }

    /// Lifetime fabrication target: enough fixtures to outfit every
    /// furnace in the plan. Fixed at run start, never revised.
    pub fn fixture_target(&self) -> u64 {
        u64::from(self.fixtures_per_furnace()) * u64::from(self.total_furnace_limit)
    }

    /// Calendar date of simulated month `month` (0-based). Saturates at
    /// the calendar ceiling for absurd offsets.
    pub fn month_date(&self, month: u32) -> NaiveDate {
        self.start_month
            .checked_add_months(Months::new(month))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Human-readable label for simulated month `month`, e.g. "Sep 2025".
    pub fn month_label(&self, month: u32) -> String {
        self.month_date(month).format("%b %Y").to_string()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_month: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            horizon_months: 6,
            total_furnace_limit: 10,
            furnaces_per_month: 2,
            furnace_lead_time_weeks: 2,
            cost_per_furnace_usd: Decimal::new(50_000, 0),
            boards_per_module: 50,
            max_boards_per_furnace: 200,
            boards_per_fixture: 4,
            fixtures_per_week: 50,
            cost_per_fixture_usd: Decimal::new(3_000, 0),
        }
    }
}

/// Validation errors for run configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A count field is below its stated minimum.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Offending configuration field.
        field: &'static str,
        /// Minimum allowed value.
        min: u32,
        /// Value that was supplied.
        value: u32,
    },
    /// A monetary field is negative.
    #[error("{0} must be non-negative")]
    NegativeMoney(&'static str),
}

/// Validate a run configuration, failing fast on the first violated
/// constraint. This is the only expected failure surface: once a
/// configuration passes, the simulation is a closed arithmetic process.
pub fn validate_config(cfg: &SimulationConfig) -> Result<(), ValidationError> {
    let minimums = [
        ("horizon_months", 1, cfg.horizon_months),
        ("total_furnace_limit", 1, cfg.total_furnace_limit),
        ("furnace_lead_time_weeks", 1, cfg.furnace_lead_time_weeks),
        ("boards_per_module", 1, cfg.boards_per_module),
        ("max_boards_per_furnace", 1, cfg.max_boards_per_furnace),
        ("boards_per_fixture", 1, cfg.boards_per_fixture),
    ];
    for (field, min, value) in minimums {
        if value < min {
            return Err(ValidationError::BelowMinimum { field, min, value });
        }
    }
    if cfg.cost_per_furnace_usd < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney("cost_per_furnace_usd"));
    }
    if cfg.cost_per_fixture_usd < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney("cost_per_fixture_usd"));
    }
    Ok(())
}

/// Which resource constrains growth in a given month. Diagnostic only;
/// the classification never feeds back into scheduling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limiter {
    /// Bring-up pace is the constraint; fixtures are ample.
    Furnaces,
    /// Fixture inventory is short of the fleet's allocation demand.
    Fixtures,
    /// Neither resource constrains growth.
    None,
}

impl fmt::Display for Limiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Limiter::Furnaces => "Furnaces",
            Limiter::Fixtures => "Fixtures",
            Limiter::None => "None",
        };
        f.write_str(name)
    }
}

/// One row of the ramp ledger: the engine's sole output per month.
///
/// Cumulative fields are running sums through this month, so every
/// reported quantity is recomputable from the record stream alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    /// Simulated month index, 0-based.
    pub month: u32,
    /// Calendar label, e.g. "Sep 2025".
    pub month_label: String,
    /// Spend on furnaces activated this month, USD.
    pub furnace_spend_usd: Decimal,
    /// Spend on fixtures fabricated this month, USD.
    pub fixture_spend_usd: Decimal,
    /// Furnace plus fixture spend this month, USD.
    pub total_spend_usd: Decimal,
    /// Running furnace spend, USD.
    pub cumulative_furnace_spend_usd: Decimal,
    /// Running fixture spend, USD.
    pub cumulative_fixture_spend_usd: Decimal,
    /// Running total spend, USD.
    pub cumulative_spend_usd: Decimal,
    /// Boards produced this month.
    pub boards: u64,
    /// Running board count.
    pub cumulative_boards: u64,
    /// Furnaces online after this month's activations.
    pub online_furnaces: u32,
    /// Fixtures fabricated since run start (monotonic).
    pub cumulative_fixtures_fabricated: u64,
    /// Modules produced this month (leftover boards are discarded).
    pub modules: u64,
    /// Running module count.
    pub cumulative_modules: u64,
    /// Binding constraint classification for this month.
    pub limiter: Limiter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_config_derived_values() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.fixtures_per_furnace(), 50);
        assert_eq!(cfg.lead_time_months(), 0);
        assert_eq!(cfg.fixture_rate_per_month(), 200);
        assert_eq!(cfg.fixture_target(), 500);
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn lead_time_floors_to_whole_months() {
        let mut cfg = SimulationConfig::default();
        for (weeks, months) in [(1, 0), (3, 0), (4, 1), (7, 1), (8, 2)] {
            cfg.furnace_lead_time_weeks = weeks;
            assert_eq!(cfg.lead_time_months(), months, "weeks={weeks}");
        }
    }

    #[test]
    fn month_labels_follow_the_calendar() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.month_label(0), "Sep 2025");
        assert_eq!(cfg.month_label(3), "Dec 2025");
        assert_eq!(cfg.month_label(4), "Jan 2026");
    }

    #[test]
    fn validation_names_the_offending_field() {
        let cfg = SimulationConfig {
            horizon_months: 0,
            ..SimulationConfig::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert_eq!(
            err,
            ValidationError::BelowMinimum {
                field: "horizon_months",
                min: 1,
                value: 0
            }
        );
        assert_eq!(err.to_string(), "horizon_months must be at least 1, got 0");
    }

    #[test]
    fn validation_rejects_negative_costs() {
        let cfg = SimulationConfig {
            cost_per_fixture_usd: Decimal::new(-1, 0),
            ..SimulationConfig::default()
        };
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::NegativeMoney("cost_per_fixture_usd"))
        );
    }

    #[test]
    fn config_json_roundtrip() {
        let cfg = SimulationConfig::default();
        let s = serde_json::to_string(&cfg).unwrap();
        let back: SimulationConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn limiter_serializes_to_display_names() {
        for limiter in [Limiter::Furnaces, Limiter::Fixtures, Limiter::None] {
            let s = serde_json::to_string(&limiter).unwrap();
            assert_eq!(s, format!("\"{limiter}\""));
        }
    }

    proptest! {
        #[test]
        fn in_range_configs_validate(
            horizon in 1u32..=60,
            limit in 1u32..=64,
            per_month in 0u32..=8,
            lead in 1u32..=12,
            bpm in 1u32..=100,
            max_boards in 1u32..=400,
            bpfix in 1u32..=16,
            fpw in 0u32..=100,
        ) {
            let cfg = SimulationConfig {
                horizon_months: horizon,
                total_furnace_limit: limit,
                furnaces_per_month: per_month,
                furnace_lead_time_weeks: lead,
                boards_per_module: bpm,
                max_boards_per_furnace: max_boards,
                boards_per_fixture: bpfix,
                fixtures_per_week: fpw,
                ..SimulationConfig::default()
            };
            prop_assert!(validate_config(&cfg).is_ok());
            prop_assert_eq!(cfg.fixtures_per_furnace(), max_boards / bpfix);
            prop_assert_eq!(cfg.lead_time_months(), lead / WEEKS_PER_MONTH);
        }
    }
}
