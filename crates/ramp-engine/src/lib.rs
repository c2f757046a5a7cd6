#![deny(warnings)]

//! Simulation engine for the furnace ramp plan.
//!
//! The engine advances two pipelines in lockstep, one simulated month
//! at a time: furnace bring-up (scheduled cohorts maturing through a
//! fixed lead time, then activating against fixture inventory) and
//! fixture fabrication (a capped, fixed-rate stock build). Online
//! capacity is converted into board and module output, spend is
//! tallied, and the month's binding constraint is classified.
//!
//! A run is a pure function of its configuration: no randomness, no
//! shared state, one owner for every counter.

use ramp_core::{
    validate_config, Limiter, MonthlyRecord, SimulationConfig, ValidationError,
};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use tracing::debug;

/// A batch of furnaces scheduled to attempt activation in the same
/// month. Removed from the pending queue once its ready month has been
/// processed, regardless of how many units actually activate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BringupCohort {
    /// Month index at which the batch attempts activation.
    pub ready_month: u32,
    /// Units in the batch.
    pub count: u32,
}

/// A furnace that came online. It holds its fixture allocation and
/// runs at full capacity for the rest of the simulation; there is no
/// decommissioning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OnlineFurnace {
    /// Month index of activation.
    pub activated_month: u32,
    /// Fixtures permanently allocated to this furnace.
    pub fixtures: u32,
}

/// Fixture fabrication: a fixed monthly rate filling a stock that is
/// capped at the lifetime target computed from the configuration.
///
/// `available` drops only when a furnace activates; `total_fabricated`
/// never decreases and never passes the target.
#[derive(Clone, Debug)]
pub struct FixturePipeline {
    rate_per_month: u64,
    target: u64,
    available: u64,
    total_fabricated: u64,
}

impl FixturePipeline {
    /// Pipeline with an empty inventory.
    pub fn new(rate_per_month: u64, target: u64) -> Self {
        Self {
            rate_per_month,
            target,
            available: 0,
            total_fabricated: 0,
        }
    }

    /// Fabricate one month's worth of fixtures, never past the target.
    /// Returns the count fabricated this month.
    pub fn fabricate(&mut self) -> u64 {
        let remaining = self.target.saturating_sub(self.total_fabricated);
        let fabricated = self.rate_per_month.min(remaining);
        self.available += fabricated;
        self.total_fabricated += fabricated;
        fabricated
    }

    /// Atomically allocate `count` fixtures from inventory. Allocated
    /// fixtures are never returned.
    pub fn allocate(&mut self, count: u64) -> bool {
        if self.available < count {
            return false;
        }
        self.available -= count;
        true
    }

    /// Fixtures fabricated but not yet allocated to a furnace.
    pub fn available(&self) -> u64 {
        self.available
    }

    /// Fixtures fabricated since run start.
    pub fn total_fabricated(&self) -> u64 {
        self.total_fabricated
    }

    /// Whether the lifetime fabrication target has been reached.
    pub fn target_reached(&self) -> bool {
        self.total_fabricated >= self.target
    }
}

/// Furnace bring-up: an ordered queue of pending cohorts plus the
/// fleet of furnaces already online.
#[derive(Clone, Debug)]
pub struct BringupPipeline {
    limit: u32,
    per_month: u32,
    lead_months: u32,
    fixtures_per_furnace: u32,
    pending: VecDeque<BringupCohort>,
    online: Vec<OnlineFurnace>,
    brought_up: u32,
}

impl BringupPipeline {
    /// Empty pipeline for the given configuration.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            limit: config.total_furnace_limit,
            per_month: config.furnaces_per_month,
            lead_months: config.lead_time_months(),
            fixtures_per_furnace: config.fixtures_per_furnace(),
            pending: VecDeque::new(),
            online: Vec::new(),
            brought_up: 0,
        }
    }

    /// Enqueue this month's cohort, sized so the brought-up counter can
    /// never pass the limit. Cohorts maturing at or beyond the horizon
    /// would never be processed, so they are dropped here.
    ///
    /// Scheduling is gated on furnaces *brought up*, not scheduled:
    /// with a nonzero lead time more units may be scheduled than the
    /// limit, and the fixture cap absorbs the excess at activation.
    pub fn schedule(&mut self, month: u32, horizon: u32) {
        if self.brought_up >= self.limit {
            return;
        }
        let ready_month = month + self.lead_months;
        if ready_month >= horizon {
            return;
        }
        self.pending.push_back(BringupCohort {
            ready_month,
            count: self.per_month.min(self.limit - self.brought_up),
        });
    }

    /// Activate the cohorts due this month. Each ready unit attempts an
    /// atomic allocation of its fixture set; a unit that misses is lost
    /// from the plan permanently, it is not retried next month. The
    /// cohort itself is removed regardless of the outcome.
    ///
    /// Activation also stops once the furnace limit is reached: when a
    /// furnace needs zero fixtures, allocation always succeeds and the
    /// fixture cap no longer bounds the fleet, so over-scheduled
    /// cohorts from a multi-month lead would otherwise push
    /// `brought_up` past the limit.
    ///
    /// Returns the number of furnaces that came online.
    pub fn activate(&mut self, month: u32, fixtures: &mut FixturePipeline) -> u32 {
        let mut ready = 0u32;
        self.pending.retain(|cohort| {
            if cohort.ready_month == month {
                ready += cohort.count;
            }
            cohort.ready_month > month
        });

        let mut newly_online = 0u32;
        for _ in 0..ready {
            if self.brought_up >= self.limit {
                break;
            }
            if fixtures.allocate(u64::from(self.fixtures_per_furnace)) {
                self.online.push(OnlineFurnace {
                    activated_month: month,
                    fixtures: self.fixtures_per_furnace,
                });
                self.brought_up += 1;
                newly_online += 1;
            }
        }
        newly_online
    }

    /// Furnaces currently online.
    pub fn online_count(&self) -> u32 {
        self.online.len() as u32
    }

    /// Furnaces brought up since run start.
    pub fn brought_up(&self) -> u32 {
        self.brought_up
    }

    /// Whether the plan's furnace limit has been reached.
    pub fn limit_reached(&self) -> bool {
        self.brought_up >= self.limit
    }

    /// Cohorts still waiting on their ready month.
    pub fn pending(&self) -> impl Iterator<Item = &BringupCohort> {
        self.pending.iter()
    }
}

/// Running spend totals. Pure bookkeeping; no allocation decisions.
#[derive(Clone, Debug, Default)]
pub struct SpendLedger {
    furnace_total: Decimal,
    fixture_total: Decimal,
}

impl SpendLedger {
    fn record(&mut self, furnace_spend: Decimal, fixture_spend: Decimal) {
        self.furnace_total += furnace_spend;
        self.fixture_total += fixture_spend;
    }

    /// Cumulative furnace spend.
    pub fn furnace_total(&self) -> Decimal {
        self.furnace_total
    }

    /// Cumulative fixture spend.
    pub fn fixture_total(&self) -> Decimal {
        self.fixture_total
    }

    /// Cumulative total spend.
    pub fn total(&self) -> Decimal {
        self.furnace_total + self.fixture_total
    }
}

/// Classify the month's binding constraint from post-update state.
///
/// The conditions overlap, so the chain is evaluated in strict
/// priority order: fabrication done but fleet short → Furnaces; both
/// targets met → None; ample inventory while the fleet grows →
/// Furnaces; inventory short of the fleet's allocation → Fixtures;
/// otherwise None.
pub fn classify_limiter(
    bringup: &BringupPipeline,
    fixtures: &FixturePipeline,
    fixtures_per_furnace: u32,
) -> Limiter {
    let fleet_demand = u64::from(bringup.online_count()) * u64::from(fixtures_per_furnace);
    if fixtures.target_reached() && !bringup.limit_reached() {
        Limiter::Furnaces
    } else if bringup.limit_reached() && fixtures.target_reached() {
        Limiter::None
    } else if fixtures.available() >= fleet_demand && bringup.online_count() < bringup.limit {
        Limiter::Furnaces
    } else if fixtures.available() < fleet_demand {
        Limiter::Fixtures
    } else {
        Limiter::None
    }
}

/// One simulation run: the time driver owning every piece of mutable
/// state. Months are processed strictly in order, one record each.
pub struct Simulation {
    config: SimulationConfig,
    fixtures: FixturePipeline,
    bringup: BringupPipeline,
    spend: SpendLedger,
    month: u32,
    cumulative_boards: u64,
    cumulative_modules: u64,
}

impl Simulation {
    /// Validate the configuration and set up a run.
    pub fn new(config: SimulationConfig) -> Result<Self, ValidationError> {
        validate_config(&config)?;
        let fixtures =
            FixturePipeline::new(config.fixture_rate_per_month(), config.fixture_target());
        let bringup = BringupPipeline::new(&config);
        Ok(Self {
            config,
            fixtures,
            bringup,
            spend: SpendLedger::default(),
            month: 0,
            cumulative_boards: 0,
            cumulative_modules: 0,
        })
    }

    /// Advance one month: schedule, activate, fabricate, convert
    /// capacity to output, tally spend, and emit the ledger row.
    fn step(&mut self) -> MonthlyRecord {
        let month = self.month;
        let fixtures_per_furnace = self.config.fixtures_per_furnace();

        self.bringup.schedule(month, self.config.horizon_months);
        let newly_online = self.bringup.activate(month, &mut self.fixtures);
        let fabricated = self.fixtures.fabricate();

        let furnace_spend = Decimal::from(newly_online) * self.config.cost_per_furnace_usd;
        let fixture_spend = Decimal::from(fabricated) * self.config.cost_per_fixture_usd;
        self.spend.record(furnace_spend, fixture_spend);

        // Every online furnace runs at full allocated capacity.
        let online = self.bringup.online_count();
        let boards = u64::from(online)
            * u64::from(fixtures_per_furnace)
            * u64::from(self.config.boards_per_fixture);
        let modules = boards / u64::from(self.config.boards_per_module);
        self.cumulative_boards += boards;
        self.cumulative_modules += modules;

        let limiter = classify_limiter(&self.bringup, &self.fixtures, fixtures_per_furnace);

        debug!(
            month,
            newly_online,
            fabricated,
            online,
            boards,
            %limiter,
            "month processed"
        );

        self.month += 1;
        MonthlyRecord {
            month,
            month_label: self.config.month_label(month),
            furnace_spend_usd: furnace_spend,
            fixture_spend_usd: fixture_spend,
            total_spend_usd: furnace_spend + fixture_spend,
            cumulative_furnace_spend_usd: self.spend.furnace_total(),
            cumulative_fixture_spend_usd: self.spend.fixture_total(),
            cumulative_spend_usd: self.spend.total(),
            boards,
            cumulative_boards: self.cumulative_boards,
            online_furnaces: online,
            cumulative_fixtures_fabricated: self.fixtures.total_fabricated(),
            modules,
            cumulative_modules: self.cumulative_modules,
            limiter,
        }
    }

    /// Run to the horizon, producing exactly `horizon_months` records
    /// in chronological order.
    pub fn run(mut self) -> Vec<MonthlyRecord> {
        let horizon = self.config.horizon_months;
        let mut records = Vec::with_capacity(horizon as usize);
        while self.month < horizon {
            records.push(self.step());
        }
        records
    }
}

/// Validate `config` and run it to the horizon.
///
/// Example:
/// let records = run(SimulationConfig::default()).unwrap();
/// assert_eq!(records.len(), 6);
pub fn run(config: SimulationConfig) -> Result<Vec<MonthlyRecord>, ValidationError> {
    Ok(Simulation::new(config)?.run())
}
