// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::Period;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount {0:?}: {1}")]
    Parse(String, String),

    #[error("amount must not be negative: {0}")]
    Negative(String),

    #[error("amount overflow in {0}")]
    Overflow(&'static str),

    #[error("amount underflow in subtraction")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("invalid period {0:?}: expected year and month (e.g. 2006-01)")]
    Invalid(String),

    #[error("period must only specify year and month (e.g. 2006-01), got {0:?}")]
    ExtraComponents(String),

    #[error("invalid calendar month {year}-{month}")]
    OutOfRange { year: i32, month: u32 },
}

/// Errors in the reward plan. These are surfaced before any computation starts.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("failed to decode rewards plan: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("missing mechanics")]
    MissingMechanics,

    #[error("mechanics are not sorted by period")]
    UnsortedMechanics,

    #[error("duplicate mechanics for period {0}")]
    DuplicateMechanics(Period),

    #[error("mechanics not found for period {0}")]
    MechanicsNotFound(Period),

    #[error("missing criteria in mechanics since {0}")]
    MissingCriteria(Period),

    #[error("missing tiers in mechanics since {0}")]
    MissingTiers(Period),

    #[error("tiers are not sorted by max effective balance in mechanics since {0}")]
    UnsortedTiers(Period),

    #[error("duplicate tier: {tier} in mechanics since {since}")]
    DuplicateTier { since: Period, tier: u64 },

    #[error("max effective balance must be positive in mechanics since {0}")]
    NonPositiveTier(Period),

    #[error("both {kind}_redirects and {kind}_redirects_file specified for period {since}")]
    ConflictingRedirects { since: Period, kind: &'static str },

    #[error("duplicate {kind} redirect key: {key}")]
    DuplicateRedirect { kind: &'static str, key: String },

    #[error("invalid redirects file {path:?}: {reason}")]
    RedirectsFile { path: PathBuf, reason: String },

    #[error("missing rounds")]
    MissingRounds,

    #[error("rounds are not sorted by period")]
    UnsortedRounds,

    #[error("duplicate round: {0}")]
    DuplicateRound(Period),
}

/// Errors raised while computing rewards. Every error aborts the computation.
#[derive(Error, Debug)]
pub enum CalcError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("total effective balance must be positive in period {0}")]
    NonPositiveEffectiveBalance(Period),

    #[error("total effective balance of {effective_balance} ETH exceeds highest tier in period {period}")]
    ExceedsHighestTier { period: Period, effective_balance: u64 },

    #[error("period not found: {0}")]
    PeriodNotFound(Period),

    #[error("round {0} does not match the round of the plan")]
    RoundMismatch(Period),

    #[error("round days cannot be zero")]
    ZeroRoundDays,

    #[error("no validators participated in period {0}")]
    NoParticipants(Period),

    #[error("no rounds with available performance data")]
    NoCompleteRounds,

    #[error("invalid performance range: earliest {earliest} is after latest {latest}")]
    InvalidPerformanceRange { earliest: NaiveDate, latest: NaiveDate },

    #[error("validator performance data is not available for the first round {0}")]
    PerformanceUnavailable(Period),

    #[error("inconsistent active days for owner {owner} in period {period}: owner has {owner_days}, validators sum to {validator_days}")]
    InconsistentActiveDays { period: Period, owner: String, owner_days: u64, validator_days: u64 },

    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),

    #[error("failed to compute round rewards in period {period}: {source}")]
    Round {
        period: Period,
        #[source]
        source: Box<CalcError>,
    },

    #[error("failed to compute rewards for {entity} in period {period}: {source}")]
    Entity {
        period: Period,
        entity: String,
        #[source]
        source: Box<CalcError>,
    },
}
