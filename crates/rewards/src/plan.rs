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

//! The reward plan: versioned mechanics and the macro-economic inputs of each round.

use std::path::Path;

use alloy_primitives::U256;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CalcError, PlanError},
    mechanics::{tiers_sorted, Mechanics, Tier},
    units::{gwei_to_ether, VALIDATOR_BALANCE_ETHER},
    Amount, Period,
};

/// Macro-economic inputs of one payout period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub period: Period,
    /// Annual percentage return of the staked asset.
    #[serde(default)]
    pub eth_apr: Amount,
    /// Exchange rate of the reward token to the staked asset.
    #[serde(default)]
    pub ssv_eth: Amount,
    /// Fee budget deducted from rewards during this round, in reward tokens.
    #[serde(default)]
    pub network_fee: Amount,
}

impl Round {
    /// Whether the round has its rates set and performance data up to its last day.
    pub fn is_complete(&self, latest_performance: NaiveDate) -> bool {
        self.eth_apr.is_positive()
            && self.ssv_eth.is_positive()
            && self.period.last_day() <= latest_performance
    }
}

/// Days for which validator performance data is available, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerformanceRange {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

/// Per-validator reward rates of a round, in wei of the reward token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardRates {
    pub daily: U256,
    pub monthly: U256,
    pub annual: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub mechanics: Vec<Mechanics>,
    #[serde(default)]
    pub rounds: Vec<Round>,
}

impl Plan {
    /// Parse and validate a plan. Relative redirect file paths are resolved against the current
    /// directory.
    pub fn parse(yaml: &str) -> Result<Self, PlanError> {
        Self::parse_in(yaml, Path::new("."))
    }

    /// Read, parse and validate a plan file. Redirect files are resolved relative to it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| PlanError::Io { path: path.to_path_buf(), source })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse_in(&yaml, base_dir)
    }

    fn parse_in(yaml: &str, base_dir: &Path) -> Result<Self, PlanError> {
        let mut plan: Self = serde_yaml::from_str(yaml)?;
        for mechanics in plan.mechanics.iter_mut() {
            mechanics.load_redirect_files(base_dir)?;
        }
        plan.validate()?;
        tracing::debug!(
            version = plan.version,
            mechanics = plan.mechanics.len(),
            rounds = plan.rounds.len(),
            "Loaded rewards plan"
        );
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.mechanics.is_empty() {
            return Err(PlanError::MissingMechanics);
        }
        for pair in self.mechanics.windows(2) {
            if pair[0].since > pair[1].since {
                return Err(PlanError::UnsortedMechanics);
            }
            if pair[0].since == pair[1].since {
                return Err(PlanError::DuplicateMechanics(pair[1].since));
            }
        }
        for mechanics in &self.mechanics {
            mechanics.validate()?;
        }

        if self.rounds.is_empty() {
            return Err(PlanError::MissingRounds);
        }
        for pair in self.rounds.windows(2) {
            if pair[0].period > pair[1].period {
                return Err(PlanError::UnsortedRounds);
            }
            if pair[0].period == pair[1].period {
                return Err(PlanError::DuplicateRound(pair[1].period));
            }
        }
        Ok(())
    }

    /// The mechanics in effect at the given period: the last entry whose `since` is not after it.
    pub fn mechanics_at(&self, period: Period) -> Result<&Mechanics, PlanError> {
        if self.mechanics.windows(2).any(|pair| pair[0].since > pair[1].since) {
            return Err(PlanError::UnsortedMechanics);
        }
        self.mechanics
            .iter()
            .rev()
            .find(|mechanics| mechanics.since <= period)
            .ok_or(PlanError::MechanicsNotFound(period))
    }

    pub fn round(&self, period: Period) -> Option<&Round> {
        self.rounds.iter().find(|round| round.period == period)
    }

    /// Resolve the tier for a total effective balance, given in gwei.
    ///
    /// Tier bounds are in whole ether, so the balance is truncated to ether before comparing.
    pub fn tier(&self, period: Period, effective_balance_gwei: u64) -> Result<&Tier, CalcError> {
        if effective_balance_gwei == 0 {
            return Err(CalcError::NonPositiveEffectiveBalance(period));
        }
        let mechanics = self.mechanics_at(period)?;
        if !tiers_sorted(&mechanics.tiers) {
            return Err(PlanError::UnsortedTiers(mechanics.since).into());
        }
        let effective_balance = gwei_to_ether(effective_balance_gwei);
        mechanics
            .tiers
            .iter()
            .find(|tier| effective_balance <= tier.max_effective_balance)
            .ok_or(CalcError::ExceedsHighestTier { period, effective_balance })
    }

    /// Reward of a single validator over a year, a month and a day of the given period.
    pub fn validator_rewards(
        &self,
        period: Period,
        effective_balance_gwei: u64,
    ) -> Result<RewardRates, CalcError> {
        let tier = self.tier(period, effective_balance_gwei)?;
        let round = self.round(period).ok_or(CalcError::PeriodNotFound(period))?;

        let annual = Amount::from_integer(VALIDATOR_BALANCE_ETHER)
            .checked_mul(round.eth_apr)?
            .checked_div(round.ssv_eth)?
            .checked_mul(tier.apr_boost)?;
        let monthly = annual.checked_div(Amount::from_integer(12))?;
        let daily = monthly.checked_div(Amount::from_integer(period.days().into()))?;

        Ok(RewardRates { daily: daily.to_wei(), monthly: monthly.to_wei(), annual: annual.to_wei() })
    }

    /// Rounds eligible for computation given the available performance data, in order.
    pub fn complete_rounds(&self, performance: &PerformanceRange) -> Result<Vec<&Round>, CalcError> {
        if performance.earliest > performance.latest {
            return Err(CalcError::InvalidPerformanceRange {
                earliest: performance.earliest,
                latest: performance.latest,
            });
        }
        if let Some(first) = self.rounds.first() {
            if performance.earliest > first.period.first_day() {
                return Err(CalcError::PerformanceUnavailable(first.period));
            }
        }
        let rounds: Vec<&Round> =
            self.rounds.iter().filter(|round| round.is_complete(performance.latest)).collect();
        if rounds.is_empty() {
            return Err(CalcError::NoCompleteRounds);
        }
        Ok(rounds)
    }
}
