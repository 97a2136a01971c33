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

//! Reward computation for SSV network validators, owners and fee recipients.

// Declare modules
pub mod accumulator;
pub mod amount;
pub mod calculator;
pub mod engine;
pub mod error;
pub mod mechanics;
pub mod participation;
pub mod period;
pub mod plan;
pub mod units;

// Re-export commonly used types
pub use accumulator::Totals;

pub use amount::Amount;

pub use calculator::{calculate_final_reward_and_fee, RewardInputs, RewardOutcome};

pub use engine::{
    compute_rewards, CumulativeRewards, ParticipationSource, RewardsEngine, RewardsReport,
    RoundParticipations, RoundRewards, RoundSummary,
};

pub use error::{AmountError, CalcError, PeriodError, PlanError};

pub use mechanics::{BlsPubKey, Criteria, Feature, Mechanics, Tier};

pub use participation::{
    OwnerParticipation, Participant, Participation, PeriodRow, RecipientParticipation,
    ValidatorParticipation,
};

pub use period::Period;

pub use plan::{PerformanceRange, Plan, RewardRates, Round};
