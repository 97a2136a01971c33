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

//! Reward and network-fee deduction of a single entity in a round.

use alloy_primitives::U256;

use crate::{error::CalcError, participation::Participation, units::VALIDATOR_BALANCE_GWEI};

/// Inputs of [calculate_final_reward_and_fee]. Balances are in gwei-days, amounts in wei.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardInputs {
    pub active_effective_balance: u64,
    pub registered_effective_balance: u64,
    pub registered_days: u64,
    pub round_days: u64,
    pub daily_reward: U256,
    pub network_fee: U256,
}

impl RewardInputs {
    pub fn new(
        participation: &Participation,
        round_days: u64,
        daily_reward: U256,
        network_fee: U256,
    ) -> Self {
        Self {
            active_effective_balance: participation.total_active_effective_balance,
            registered_effective_balance: participation.total_registered_effective_balance,
            registered_days: participation.registered_days,
            round_days,
            daily_reward,
            network_fee,
        }
    }
}

/// Net reward and fee deduction, in wei. `reward + fee_deduction` is the gross reward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardOutcome {
    pub reward: U256,
    pub fee_deduction: U256,
}

/// Compute the reward of an entity and the network fee deducted from it.
///
/// The gross reward is the entity's share of a 32 ETH validator's reward for the round, weighted
/// by the effective balance it kept active. The fee is charged on the registered effective
/// balance, credited back pro rata for the days the entity was registered, and never exceeds the
/// gross reward. Every division truncates, and every product is taken before dividing.
pub fn calculate_final_reward_and_fee(inputs: &RewardInputs) -> Result<RewardOutcome, CalcError> {
    if inputs.round_days == 0 {
        return Err(CalcError::ZeroRoundDays);
    }
    let round_days = U256::from(inputs.round_days);

    let unit_base = U256::from(VALIDATOR_BALANCE_GWEI) * round_days;
    let reward_tier =
        inputs.daily_reward.checked_mul(round_days).ok_or(CalcError::Overflow("round reward"))?;

    let base_reward = reward_tier
        .checked_mul(U256::from(inputs.active_effective_balance))
        .ok_or(CalcError::Overflow("base reward"))?
        / unit_base;

    let fee_from_effective_balance = inputs
        .network_fee
        .checked_mul(U256::from(inputs.registered_effective_balance))
        .ok_or(CalcError::Overflow("network fee"))?
        / unit_base;
    let fee_credit = inputs
        .network_fee
        .checked_mul(U256::from(inputs.registered_days))
        .ok_or(CalcError::Overflow("network fee credit"))?
        / round_days;
    let raw_fee = fee_from_effective_balance.saturating_sub(fee_credit);

    let fee_deduction = base_reward.min(raw_fee);
    Ok(RewardOutcome { reward: base_reward - fee_deduction, fee_deduction })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUND_DAYS: u64 = 31;
    // 32 ETH for the whole round, in gwei-days.
    const FULL_BALANCE: u64 = VALIDATOR_BALANCE_GWEI * ROUND_DAYS;

    fn inputs(active: u64, registered: u64, registered_days: u64, fee: u64) -> RewardInputs {
        RewardInputs {
            active_effective_balance: active,
            registered_effective_balance: registered,
            registered_days,
            round_days: ROUND_DAYS,
            daily_reward: U256::from(215_053_763_440_860_215u64),
            network_fee: U256::from(fee),
        }
    }

    #[test]
    fn test_full_month_validator() {
        let outcome =
            calculate_final_reward_and_fee(&inputs(FULL_BALANCE, FULL_BALANCE, 31, 0)).unwrap();
        assert_eq!(outcome.reward, U256::from(215_053_763_440_860_215u64 * 31));
        assert_eq!(outcome.fee_deduction, U256::ZERO);
    }

    #[test]
    fn test_partial_activity_truncates() {
        // Active for 10 of 31 days.
        let active = VALIDATOR_BALANCE_GWEI * 10;
        let outcome = calculate_final_reward_and_fee(&inputs(active, active, 10, 0)).unwrap();
        let expected = U256::from(215_053_763_440_860_215u64) * U256::from(31u64) * U256::from(active)
            / U256::from(FULL_BALANCE);
        assert_eq!(outcome.reward, expected);
        assert_eq!(outcome.reward, U256::from(2_150_537_634_408_602_150u64));
    }

    #[test]
    fn test_zero_round_days() {
        let mut zero = inputs(FULL_BALANCE, FULL_BALANCE, 31, 0);
        zero.round_days = 0;
        assert!(matches!(calculate_final_reward_and_fee(&zero), Err(CalcError::ZeroRoundDays)));
    }

    #[test]
    fn test_credit_exceeds_fee() {
        // 40% of the reference balance registered for the whole round: the fee from effective
        // balance is 40, the credit 100.
        let registered = FULL_BALANCE / 10 * 4;
        let outcome = calculate_final_reward_and_fee(&inputs(FULL_BALANCE, registered, 31, 100))
            .unwrap();
        assert_eq!(outcome.fee_deduction, U256::ZERO);
        assert_eq!(outcome.reward, U256::from(215_053_763_440_860_215u64 * 31));
    }

    #[test]
    fn test_full_registration_owes_no_fee() {
        let fee = 1_000_000_000_000_000_000u64;
        let outcome =
            calculate_final_reward_and_fee(&inputs(FULL_BALANCE, FULL_BALANCE, 31, fee)).unwrap();
        assert_eq!(outcome.fee_deduction, U256::ZERO);
    }

    #[test]
    fn test_fee_charged_above_reference_balance() {
        // 64 ETH registered all round: the fee is twice the budget, minus a full credit.
        let outcome = calculate_final_reward_and_fee(&inputs(
            FULL_BALANCE * 2,
            FULL_BALANCE * 2,
            31,
            100,
        ))
        .unwrap();
        assert_eq!(outcome.fee_deduction, U256::from(100u64));
        assert_eq!(
            outcome.reward + outcome.fee_deduction,
            U256::from(215_053_763_440_860_215u64 * 62)
        );
    }

    #[test]
    fn test_fee_clamped_to_reward() {
        // Registered but never active: no reward, so no fee can be deducted.
        let outcome =
            calculate_final_reward_and_fee(&inputs(0, FULL_BALANCE * 3, 31, 1_000)).unwrap();
        assert_eq!(outcome, RewardOutcome::default());

        let mut tiny = inputs(1, FULL_BALANCE * 3, 31, 1_000_000);
        tiny.daily_reward = U256::from(FULL_BALANCE);
        let outcome = calculate_final_reward_and_fee(&tiny).unwrap();
        assert_eq!(outcome.fee_deduction, U256::from(31u64));
        assert_eq!(outcome.reward, U256::ZERO);
    }

    #[test]
    fn test_fee_never_exceeds_gross_reward() {
        let balances = [0, 1, VALIDATOR_BALANCE_GWEI, FULL_BALANCE / 2, FULL_BALANCE, FULL_BALANCE * 5];
        let fees = [0u64, 1, 1_000, 10u64.pow(18), 10u64.pow(19)];
        for active in balances {
            for registered in balances {
                for registered_days in [0, 1, 15, 31] {
                    for fee in fees {
                        let i = inputs(active, registered, registered_days, fee);
                        let outcome = calculate_final_reward_and_fee(&i).unwrap();
                        let gross = i.daily_reward * U256::from(ROUND_DAYS) * U256::from(active)
                            / U256::from(FULL_BALANCE);
                        assert!(outcome.fee_deduction <= gross, "{i:?}");
                        assert_eq!(outcome.reward + outcome.fee_deduction, gross, "{i:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_overflow_is_an_error() {
        let mut huge = inputs(u64::MAX, 0, 0, 0);
        huge.daily_reward = U256::MAX;
        assert!(matches!(calculate_final_reward_and_fee(&huge), Err(CalcError::Overflow(_))));
    }
}
