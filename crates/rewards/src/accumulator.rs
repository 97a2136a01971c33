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

//! Running totals of participants across rounds.

use std::collections::BTreeMap;

use alloy_primitives::U256;

use crate::{
    calculator::RewardOutcome, error::CalcError, participation::Participant, units::gwei_to_ether,
    Amount,
};

#[derive(Clone, Debug)]
struct Total<P> {
    record: P,
    reward: U256,
    fee_deduction: U256,
}

/// Totals of one kind of participant, keyed by its identity.
///
/// Rewards are accumulated as raw wei and only converted to [Amount] by [Totals::finalize].
#[derive(Clone, Debug)]
pub struct Totals<P: Participant> {
    totals: BTreeMap<P::Key, Total<P>>,
}

impl<P: Participant> Default for Totals<P> {
    fn default() -> Self {
        Self { totals: BTreeMap::new() }
    }
}

impl<P: Participant> Totals<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Add a participant's round to its total. The first occurrence of a key provides the
    /// record's descriptive fields.
    pub fn merge(&mut self, record: &P, outcome: RewardOutcome) -> Result<(), CalcError> {
        let Some(total) = self.totals.get_mut(&record.key()) else {
            self.totals.insert(
                record.key(),
                Total {
                    record: record.clone(),
                    reward: outcome.reward,
                    fee_deduction: outcome.fee_deduction,
                },
            );
            return Ok(());
        };

        let incoming = record.participation();
        let existing = total.record.participation_mut();
        existing.active_days = checked_add_u64(existing.active_days, incoming.active_days)?;
        existing.registered_days =
            checked_add_u64(existing.registered_days, incoming.registered_days)?;
        existing.total_active_effective_balance = checked_add_u64(
            existing.total_active_effective_balance,
            incoming.total_active_effective_balance,
        )?;
        existing.total_registered_effective_balance = checked_add_u64(
            existing.total_registered_effective_balance,
            incoming.total_registered_effective_balance,
        )?;
        total.reward =
            total.reward.checked_add(outcome.reward).ok_or(CalcError::Overflow("total reward"))?;
        total.fee_deduction = total
            .fee_deduction
            .checked_add(outcome.fee_deduction)
            .ok_or(CalcError::Overflow("total fee deduction"))?;
        Ok(())
    }

    /// Raw reward totals so far, in wei.
    pub fn cumulative_rewards(&self) -> BTreeMap<P::Key, U256> {
        self.totals.iter().map(|(key, total)| (key.clone(), total.reward)).collect()
    }

    /// Convert the accumulated totals to their final form: rewards as [Amount], and effective
    /// balances in ether-days.
    pub fn finalize(&self) -> Result<BTreeMap<P::Key, P>, CalcError> {
        let mut finalized = BTreeMap::new();
        for (key, total) in &self.totals {
            let mut record = total.record.clone();
            let participation = record.participation_mut();
            participation.reward = Amount::from_wei(total.reward)?;
            participation.fee_deduction = Amount::from_wei(total.fee_deduction)?;
            participation.total_active_effective_balance =
                gwei_to_ether(participation.total_active_effective_balance);
            participation.total_registered_effective_balance =
                gwei_to_ether(participation.total_registered_effective_balance);
            finalized.insert(key.clone(), record);
        }
        Ok(finalized)
    }
}

fn checked_add_u64(a: u64, b: u64) -> Result<u64, CalcError> {
    a.checked_add(b).ok_or(CalcError::Overflow("participation totals"))
}
