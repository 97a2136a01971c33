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

//! Participation records of validators, owners and recipients within a period.

use std::fmt;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{mechanics::BlsPubKey, Amount, Period};

/// Activity of one entity over a period, and the reward computed for it.
///
/// Effective balances are sums over days, in gwei-days, until the totals are finalized, after
/// which they are in ether-days.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    /// Days on which the entity met the performance criteria.
    pub active_days: u64,
    /// Days on which the entity was registered with the network.
    pub registered_days: u64,
    /// Effective balance summed over the active days.
    pub total_active_effective_balance: u64,
    /// Effective balance summed over the registered days.
    pub total_registered_effective_balance: u64,
    /// Reward net of the network fee.
    #[serde(default)]
    pub reward: Amount,
    /// Network fee deducted from the gross reward.
    #[serde(default)]
    pub fee_deduction: Amount,
}

/// Participation of a single validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorParticipation {
    /// Owner of the validator's cluster.
    pub owner_address: Address,
    /// Address the validator's rewards are paid to, after redirects.
    pub recipient_address: Address,
    /// BLS public key of the validator.
    pub public_key: BlsPubKey,
    #[serde(flatten)]
    pub participation: Participation,
}

/// Participation of an owner, summed over its validators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerParticipation {
    pub owner_address: Address,
    /// Number of the owner's validators that took part in the period.
    #[serde(default)]
    pub validators: u64,
    #[serde(flatten)]
    pub participation: Participation,
}

/// Participation of a reward recipient, summed over the validators paying it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientParticipation {
    pub recipient_address: Address,
    /// Whether the recipient is the deployer of a Gnosis Safe.
    #[serde(default)]
    pub is_deployer: bool,
    #[serde(flatten)]
    pub participation: Participation,
}

/// An entity that takes part in a round and accumulates rewards across rounds.
pub trait Participant: Clone {
    /// Stable identity of the entity across rounds.
    type Key: Ord + Clone + fmt::Debug + fmt::Display;

    const KIND: &'static str;

    fn key(&self) -> Self::Key;
    fn participation(&self) -> &Participation;
    fn participation_mut(&mut self) -> &mut Participation;
}

impl Participant for ValidatorParticipation {
    type Key = BlsPubKey;
    const KIND: &'static str = "validator";

    fn key(&self) -> BlsPubKey {
        self.public_key
    }

    fn participation(&self) -> &Participation {
        &self.participation
    }

    fn participation_mut(&mut self) -> &mut Participation {
        &mut self.participation
    }
}

impl Participant for OwnerParticipation {
    type Key = Address;
    const KIND: &'static str = "owner";

    fn key(&self) -> Address {
        self.owner_address
    }

    fn participation(&self) -> &Participation {
        &self.participation
    }

    fn participation_mut(&mut self) -> &mut Participation {
        &mut self.participation
    }
}

impl Participant for RecipientParticipation {
    type Key = Address;
    const KIND: &'static str = "recipient";

    fn key(&self) -> Address {
        self.recipient_address
    }

    fn participation(&self) -> &Participation {
        &self.participation
    }

    fn participation_mut(&mut self) -> &mut Participation {
        &mut self.participation
    }
}

/// A row tagged with the period it was computed for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRow<P> {
    pub period: Period,
    #[serde(flatten)]
    pub row: P,
}
