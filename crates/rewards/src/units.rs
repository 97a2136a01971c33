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

//! Scale factors between the units used by the reward computation.
//!
//! Every conversion between wei, gwei and whole tokens goes through this module. The unit
//! contract is:
//!
//! * Effective balances reported by the participation data are in gwei, and the weighted
//!   balances are gwei-days.
//! * Tier bounds ([crate::Tier::max_effective_balance]) are authored in whole ether.
//! * Rewards, fees and every other monetary integer are in wei of the reward token.

use alloy_primitives::U256;

/// Number of wei in one whole token.
pub const WEI_PER_ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Number of wei in one gwei.
pub const WEI_PER_GWEI: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

/// Number of gwei in one ether.
pub const GWEI_PER_ETHER: u64 = 1_000_000_000;

/// Balance of a single Ethereum validator, in ether.
pub const VALIDATOR_BALANCE_ETHER: u64 = 32;

/// Balance of a single Ethereum validator, in gwei.
pub const VALIDATOR_BALANCE_GWEI: u64 = VALIDATOR_BALANCE_ETHER * GWEI_PER_ETHER;

/// Working scale of [crate::Amount]: 10^36.
pub(crate) const AMOUNT_SCALE: U256 =
    U256::from_limbs([0xb34b_9f10_0000_0000, 0x00c0_97ce_7bc9_0715, 0, 0]);

/// Ratio between the working scale of [crate::Amount] and wei: 10^18.
pub(crate) const AMOUNT_PER_WEI: U256 = WEI_PER_ETHER;

/// Ratio between the working scale of [crate::Amount] and gwei: 10^27.
pub(crate) const AMOUNT_PER_GWEI: U256 =
    U256::from_limbs([0x9fd0_803c_e800_0000, 0x0000_0000_033b_2e3c, 0, 0]);

/// Convert a gwei quantity to whole ether, truncating.
pub const fn gwei_to_ether(gwei: u64) -> u64 {
    gwei / GWEI_PER_ETHER
}
