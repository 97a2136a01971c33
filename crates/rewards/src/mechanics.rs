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

//! Versioned reward mechanics: tiers, participation criteria, features and redirects.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_primitives::{Address, FixedBytes};
use serde::{Deserialize, Serialize};

use crate::{error::PlanError, Amount, Period};

/// BLS public key of a validator.
pub type BlsPubKey = FixedBytes<48>;

/// Redirects of rewards from an owner address to a substitute recipient.
pub type OwnerRedirects = BTreeMap<Address, Address>;

/// Redirects of rewards from a validator to a substitute recipient.
pub type ValidatorRedirects = BTreeMap<BlsPubKey, Address>;

/// Optional behaviors of the participation queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Do not reward the deployer addresses of Gnosis Safes.
    GnosisSafe,
}

/// Minimum daily duties for a validator-day to count as active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub min_attestations_per_day: u32,
    pub min_decideds_per_day: u32,
}

impl Criteria {
    pub fn is_set(&self) -> bool {
        self.min_attestations_per_day > 0 && self.min_decideds_per_day > 0
    }
}

/// A step of the APR boost schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Upper bound (inclusive) of the network's total effective balance, in ETH.
    pub max_effective_balance: u64,
    pub apr_boost: Amount,
}

/// The rules in effect from [Mechanics::since] until the next mechanics entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mechanics {
    pub since: Period,
    #[serde(default)]
    pub criteria: Criteria,
    #[serde(default)]
    pub tiers: Vec<Tier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub owner_redirects: OwnerRedirects,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_redirects_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub validator_redirects: ValidatorRedirects,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_redirects_file: Option<PathBuf>,
    /// Address that collects the network fee deducted from rewards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_fee_address: Option<Address>,
}

impl Mechanics {
    pub fn new(since: Period, criteria: Criteria, tiers: Vec<Tier>) -> Self {
        Self {
            since,
            criteria,
            tiers,
            features: Vec::new(),
            owner_redirects: OwnerRedirects::new(),
            owner_redirects_file: None,
            validator_redirects: ValidatorRedirects::new(),
            validator_redirects_file: None,
            network_fee_address: None,
        }
    }

    pub fn feature_enabled(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Recipient of the rewards earned by the given owner.
    pub fn recipient_for_owner(&self, owner: Address) -> Address {
        self.owner_redirects.get(&owner).copied().unwrap_or(owner)
    }

    /// Recipient of the rewards earned by the given validator. A validator redirect takes
    /// precedence over a redirect of its owner.
    pub fn recipient_for_validator(&self, public_key: &BlsPubKey, owner: Address) -> Address {
        self.validator_redirects
            .get(public_key)
            .copied()
            .unwrap_or_else(|| self.recipient_for_owner(owner))
    }

    pub(crate) fn validate(&self) -> Result<(), PlanError> {
        if !self.criteria.is_set() {
            return Err(PlanError::MissingCriteria(self.since));
        }
        let Some(first) = self.tiers.first() else {
            return Err(PlanError::MissingTiers(self.since));
        };
        if !tiers_sorted(&self.tiers) {
            return Err(PlanError::UnsortedTiers(self.since));
        }
        if first.max_effective_balance == 0 {
            return Err(PlanError::NonPositiveTier(self.since));
        }
        for pair in self.tiers.windows(2) {
            if pair[0].max_effective_balance == pair[1].max_effective_balance {
                return Err(PlanError::DuplicateTier {
                    since: self.since,
                    tier: pair[1].max_effective_balance,
                });
            }
        }
        self.check_redirect_conflicts()
    }

    fn check_redirect_conflicts(&self) -> Result<(), PlanError> {
        if !self.owner_redirects.is_empty() && self.owner_redirects_file.is_some() {
            return Err(PlanError::ConflictingRedirects { since: self.since, kind: "owner" });
        }
        if !self.validator_redirects.is_empty() && self.validator_redirects_file.is_some() {
            return Err(PlanError::ConflictingRedirects { since: self.since, kind: "validator" });
        }
        Ok(())
    }

    /// Load the redirect CSV files, resolving relative paths against `base_dir`.
    pub(crate) fn load_redirect_files(&mut self, base_dir: &Path) -> Result<(), PlanError> {
        self.check_redirect_conflicts()?;
        if let Some(file) = self.owner_redirects_file.take() {
            self.owner_redirects = load_redirects(&base_dir.join(file), "owner")?;
        }
        if let Some(file) = self.validator_redirects_file.take() {
            self.validator_redirects = load_redirects(&base_dir.join(file), "validator")?;
        }
        Ok(())
    }
}

/// Whether the tiers are in ascending order of their bound. Equal bounds are reported separately
/// as duplicates.
pub(crate) fn tiers_sorted(tiers: &[Tier]) -> bool {
    tiers.windows(2).all(|pair| pair[0].max_effective_balance <= pair[1].max_effective_balance)
}

/// Read a `from,to` CSV file of redirects.
fn load_redirects<K>(path: &Path, kind: &'static str) -> Result<BTreeMap<K, Address>, PlanError>
where
    K: FromStr + Ord + fmt::Display,
    K::Err: fmt::Display,
{
    let file_error = |reason: String| PlanError::RedirectsFile { path: path.to_path_buf(), reason };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| file_error(e.to_string()))?;

    let header = reader.headers().map_err(|e| file_error(e.to_string()))?;
    if header.len() != 2
        || !header[0].eq_ignore_ascii_case("from")
        || !header[1].eq_ignore_ascii_case("to")
    {
        return Err(file_error("invalid or missing header: expected 'from,to'".to_string()));
    }

    let mut redirects = BTreeMap::new();
    for (i, record) in reader.records().enumerate() {
        // +2 accounts for the header row and 1-based line numbers.
        let line = i + 2;
        let record = record.map_err(|e| file_error(format!("line {line}: {e}")))?;
        if record.len() != 2 {
            return Err(file_error(format!("invalid CSV format on line {line}")));
        }
        let from = K::from_str(&record[0])
            .map_err(|e| file_error(format!("invalid {kind} on line {line}: {e}")))?;
        let to = Address::from_str(&record[1])
            .map_err(|e| file_error(format!("invalid execution address on line {line}: {e}")))?;
        let key = from.to_string();
        if redirects.insert(from, to).is_some() {
            return Err(PlanError::DuplicateRedirect { kind, key });
        }
    }
    Ok(redirects)
}
