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

use std::collections::BTreeMap;

use alloy_primitives::{address, Address, U256};
use chrono::NaiveDate;
use ssv_rewards::{
    compute_rewards, units::GWEI_PER_ETHER, Amount, BlsPubKey, CalcError, Feature, Mechanics,
    OwnerParticipation, Participation, ParticipationSource, PerformanceRange, Period, Plan,
    RecipientParticipation, RoundParticipations, ValidatorParticipation,
};
use tracing_test::traced_test;

const PLAN: &str = r#"
version: 2
mechanics:
  - since: 2024-01
    criteria:
      min_attestations_per_day: 202
      min_decideds_per_day: 22
    tiers:
      - max_effective_balance: 64000
        apr_boost: 0.5
      - max_effective_balance: 160000
        apr_boost: 0.4
  - since: 2024-02
    criteria:
      min_attestations_per_day: 202
      min_decideds_per_day: 22
    tiers:
      - max_effective_balance: 64000
        apr_boost: 0.5
      - max_effective_balance: 160000
        apr_boost: 0.4
    features: [gnosis_safe]
    owner_redirects:
      "0x1000000000000000000000000000000000000002": "0x2000000000000000000000000000000000000002"
    network_fee_address: "0x4000000000000000000000000000000000000001"
rounds:
  - period: 2024-01
    eth_apr: 0.05
    ssv_eth: 0.01
    network_fee: 0
  - period: 2024-02
    eth_apr: 0.05
    ssv_eth: 0.01
    network_fee: 0.000001
  - period: 2024-03
    eth_apr: 0.05
    ssv_eth: 0.01
"#;

const OWNER_A: Address = address!("0x1000000000000000000000000000000000000001");
const OWNER_B: Address = address!("0x1000000000000000000000000000000000000002");
const REDIRECT_B: Address = address!("0x2000000000000000000000000000000000000002");
const FEE_ADDRESS: Address = address!("0x4000000000000000000000000000000000000001");

fn period(s: &str) -> Period {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// A validator with the given balance, active and registered on `days` days.
struct Validator {
    owner: Address,
    key: u8,
    ether: u64,
    days: u64,
}

fn participation(ether: u64, days: u64) -> Participation {
    let balance = ether * GWEI_PER_ETHER * days;
    Participation {
        active_days: days,
        registered_days: days,
        total_active_effective_balance: balance,
        total_registered_effective_balance: balance,
        ..Default::default()
    }
}

fn sum(parts: &[Participation]) -> Participation {
    parts.iter().fold(Participation::default(), |acc, p| Participation {
        active_days: acc.active_days + p.active_days,
        registered_days: acc.registered_days + p.registered_days,
        total_active_effective_balance: acc.total_active_effective_balance
            + p.total_active_effective_balance,
        total_registered_effective_balance: acc.total_registered_effective_balance
            + p.total_registered_effective_balance,
        ..Default::default()
    })
}

/// Participations derived from validator activity, grouped the way the data layer groups them.
#[derive(Default)]
struct MemorySource {
    validators: BTreeMap<Period, Vec<Validator>>,
    fetched: Vec<Period>,
}

impl ParticipationSource for MemorySource {
    type Error = anyhow::Error;

    fn participations(
        &mut self,
        period: Period,
        mechanics: &Mechanics,
    ) -> anyhow::Result<RoundParticipations> {
        self.fetched.push(period);
        let mut data = RoundParticipations::default();
        let mut by_owner: BTreeMap<Address, Vec<Participation>> = BTreeMap::new();
        let mut by_recipient: BTreeMap<Address, Vec<Participation>> = BTreeMap::new();
        for v in self.validators.get(&period).into_iter().flatten() {
            let public_key = BlsPubKey::repeat_byte(v.key);
            let recipient = mechanics.recipient_for_validator(&public_key, v.owner);
            let p = participation(v.ether, v.days);
            data.validators.push(ValidatorParticipation {
                owner_address: v.owner,
                recipient_address: recipient,
                public_key,
                participation: p.clone(),
            });
            by_owner.entry(v.owner).or_default().push(p.clone());
            by_recipient.entry(recipient).or_default().push(p);
        }
        for (owner, parts) in by_owner {
            data.owners.push(OwnerParticipation {
                owner_address: owner,
                validators: parts.len() as u64,
                participation: sum(&parts),
            });
        }
        for (recipient, parts) in by_recipient {
            data.recipients.push(RecipientParticipation {
                recipient_address: recipient,
                is_deployer: false,
                participation: sum(&parts),
            });
        }
        Ok(data)
    }
}

fn source() -> MemorySource {
    let mut source = MemorySource::default();
    source.validators.insert(
        period("2024-01"),
        vec![
            Validator { owner: OWNER_A, key: 1, ether: 32, days: 31 },
            Validator { owner: OWNER_A, key: 2, ether: 32, days: 10 },
            Validator { owner: OWNER_B, key: 3, ether: 32, days: 31 },
        ],
    );
    source.validators.insert(
        period("2024-02"),
        vec![
            Validator { owner: OWNER_A, key: 1, ether: 32, days: 29 },
            Validator { owner: OWNER_A, key: 2, ether: 32, days: 29 },
            Validator { owner: OWNER_B, key: 3, ether: 64, days: 29 },
        ],
    );
    source
}

fn performance() -> PerformanceRange {
    PerformanceRange { earliest: date("2023-12-15"), latest: date("2024-03-10") }
}

const DAILY_JANUARY: u64 = 215_053_763_440_860_215;
const DAILY_FEBRUARY: u64 = 229_885_057_471_264_367;

#[test]
#[traced_test]
fn computes_complete_rounds() -> anyhow::Result<()> {
    let plan = Plan::parse(PLAN)?;
    let mut source = source();
    let report = compute_rewards(&plan, &performance(), &mut source)?;

    // March is not complete yet.
    assert_eq!(source.fetched, vec![period("2024-01"), period("2024-02")]);
    assert_eq!(report.rounds.len(), 2);

    let january = &report.rounds[0];
    assert_eq!(january.summary.tier, 64000);
    assert_eq!(january.summary.annual_reward, "80".parse::<Amount>()?);
    assert_eq!(january.summary.daily_reward.to_wei(), U256::from(DAILY_JANUARY));
    // (31 + 10 + 31) days of 32 ETH, averaged over 31 days.
    assert_eq!(january.summary.total_effective_balance, 74);

    let full_month = U256::from(DAILY_JANUARY) * U256::from(31u64);
    let ten_days = U256::from(DAILY_JANUARY) * U256::from(10u64);
    assert_eq!(january.validators[0].participation.reward.to_wei(), full_month);
    assert_eq!(january.validators[1].participation.reward.to_wei(), ten_days);
    assert_eq!(january.cumulative.by_owner[&OWNER_A], full_month + ten_days);
    // No redirects and no fee address before February.
    assert_eq!(january.cumulative.by_recipient[&OWNER_B], full_month);
    assert_eq!(january.owners.len(), 2);

    let february = &report.rounds[1];
    assert_eq!(february.summary.daily_reward.to_wei(), U256::from(DAILY_FEBRUARY));
    assert!(february.recipients.iter().any(|r| r.recipient_address == REDIRECT_B));
    assert!(logs_contain("Computed round rewards"));
    assert!(logs_contain("daily_reward=0.215053763440860215"));
    assert!(logs_contain("annual_reward=80.000000000000000000"));
    Ok(())
}

#[test]
fn applies_network_fee() -> anyhow::Result<()> {
    let plan = Plan::parse(PLAN)?;
    let report = compute_rewards(&plan, &performance(), &mut source())?;
    let february = &report.rounds[1];

    // Only the 64 ETH validator exceeds the reference balance, by one full fee budget.
    let fee = U256::from(1_000_000_000_000u64);
    let owner_b = february.owners.iter().find(|o| o.owner_address == OWNER_B).unwrap();
    assert_eq!(owner_b.participation.fee_deduction.to_wei(), fee);
    assert_eq!(
        owner_b.participation.reward.to_wei(),
        U256::from(DAILY_FEBRUARY) * U256::from(58u64) - fee
    );

    let fee_owner = february.owners.iter().find(|o| o.owner_address == FEE_ADDRESS).unwrap();
    assert_eq!(fee_owner.participation.reward.to_wei(), fee);
    assert_eq!(fee_owner.participation.active_days, 29);
    let fee_recipient =
        february.recipients.iter().find(|r| r.recipient_address == FEE_ADDRESS).unwrap();
    assert_eq!(fee_recipient.participation.reward.to_wei(), fee);
    assert!(report.total_by_recipient.contains_key(&FEE_ADDRESS));
    Ok(())
}

#[test]
fn totals_span_rounds() -> anyhow::Result<()> {
    let plan = Plan::parse(PLAN)?;
    let report = compute_rewards(&plan, &performance(), &mut source())?;

    let total = &report.total_by_validator[&BlsPubKey::repeat_byte(1)];
    assert_eq!(total.participation.active_days, 60);
    // Effective balances are reported in ether-days.
    assert_eq!(total.participation.total_active_effective_balance, 32 * 60);
    let expected = U256::from(DAILY_JANUARY) * U256::from(31u64)
        + U256::from(DAILY_FEBRUARY) * U256::from(29u64);
    assert_eq!(total.participation.reward.to_wei(), expected);

    assert_eq!(report.by_validator.len(), 6);
    assert_eq!(report.by_validator[0].period, period("2024-01"));
    assert_eq!(report.by_validator[5].period, period("2024-02"));

    let last = &report.rounds[1].cumulative;
    for (key, total) in &report.total_by_owner {
        assert_eq!(total.participation.reward.to_wei(), last.by_owner[key]);
    }
    Ok(())
}

#[test]
fn identical_inputs_give_identical_reports() -> anyhow::Result<()> {
    let plan = Plan::parse(PLAN)?;
    let first = compute_rewards(&plan, &performance(), &mut source())?;
    let second = compute_rewards(&plan, &performance(), &mut source())?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn fails_without_complete_rounds() -> anyhow::Result<()> {
    let plan = Plan::parse(PLAN)?;
    let range = PerformanceRange { earliest: date("2024-01-01"), latest: date("2024-01-20") };
    let err = compute_rewards(&plan, &range, &mut source()).unwrap_err();
    assert!(matches!(err.downcast_ref::<CalcError>(), Some(CalcError::NoCompleteRounds)));
    Ok(())
}

#[test]
fn fails_on_tier_overflow() -> anyhow::Result<()> {
    let plan = Plan::parse(PLAN)?;
    let mut source = MemorySource::default();
    // 192000 ETH of effective balance exceeds the highest tier.
    source.validators.insert(
        period("2024-01"),
        vec![Validator { owner: OWNER_A, key: 1, ether: 192_000, days: 31 }],
    );
    let range = PerformanceRange { earliest: date("2024-01-01"), latest: date("2024-01-31") };
    let err = compute_rewards(&plan, &range, &mut source).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CalcError>(),
        Some(CalcError::ExceedsHighestTier { effective_balance: 192_000, .. })
    ));
    Ok(())
}

#[test]
fn mechanics_reach_the_source() -> anyhow::Result<()> {
    let plan = Plan::parse(PLAN)?;
    let january = plan.mechanics_at(period("2024-01"))?;
    let february = plan.mechanics_at(period("2024-02"))?;
    assert!(!january.feature_enabled(Feature::GnosisSafe));
    assert!(february.feature_enabled(Feature::GnosisSafe));
    assert_eq!(february.recipient_for_owner(OWNER_B), REDIRECT_B);
    assert_eq!(january.recipient_for_owner(OWNER_B), OWNER_B);
    Ok(())
}
