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

//! Computation of rewards over the rounds of a plan.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    accumulator::Totals,
    calculator::{calculate_final_reward_and_fee, RewardInputs, RewardOutcome},
    error::{CalcError, PlanError},
    mechanics::{BlsPubKey, Mechanics},
    participation::{
        OwnerParticipation, Participant, Participation, PeriodRow, RecipientParticipation,
        ValidatorParticipation,
    },
    plan::{PerformanceRange, Plan, Round},
    units::gwei_to_ether,
    Amount, Period,
};

/// Supplier of the participation records of a period.
///
/// Implementations apply the criteria, features and redirects of the given mechanics when
/// selecting and attributing records.
pub trait ParticipationSource {
    type Error: From<CalcError>;

    fn participations(
        &mut self,
        period: Period,
        mechanics: &Mechanics,
    ) -> Result<RoundParticipations, Self::Error>;
}

/// Participation records of one period, in the order produced by the source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundParticipations {
    pub validators: Vec<ValidatorParticipation>,
    pub owners: Vec<OwnerParticipation>,
    pub recipients: Vec<RecipientParticipation>,
}

/// Parameters of a computed round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    pub period: Period,
    /// Number of participating validators.
    pub validators: u64,
    /// Average daily effective balance of the participating validators, in ether.
    pub total_effective_balance: u64,
    /// Bound of the tier the round resolved to.
    pub tier: u64,
    /// APR boost of the resolved tier.
    pub apr_boost: Amount,
    /// Network fee per validator for the round.
    pub network_fee: Amount,
    /// Reward of a single 32 ETH validator over a day of the round.
    pub daily_reward: Amount,
    /// Reward of a single 32 ETH validator over a month.
    pub monthly_reward: Amount,
    /// Reward of a single 32 ETH validator over a year.
    pub annual_reward: Amount,
}

/// Raw cumulative rewards, in wei, of every participant as of the end of a round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CumulativeRewards {
    pub by_validator: BTreeMap<BlsPubKey, U256>,
    pub by_owner: BTreeMap<Address, U256>,
    pub by_recipient: BTreeMap<Address, U256>,
}

/// Rewards computed for a single round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundRewards {
    pub summary: RoundSummary,
    /// Validator rows with their rewards, in source order.
    pub validators: Vec<ValidatorParticipation>,
    /// Owner rows with their rewards, followed by the network fee row if any.
    pub owners: Vec<OwnerParticipation>,
    /// Recipient rows with their rewards, followed by the network fee row if any.
    pub recipients: Vec<RecipientParticipation>,
    /// Running totals as of the end of the round.
    pub cumulative: CumulativeRewards,
}

/// Rewards of every processed round, and the finalized totals across them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardsReport {
    /// Processed rounds, in chronological order.
    pub rounds: Vec<RoundRewards>,
    /// Every validator row of every round, tagged with its period.
    pub by_validator: Vec<PeriodRow<ValidatorParticipation>>,
    /// Every owner row of every round, tagged with its period.
    pub by_owner: Vec<PeriodRow<OwnerParticipation>>,
    /// Every recipient row of every round, tagged with its period.
    pub by_recipient: Vec<PeriodRow<RecipientParticipation>>,
    /// Totals per validator across rounds, with balances in ether-days.
    pub total_by_validator: BTreeMap<BlsPubKey, ValidatorParticipation>,
    /// Totals per owner across rounds, with balances in ether-days.
    pub total_by_owner: BTreeMap<Address, OwnerParticipation>,
    /// Totals per recipient across rounds, with balances in ether-days.
    pub total_by_recipient: BTreeMap<Address, RecipientParticipation>,
}

/// Folds rounds, in chronological order, into per-round rewards and running totals.
pub struct RewardsEngine<'a> {
    plan: &'a Plan,
    rounds: Vec<RoundRewards>,
    by_validator: Vec<PeriodRow<ValidatorParticipation>>,
    by_owner: Vec<PeriodRow<OwnerParticipation>>,
    by_recipient: Vec<PeriodRow<RecipientParticipation>>,
    validator_totals: Totals<ValidatorParticipation>,
    owner_totals: Totals<OwnerParticipation>,
    recipient_totals: Totals<RecipientParticipation>,
}

impl<'a> RewardsEngine<'a> {
    pub fn new(plan: &'a Plan) -> Self {
        Self {
            plan,
            rounds: Vec::new(),
            by_validator: Vec::new(),
            by_owner: Vec::new(),
            by_recipient: Vec::new(),
            validator_totals: Totals::new(),
            owner_totals: Totals::new(),
            recipient_totals: Totals::new(),
        }
    }

    /// Compute the rewards of a round and add them to the running totals.
    ///
    /// `round` must be the plan's round for its period, and follow the last processed round.
    pub fn process_round(
        &mut self,
        round: &Round,
        participations: RoundParticipations,
    ) -> Result<&RoundRewards, CalcError> {
        let period = round.period;
        if let Some(last) = self.rounds.last() {
            if last.summary.period >= period {
                return Err(PlanError::UnsortedRounds.into());
            }
        }
        if participations.validators.is_empty() {
            return Err(CalcError::NoParticipants(period));
        }
        let plan = self.plan;
        if plan.round(period) != Some(round) {
            return Err(CalcError::RoundMismatch(period));
        }
        let mechanics = plan.mechanics_at(period)?;
        let round_days = u64::from(period.days());

        let mut total_active_effective_balance = 0u64;
        for validator in &participations.validators {
            total_active_effective_balance = total_active_effective_balance
                .checked_add(validator.participation.total_active_effective_balance)
                .ok_or(CalcError::Overflow("network effective balance"))
                .map_err(|e| in_round(period, e))?;
        }
        let effective_balance = total_active_effective_balance / round_days;

        let tier = plan.tier(period, effective_balance).map_err(|e| in_round(period, e))?;
        let rates =
            plan.validator_rewards(period, effective_balance).map_err(|e| in_round(period, e))?;
        let network_fee = round.network_fee.to_wei();

        let validators = compute_rows(
            period,
            participations.validators,
            round_days,
            rates.daily,
            network_fee,
        )?;
        let mut owners =
            compute_rows(period, participations.owners, round_days, rates.daily, network_fee)?;
        let mut recipients =
            compute_rows(period, participations.recipients, round_days, rates.daily, network_fee)?;

        check_owner_active_days(period, &validators, &owners)?;

        if let Some(fee_address) = mechanics.network_fee_address {
            if let Some((participation, outcome)) = network_fee_row(&owners)? {
                owners.push((
                    OwnerParticipation { owner_address: fee_address, validators: 0, participation },
                    outcome,
                ));
            }
            if let Some((participation, outcome)) = network_fee_row(&recipients)? {
                recipients.push((
                    RecipientParticipation {
                        recipient_address: fee_address,
                        is_deployer: false,
                        participation,
                    },
                    outcome,
                ));
            }
        }

        let summary = RoundSummary {
            period,
            validators: validators.len() as u64,
            total_effective_balance: gwei_to_ether(effective_balance),
            tier: tier.max_effective_balance,
            apr_boost: tier.apr_boost,
            network_fee: round.network_fee,
            daily_reward: Amount::from_wei(rates.daily).map_err(|e| in_round(period, e))?,
            monthly_reward: Amount::from_wei(rates.monthly).map_err(|e| in_round(period, e))?,
            annual_reward: Amount::from_wei(rates.annual).map_err(|e| in_round(period, e))?,
        };
        tracing::info!(
            period = %summary.period,
            validators = summary.validators,
            total_effective_balance = summary.total_effective_balance,
            tier = summary.tier,
            apr_boost = %summary.apr_boost,
            network_fee = %summary.network_fee,
            daily_reward = %summary.daily_reward,
            monthly_reward = %summary.monthly_reward,
            annual_reward = %summary.annual_reward,
            "Computed round rewards"
        );

        let validators = accumulate(
            period,
            validators,
            &mut self.validator_totals,
            &mut self.by_validator,
        )?;
        let owners = accumulate(period, owners, &mut self.owner_totals, &mut self.by_owner)?;
        let recipients =
            accumulate(period, recipients, &mut self.recipient_totals, &mut self.by_recipient)?;

        let cumulative = CumulativeRewards {
            by_validator: self.validator_totals.cumulative_rewards(),
            by_owner: self.owner_totals.cumulative_rewards(),
            by_recipient: self.recipient_totals.cumulative_rewards(),
        };
        tracing::debug!(
            period = %period,
            validators = cumulative.by_validator.len(),
            owners = cumulative.by_owner.len(),
            recipients = cumulative.by_recipient.len(),
            "Updated cumulative rewards"
        );

        let index = self.rounds.len();
        self.rounds.push(RoundRewards { summary, validators, owners, recipients, cumulative });
        Ok(&self.rounds[index])
    }

    /// Finalize the totals of every processed round.
    pub fn finish(self) -> Result<RewardsReport, CalcError> {
        Ok(RewardsReport {
            total_by_validator: self.validator_totals.finalize()?,
            total_by_owner: self.owner_totals.finalize()?,
            total_by_recipient: self.recipient_totals.finalize()?,
            rounds: self.rounds,
            by_validator: self.by_validator,
            by_owner: self.by_owner,
            by_recipient: self.by_recipient,
        })
    }
}

/// Compute the rewards of every complete round of the plan, fetching participations from
/// `source` one round at a time.
pub fn compute_rewards<S: ParticipationSource>(
    plan: &Plan,
    performance: &PerformanceRange,
    source: &mut S,
) -> Result<RewardsReport, S::Error> {
    let rounds = plan.complete_rounds(performance)?;
    tracing::info!(
        rounds = rounds.len(),
        earliest_performance = %performance.earliest,
        latest_performance = %performance.latest,
        "Computing rewards"
    );

    let mut engine = RewardsEngine::new(plan);
    for round in rounds {
        let mechanics = plan.mechanics_at(round.period).map_err(CalcError::from)?;
        let participations = source.participations(round.period, mechanics)?;
        engine.process_round(round, participations)?;
    }
    Ok(engine.finish()?)
}

/// Attach the period to arithmetic errors, which do not carry it themselves.
fn in_round(period: Period, err: impl Into<CalcError>) -> CalcError {
    match err.into() {
        err @ (CalcError::Amount(_) | CalcError::Overflow(_)) => {
            CalcError::Round { period, source: Box::new(err) }
        }
        err => err,
    }
}

fn compute_rows<P: Participant>(
    period: Period,
    rows: Vec<P>,
    round_days: u64,
    daily_reward: U256,
    network_fee: U256,
) -> Result<Vec<(P, RewardOutcome)>, CalcError> {
    rows.into_iter()
        .map(|mut row| -> Result<(P, RewardOutcome), CalcError> {
            let inputs =
                RewardInputs::new(row.participation(), round_days, daily_reward, network_fee);
            let outcome = calculate_final_reward_and_fee(&inputs).map_err(|e| {
                CalcError::Entity {
                    period,
                    entity: format!("{} {}", P::KIND, row.key()),
                    source: Box::new(e),
                }
            })?;
            let participation = row.participation_mut();
            participation.reward = Amount::from_wei(outcome.reward)?;
            participation.fee_deduction = Amount::from_wei(outcome.fee_deduction)?;
            Ok((row, outcome))
        })
        .collect()
}

/// Every owner's active days must equal the sum of its validators' active days.
fn check_owner_active_days(
    period: Period,
    validators: &[(ValidatorParticipation, RewardOutcome)],
    owners: &[(OwnerParticipation, RewardOutcome)],
) -> Result<(), CalcError> {
    let mut validator_days: BTreeMap<Address, u64> = BTreeMap::new();
    for (validator, _) in validators {
        let days = validator_days.entry(validator.owner_address).or_default();
        *days = days
            .checked_add(validator.participation.active_days)
            .ok_or(CalcError::Overflow("owner active days"))?;
    }
    for (owner, _) in owners {
        let expected = validator_days.get(&owner.owner_address).copied().unwrap_or_default();
        if owner.participation.active_days != expected {
            return Err(CalcError::InconsistentActiveDays {
                period,
                owner: owner.owner_address.to_string(),
                owner_days: owner.participation.active_days,
                validator_days: expected,
            });
        }
    }
    Ok(())
}

/// The network fee collected from the given rows, as a participation of its own.
fn network_fee_row<P: Participant>(
    rows: &[(P, RewardOutcome)],
) -> Result<Option<(Participation, RewardOutcome)>, CalcError> {
    let mut fee = U256::ZERO;
    let mut participation = Participation::default();
    for (row, outcome) in rows.iter().filter(|(_, outcome)| !outcome.fee_deduction.is_zero()) {
        fee = fee.checked_add(outcome.fee_deduction).ok_or(CalcError::Overflow("network fee"))?;
        participation.active_days = participation
            .active_days
            .checked_add(row.participation().active_days)
            .ok_or(CalcError::Overflow("network fee days"))?;
        participation.registered_days = participation
            .registered_days
            .checked_add(row.participation().registered_days)
            .ok_or(CalcError::Overflow("network fee days"))?;
    }
    if fee.is_zero() {
        return Ok(None);
    }
    participation.reward = Amount::from_wei(fee)?;
    Ok(Some((participation, RewardOutcome { reward: fee, fee_deduction: U256::ZERO })))
}

fn accumulate<P: Participant>(
    period: Period,
    rows: Vec<(P, RewardOutcome)>,
    totals: &mut Totals<P>,
    by_period: &mut Vec<PeriodRow<P>>,
) -> Result<Vec<P>, CalcError> {
    let mut round_rows = Vec::with_capacity(rows.len());
    for (row, outcome) in rows {
        totals.merge(&row, outcome)?;
        by_period.push(PeriodRow { period, row: row.clone() });
        round_rows.push(row);
    }
    Ok(round_rows)
}
