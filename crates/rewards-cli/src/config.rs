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

//! Command line and environment configuration.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use ssv_rewards::{PerformanceRange, Plan};
use tracing_subscriber::filter::LevelFilter;

/// Common configuration options for all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalConfig {
    /// Log level (error, warn, info, debug, trace)
    #[clap(long, env = "LOG_LEVEL", global = true, default_value = "info")]
    pub log_level: LevelFilter,

    /// Whether to log in JSON format.
    #[clap(long, env = "LOG_JSON", global = true, default_value_t = false)]
    pub log_json: bool,

    /// Path to the rewards plan.
    #[clap(long, env = "REWARDS_PLAN", global = true, default_value = "rewards.yaml")]
    pub plan: PathBuf,
}

impl GlobalConfig {
    /// Load and validate the rewards plan.
    pub fn load_plan(&self) -> Result<Plan> {
        Plan::from_file(&self.plan)
            .with_context(|| format!("failed to load rewards plan {}", self.plan.display()))
    }
}

/// Configuration of the `calc` command
#[derive(Args, Debug, Clone)]
pub struct CalcConfig {
    /// Directory of participation data, with one `YYYY-MM` directory per round.
    #[clap(long, env = "PARTICIPATION_DIR")]
    pub data: Option<PathBuf>,

    /// Directory to write the rewards to. Replaced if it exists.
    #[clap(long, env = "REWARDS_DIR", default_value = "./rewards")]
    pub dir: PathBuf,

    /// First day with validator performance data (YYYY-MM-DD).
    #[clap(long, env = "EARLIEST_PERFORMANCE")]
    pub earliest_performance: Option<NaiveDate>,

    /// Last day with validator performance data (YYYY-MM-DD).
    #[clap(long, env = "LATEST_PERFORMANCE")]
    pub latest_performance: Option<NaiveDate>,
}

impl CalcConfig {
    /// Access [Self::data] or return an error that can be shown to the user.
    pub fn require_data(&self) -> Result<PathBuf> {
        self.data.clone().context(
            "Participation data not provided; please set --data or the PARTICIPATION_DIR env var",
        )
    }

    /// The range of available performance data, or an error that can be shown to the user.
    pub fn require_performance(&self) -> Result<PerformanceRange> {
        let earliest = self.earliest_performance.context(
            "Earliest performance day not provided; please set --earliest-performance or the \
             EARLIEST_PERFORMANCE env var",
        )?;
        let latest = self.latest_performance.context(
            "Latest performance day not provided; please set --latest-performance or the \
             LATEST_PERFORMANCE env var",
        )?;
        ensure!(
            earliest <= latest,
            "earliest performance day {earliest} is after latest performance day {latest}"
        );
        Ok(PerformanceRange { earliest, latest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(earliest: Option<&str>, latest: Option<&str>) -> CalcConfig {
        CalcConfig {
            data: None,
            dir: PathBuf::from("./rewards"),
            earliest_performance: earliest.map(|d| d.parse().unwrap()),
            latest_performance: latest.map(|d| d.parse().unwrap()),
        }
    }

    #[test]
    fn require_performance() {
        let range = calc(Some("2024-01-01"), Some("2024-02-29")).require_performance().unwrap();
        assert_eq!(range.latest, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let err = calc(None, Some("2024-02-29")).require_performance().unwrap_err();
        assert!(err.to_string().contains("--earliest-performance"), "{err}");
        assert!(calc(Some("2024-03-01"), Some("2024-02-29")).require_performance().is_err());
        assert!(calc(None, None).require_data().is_err());
    }
}
