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

use anyhow::Result;
use clap::{Parser, Subcommand};
use ssv_rewards::compute_rewards;
use tracing_subscriber::EnvFilter;

mod config;
mod output;
mod source;

use config::{CalcConfig, GlobalConfig};
use source::FileParticipationSource;

/// Arguments of the rewards calculator.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct MainArgs {
    #[clap(flatten)]
    config: GlobalConfig,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the rewards of every complete round of the plan.
    Calc(CalcConfig),
    /// Validate the rewards plan and print it as JSON.
    Validate,
}

fn main() -> Result<()> {
    let args = MainArgs::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(args.config.log_level.into())
        .from_env_lossy();
    if args.config.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }

    // NOTE: Using a separate `run` function to facilitate testing below.
    if let Err(e) = run(&args) {
        tracing::error!("FATAL: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run(args: &MainArgs) -> Result<()> {
    match &args.command {
        Command::Calc(calc) => {
            let plan = args.config.load_plan()?;
            let performance = calc.require_performance()?;
            let mut source = FileParticipationSource::new(calc.require_data()?);

            let report = compute_rewards(&plan, &performance, &mut source)?;
            output::write_report(&calc.dir, &args.config.plan, &plan, &report)?;
            tracing::info!(
                rounds = report.rounds.len(),
                recipients = report.total_by_recipient.len(),
                dir = %calc.dir.display(),
                "Wrote rewards"
            );
        }
        Command::Validate => {
            let plan = args.config.load_plan()?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
            tracing::info!(plan = %args.config.plan.display(), "Rewards plan is valid");
        }
    }
    Ok(())
}
