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

//! JSON export of a rewards report.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::Serialize;
use ssv_rewards::{Plan, RewardsReport};

/// Write the report to `dest`, replacing any previous contents once every file is written.
pub fn write_report(
    dest: &Path,
    plan_path: &Path,
    plan: &Plan,
    report: &RewardsReport,
) -> Result<()> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory {}", parent.display()))?;
    let tmp = tempfile::Builder::new()
        .prefix(".rewards-")
        .tempdir_in(parent)
        .with_context(|| format!("failed to create temporary directory in {}", parent.display()))?;
    let root = tmp.path();

    let inputs = root.join("inputs");
    fs::create_dir_all(&inputs)?;
    fs::copy(plan_path, inputs.join("rewards.yaml"))
        .with_context(|| format!("failed to copy {}", plan_path.display()))?;
    write_json(&inputs.join("rewards.json"), plan)?;

    for round in &report.rounds {
        let dir = root.join(round.summary.period.to_string());
        fs::create_dir_all(&dir)?;
        write_json(&dir.join("summary.json"), &round.summary)?;
        write_json(&dir.join("by-validator.json"), &round.validators)?;
        write_json(&dir.join("by-owner.json"), &round.owners)?;
        write_json(&dir.join("by-recipient.json"), &round.recipients)?;

        // Merkle distribution input: recipient to cumulative wei.
        let cumulative: BTreeMap<String, String> = round
            .cumulative
            .by_recipient
            .iter()
            .map(|(recipient, wei)| (recipient.to_string(), wei.to_string()))
            .collect();
        write_json(&dir.join("cumulative.json"), &cumulative)?;
    }

    write_json(&root.join("by-validator.json"), &report.by_validator)?;
    write_json(&root.join("by-owner.json"), &report.by_owner)?;
    write_json(&root.join("by-recipient.json"), &report.by_recipient)?;
    write_json(
        &root.join("total-by-validator.json"),
        &report.total_by_validator.values().collect::<Vec<_>>(),
    )?;
    write_json(
        &root.join("total-by-owner.json"),
        &report.total_by_owner.values().collect::<Vec<_>>(),
    )?;
    write_json(
        &root.join("total-by-recipient.json"),
        &report.total_by_recipient.values().collect::<Vec<_>>(),
    )?;

    if dest.exists() {
        fs::remove_dir_all(dest)
            .with_context(|| format!("failed to remove previous {}", dest.display()))?;
    }
    fs::rename(root, dest)
        .with_context(|| format!("failed to move rewards to {}", dest.display()))?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer.flush().with_context(|| format!("failed to write {}", path.display()))
}
