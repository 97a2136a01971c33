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

//! Participation data exported by the data layer, one directory per round.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use ssv_rewards::{Feature, Mechanics, ParticipationSource, Period, RoundParticipations};

pub const VALIDATORS_FILE: &str = "validators.json";
pub const OWNERS_FILE: &str = "owners.json";
pub const RECIPIENTS_FILE: &str = "recipients.json";

/// Reads `<dir>/<YYYY-MM>/{validators,owners,recipients}.json`.
pub struct FileParticipationSource {
    dir: PathBuf,
}

impl FileParticipationSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ParticipationSource for FileParticipationSource {
    type Error = anyhow::Error;

    fn participations(
        &mut self,
        period: Period,
        mechanics: &Mechanics,
    ) -> Result<RoundParticipations> {
        let dir = self.dir.join(period.to_string());
        let mut data = RoundParticipations {
            validators: read_rows(&dir.join(VALIDATORS_FILE))?,
            owners: read_rows(&dir.join(OWNERS_FILE))?,
            recipients: read_rows(&dir.join(RECIPIENTS_FILE))?,
        };

        // Safe deployers are not rewarded.
        if mechanics.feature_enabled(Feature::GnosisSafe) {
            let before = data.recipients.len();
            data.recipients.retain(|recipient| !recipient.is_deployer);
            tracing::debug!(
                period = %period,
                excluded = before - data.recipients.len(),
                "Excluded Gnosis Safe deployers"
            );
        }

        tracing::info!(
            period = %period,
            validators = data.validators.len(),
            owners = data.owners.len(),
            recipients = data.recipients.len(),
            "Loaded participations"
        );
        Ok(data)
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to decode {}", path.display()))
}
