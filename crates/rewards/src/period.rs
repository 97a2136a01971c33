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

//! Calendar-month reward periods.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PeriodError;

/// Format of a period in plans, file names and reports.
pub const PERIOD_FORMAT: &str = "%Y-%m";

/// A calendar month, in UTC. Ordered by calendar time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(NaiveDate);

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or(PeriodError::OutOfRange { year, month })
    }

    /// The period containing the given day.
    pub fn at(date: NaiveDate) -> Self {
        // Day 1 exists in every month that contains `date`.
        Self(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Last day of the period, inclusive.
    pub fn last_day(&self) -> NaiveDate {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Number of days in the period.
    pub fn days(&self) -> u32 {
        self.last_day().day()
    }

    /// The following period, if representable.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(PERIOD_FORMAT))
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s.split_once('-').ok_or_else(|| PeriodError::Invalid(s.to_string()))?;
        if month.contains(['-', 'T', ' ', ':']) {
            return Err(PeriodError::ExtraComponents(s.to_string()));
        }
        let year: i32 = year.parse().map_err(|_| PeriodError::Invalid(s.to_string()))?;
        let month: u32 = month.parse().map_err(|_| PeriodError::Invalid(s.to_string()))?;
        let period = Self::new(year, month).map_err(|_| PeriodError::Invalid(s.to_string()))?;
        // Reject anything that does not render back to the same text, e.g. "2024-3".
        if period.to_string() != s {
            return Err(PeriodError::Invalid(s.to_string()));
        }
        Ok(period)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
