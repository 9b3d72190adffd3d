use std::str::FromStr;

use ::cron::Schedule as CronSchedule;
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Parsed cron expression deciding when scheduled batches run (UTC).
#[derive(Debug, Clone)]
pub struct CheckinSchedule {
    expr: String,
    schedule: CronSchedule,
}

impl CheckinSchedule {
    pub fn parse(expr: &str) -> Result<Self> {
        let schedule = CronSchedule::from_str(expr)
            .map_err(|e| anyhow::anyhow!("Invalid cron expression '{}': {}", expr, e))?;
        Ok(Self {
            expr: expr.to_string(),
            schedule,
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(after).next()
    }

    /// The next `count` fire times after `from`. This is strictly a dry-run
    /// preview, not the execution loop.
    pub fn preview(&self, from: &DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        self.schedule.after(from).take(count).collect()
    }
}
