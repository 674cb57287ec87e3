// src/tasks/sleep.rs

use crate::core::{attributes::Attributes, registry::Executable};
use anyhow::Result;
use std::time::Duration;

/// Pauses the build.
#[derive(Debug, Default)]
pub struct Sleep {
    duration: Duration,
}

impl Executable for Sleep {
    fn configure(&mut self, attributes: &Attributes) -> Result<()> {
        attributes.check_known("sleep", &["seconds", "milliseconds"])?;
        let seconds = attributes.get_u64("seconds")?.unwrap_or(0);
        let millis = attributes.get_u64("milliseconds")?.unwrap_or(0);
        self.duration = Duration::from_secs(seconds) + Duration::from_millis(millis);
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        log::debug!("Sleeping for {:?}", self.duration);
        std::thread::sleep(self.duration);
        Ok(())
    }
}
