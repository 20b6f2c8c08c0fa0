use std::io::{self, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::catalog::{ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Spinner, bar, percentage, current uuid and elapsed time on stderr.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner} {prefix:.cyan} [{bar:30}] {percent:>3}% {msg:.blue} [{elapsed_precise}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
        bar.set_prefix("Processing datasets...");
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { total } => {
                self.bar.set_length(total as u64);
                self.bar.enable_steady_tick(Duration::from_millis(100));
            }
            ProgressEvent::Processing {
                uuid, completed, ..
            } => {
                self.bar.set_position(completed as u64);
                self.bar.set_message(uuid.to_string());
            }
            ProgressEvent::Skipped { uuid, reason } => {
                self.bar.println(format!("skipped {uuid}: {reason}"));
            }
            ProgressEvent::Failed { uuid, message } => {
                self.bar.println(format!("failed {uuid}: {message}"));
            }
            ProgressEvent::Finished { summary } => {
                self.bar.set_position(summary.total as u64);
                self.bar.finish_with_message(format!(
                    "{} of {} datasets catalogued",
                    summary.added, summary.total
                ));
            }
        }
    }
}
