//! Download progress bars.

use indicatif::{ProgressBar, ProgressStyle};

use crate::image::ProgressSink;

const TEMPLATE: &str =
    "{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {binary_bytes_per_sec} eta {eta}";

/// Byte progress of one transfer, drawn on stderr.
pub struct DownloadProgress {
    label: String,
    visible: bool,
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            visible: true,
            bar: None,
        }
    }

    /// A progress sink that draws nothing.
    pub fn hidden() -> Self {
        Self {
            label: String::new(),
            visible: false,
            bar: None,
        }
    }

    /// Bytes counted so far, including the resumed prefix.
    pub fn position(&self) -> u64 {
        self.bar.as_ref().map(ProgressBar::position).unwrap_or(0)
    }
}

impl ProgressSink for DownloadProgress {
    fn start(&mut self, total: u64, position: u64) {
        let bar = if self.visible {
            ProgressBar::new(total)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(self.label.clone());
        bar.set_position(position);
        self.bar = Some(bar);
    }

    fn advance(&mut self, bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = &self.bar {
            bar.finish();
        }
    }
}
