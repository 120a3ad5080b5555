//! Terminal output.
//!
//! Commands talk to the user through the [`UserInterface`] trait so they
//! can be exercised against [`MockUI`] in tests.
//!
//! # Example
//!
//! ```
//! use shelter::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.success("Installed casa-dev-5.0.sif");
//! assert_eq!(ui.successes(), ["Installed casa-dev-5.0.sif"]);
//! ```

pub mod mock;
pub mod output;
pub mod progress;
pub mod table;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use output::OutputMode;
pub use progress::DownloadProgress;
pub use table::Table;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, ShelterTheme};

use crate::image::ProgressSink;

/// Trait for user interface interactions.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Theme used to style output.
    fn theme(&self) -> &ShelterTheme;

    /// Print a status line, hidden in quiet mode.
    fn message(&mut self, msg: &str);

    /// Print a command result, shown in every mode.
    fn output(&mut self, text: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Show a header line.
    fn show_header(&mut self, title: &str);

    /// Print a table as command output.
    fn show_table(&mut self, table: &Table) {
        for line in table.lines() {
            self.output(&line);
        }
    }

    /// Progress sink for a transfer labelled `label`.
    fn download_progress(&mut self, label: &str) -> Box<dyn ProgressSink>;
}
