//! Mock UI implementation for testing.
//!
//! `MockUI` implements [`UserInterface`] and records every call for
//! later assertion. Output is unstyled.

use std::cell::RefCell;
use std::rc::Rc;

use super::{OutputMode, ShelterTheme, UserInterface};
use crate::image::ProgressSink;

/// Transfer events seen by the mock's progress sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Start { label: String, total: u64, position: u64 },
    Advance(u64),
    Finish,
}

struct RecordingProgress {
    label: String,
    events: Rc<RefCell<Vec<ProgressEvent>>>,
}

impl ProgressSink for RecordingProgress {
    fn start(&mut self, total: u64, position: u64) {
        self.events.borrow_mut().push(ProgressEvent::Start {
            label: self.label.clone(),
            total,
            position,
        });
    }

    fn advance(&mut self, bytes: u64) {
        self.events.borrow_mut().push(ProgressEvent::Advance(bytes));
    }

    fn finish(&mut self) {
        self.events.borrow_mut().push(ProgressEvent::Finish);
    }
}

/// Mock UI implementation for testing.
#[derive(Debug)]
pub struct MockUI {
    mode: OutputMode,
    theme: ShelterTheme,
    messages: Vec<String>,
    outputs: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    progress: Rc<RefCell<Vec<ProgressEvent>>>,
}

impl Default for MockUI {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::with_mode(OutputMode::Normal)
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            theme: ShelterTheme::plain(),
            messages: Vec::new(),
            outputs: Vec::new(),
            successes: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            headers: Vec::new(),
            progress: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Command output lines, tables included.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Progress events of every transfer so far.
    pub fn progress_events(&self) -> Vec<ProgressEvent> {
        self.progress.borrow().clone()
    }

    /// Whether any captured line contains `needle`.
    pub fn has_text(&self, needle: &str) -> bool {
        [
            &self.messages,
            &self.outputs,
            &self.successes,
            &self.warnings,
            &self.errors,
            &self.headers,
        ]
        .iter()
        .any(|lines| lines.iter().any(|l| l.contains(needle)))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn theme(&self) -> &ShelterTheme {
        &self.theme
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn output(&mut self, text: &str) {
        self.outputs.push(text.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn download_progress(&mut self, label: &str) -> Box<dyn ProgressSink> {
        Box::new(RecordingProgress {
            label: label.to_string(),
            events: Rc::clone(&self.progress),
        })
    }
}
