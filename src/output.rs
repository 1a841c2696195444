// ABOUTME: Leveled CLI feedback shared by every pipeline step.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with labeled progress messages
    Normal,
    /// Minimal output for CI (warnings, errors and the final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn label(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Success => "SUCCESS",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

/// Handles CLI output based on the configured mode.
#[derive(Debug)]
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing the run.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Progress message (suppressed in quiet mode).
    pub fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    /// A step or the whole run finished.
    pub fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    pub fn warning(&self, message: &str) {
        self.emit(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    /// Multi-line block such as a pod listing or a log tail, printed verbatim.
    /// Quiet mode drops blocks entirely.
    pub fn block(&self, title: &str, body: &str) {
        if !self.shows_blocks() {
            return;
        }
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                println!("{title}");
                for line in body.lines() {
                    println!("    {line}");
                }
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: Level::Info,
                    message: title,
                    body: Some(body),
                    duration_secs: None,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    fn shows_blocks(&self) -> bool {
        self.mode != OutputMode::Quiet
    }

    fn emit(&self, level: Level, message: &str) {
        match self.mode {
            OutputMode::Normal => match level {
                Level::Success => {
                    let elapsed = self.elapsed_secs();
                    if elapsed > 0.0 {
                        println!("[{}] {message} ({:.1}s)", level.label(), elapsed);
                    } else {
                        println!("[{}] {message}", level.label());
                    }
                }
                Level::Info => println!("[{}] {message}", level.label()),
                Level::Warning | Level::Error => eprintln!("[{}] {message}", level.label()),
            },
            OutputMode::Quiet => match level {
                Level::Info => {}
                Level::Success => println!("{message}"),
                Level::Warning => eprintln!("Warning: {message}"),
                Level::Error => eprintln!("Error: {message}"),
            },
            OutputMode::Json => {
                let event = JsonEvent {
                    event: level,
                    message,
                    body: None,
                    duration_secs: if self.start_time.is_some() {
                        Some(self.elapsed_secs())
                    } else {
                        None
                    },
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    match level {
                        Level::Error => eprintln!("{json}"),
                        _ => println!("{json}"),
                    }
                }
            }
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: Level,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_event_shape() {
        let event = JsonEvent {
            event: Level::Warning,
            message: "namespace already exists",
            body: None,
            duration_secs: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"warning","message":"namespace already exists"}"#
        );
    }

    #[test]
    fn timer_starts_at_zero() {
        let mut output = Output::new(OutputMode::Quiet);
        assert_eq!(output.elapsed_secs(), 0.0);
        output.start_timer();
        assert!(output.elapsed_secs() >= 0.0);
    }

    #[test]
    fn quiet_mode_hides_blocks() {
        assert!(!Output::new(OutputMode::Quiet).shows_blocks());
        assert!(Output::new(OutputMode::Normal).shows_blocks());
        assert!(Output::new(OutputMode::Json).shows_blocks());
    }
}
