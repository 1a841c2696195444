// ABOUTME: Diagnostics accumulator for non-fatal warnings during a run.
// ABOUTME: Collects problems that must not fail the deployment but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The source revision label could not be determined.
    pub fn revision_unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RevisionUnavailable,
            message: message.into(),
        }
    }

    /// Push was requested but there was no freshly built image to push.
    pub fn push_skipped(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::PushSkipped,
            message: message.into(),
        }
    }

    /// The final status listing could not be fetched.
    pub fn status_unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::StatusUnavailable,
            message: message.into(),
        }
    }

    /// Target logs could not be fetched after a health failure.
    pub fn logs_unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::LogsUnavailable,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// `git rev-parse` failed; the image is labeled with `unknown`.
    RevisionUnavailable,
    /// `--push` without a build.
    PushSkipped,
    /// Pod or container listing failed.
    StatusUnavailable,
    /// Diagnostic log tail failed.
    LogsUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::revision_unavailable("not a git repository"));
        diag.warn(Warning::status_unavailable("kubectl get pods failed"));

        assert_eq!(diag.warnings().len(), 2);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(
            Warning::revision_unavailable("x").kind,
            WarningKind::RevisionUnavailable
        );
        assert_eq!(Warning::push_skipped("x").kind, WarningKind::PushSkipped);
        assert_eq!(
            Warning::status_unavailable("x").kind,
            WarningKind::StatusUnavailable
        );
        assert_eq!(
            Warning::logs_unavailable("x").kind,
            WarningKind::LogsUnavailable
        );
    }
}
