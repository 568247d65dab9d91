//! Current-auditor holder.

/// Identifier of the acting user stamped onto created/modified records.
pub type AuditorId = String;

/// Source of the acting user at the moment a record is written.
pub trait AuditorAware {
    /// Returns the current auditor, or `None` when nobody is acting.
    fn current_auditor(&self) -> Option<AuditorId>;
}

/// Mutable holder for the current auditor.
///
/// Starts unset. Mutation requires `&mut self`, so a tracker shared across
/// threads must be wrapped by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditorTracker {
    current: Option<AuditorId>,
}

impl AuditorTracker {
    /// Creates a tracker with no auditor set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker already acting as `auditor`.
    pub fn acting_as(auditor: impl Into<AuditorId>) -> Self {
        Self {
            current: Some(auditor.into()),
        }
    }

    /// Replaces the held auditor unconditionally. No validation is applied.
    pub fn set_current_auditor(&mut self, auditor: impl Into<AuditorId>) {
        self.current = Some(auditor.into());
    }

    /// Resets the tracker to the unset state.
    pub fn clear_current_auditor(&mut self) {
        self.current = None;
    }

    /// Borrowed view of the held auditor.
    pub fn auditor(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl AuditorAware for AuditorTracker {
    fn current_auditor(&self) -> Option<AuditorId> {
        self.current.clone()
    }
}
