use strum_macros::Display;

/// Phases of a drop session. Transitions only move forward; `Complete` and
/// `Aborted` are terminal.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DropPhase {
    AwaitingTrigger,
    Activating,
    Holding,
    Deactivating,
    Complete,
    Aborted,
}

impl DropPhase {
    pub fn is_terminal(self) -> bool { matches!(self, DropPhase::Complete | DropPhase::Aborted) }

    /// The regular successor, `None` for terminal phases.
    pub fn successor(self) -> Option<DropPhase> {
        match self {
            DropPhase::AwaitingTrigger => Some(DropPhase::Activating),
            DropPhase::Activating => Some(DropPhase::Holding),
            DropPhase::Holding => Some(DropPhase::Deactivating),
            DropPhase::Deactivating => Some(DropPhase::Complete),
            DropPhase::Complete | DropPhase::Aborted => None,
        }
    }

    pub fn can_transition_to(self, next: DropPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == DropPhase::Aborted || self.successor() == Some(next)
    }

    /// Relay state a command may request in this phase, if any.
    pub fn command_window(self) -> Option<bool> {
        match self {
            DropPhase::Activating => Some(true),
            DropPhase::Deactivating => Some(false),
            _ => None,
        }
    }
}
