/// Recorder state machine.
///
/// State transitions:
/// ```text
/// idle → recording → stopping → idle
/// ```
///
/// `Stopping` covers the window between the liveness flag being cleared and
/// the capture worker finishing its backpatch and closing the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
    Stopping,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::Stopping)
    }

    /// A session exists in every state except `Idle`.
    pub fn has_session(&self) -> bool {
        !self.is_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_exists_only_outside_idle() {
        assert!(!CaptureState::Idle.has_session());
        assert!(CaptureState::Recording.has_session());
        assert!(CaptureState::Stopping.has_session());
    }
}
