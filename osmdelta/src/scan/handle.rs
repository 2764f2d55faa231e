//! Handle to a running scan.

use tokio_util::sync::CancellationToken;

/// Handle to a running scan loop.
///
/// Cancellation is cooperative: the loop checks the token only between
/// cycles, so the in-flight cycle always finishes and delivers its records
/// before the loop stops.
pub struct ScanHandle {
    cancellation: CancellationToken,
}

impl ScanHandle {
    pub(super) fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    /// Request the scan to stop after the current cycle.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Get the cancellation token.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_cancellation() {
        let handle = ScanHandle::new(CancellationToken::new());

        assert!(!handle.is_cancelled());
        handle.cancel();
        assert!(handle.is_cancelled());
    }
}
