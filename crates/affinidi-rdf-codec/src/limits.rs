use crate::error::{RdfError, Result};

/// Shared nesting counter. Every nesting construct enters on the way in and
/// exits on the way out; a limit of zero disables the check.
#[derive(Clone, Copy, Debug, Default)]
pub struct DepthTracker {
    current: usize,
    max: usize,
}

impl DepthTracker {
    pub fn new(max: usize) -> Self {
        Self { current: 0, max }
    }

    pub fn enter(&mut self) -> Result<()> {
        self.current += 1;
        if self.max > 0 && self.current > self.max {
            self.current -= 1;
            return Err(RdfError::DepthExceeded { limit: self.max });
        }
        Ok(())
    }

    pub fn exit(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

/// Fail with [`RdfError::StatementTooLong`] when `len` exceeds a non-zero cap.
pub fn check_statement_len(len: usize, max: usize) -> Result<()> {
    if max > 0 && len > max {
        return Err(RdfError::StatementTooLong { limit: max });
    }
    Ok(())
}
