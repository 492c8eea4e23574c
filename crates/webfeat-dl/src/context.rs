//! Cancellation and deadline propagation for pipeline calls.
//!
//! A [`Context`] is cheap to clone and is threaded through every network
//! bound step. Clones share the same cancellation flag, so cancelling any
//! handle aborts every operation observing it.

use std::{
    io::{self, Read},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use thiserror::Error;

/// Why a [`Context`] stopped an operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("operation canceled")]
    Canceled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Clone, Debug, Default)]
pub struct Context {
    canceled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context that expires `timeout` from now.
    ///
    /// The derived context keeps the earlier of the two deadlines and shares
    /// the cancellation flag with `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use webfeat_dl::context::Context;
    ///
    /// let ctx = Context::background().with_timeout(Duration::from_secs(30));
    /// assert!(ctx.deadline().is_some());
    /// assert!(ctx.check().is_ok());
    /// ```
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };

        Self {
            canceled: Arc::clone(&self.canceled),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `Some(ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns the reason this context is done, if it is.
    pub fn err(&self) -> Option<ContextError> {
        if self.is_canceled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// A reader that fails with the context's error once it is done.
///
/// The error is wrapped in an [`io::Error`]; use [`context_error`] to get it
/// back out.
pub struct ContextReader<R> {
    inner: R,
    ctx: Context,
}

impl<R> ContextReader<R> {
    pub fn new(inner: R, ctx: Context) -> Self {
        Self { inner, ctx }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ContextReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = self.ctx.err() {
            return Err(io::Error::other(err));
        }
        self.inner.read(buf)
    }
}

/// Extracts a [`ContextError`] carried by an I/O error produced by a
/// [`ContextReader`].
pub fn context_error(err: &io::Error) -> Option<ContextError> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<ContextError>())
        .copied()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_background_is_never_done() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.remaining().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let ctx = Context::background();
        let child = ctx.with_timeout(Duration::from_secs(60));
        child.cancel();
        assert!(ctx.is_canceled());
        assert_eq!(ctx.check(), Err(ContextError::Canceled));
        assert_eq!(child.check(), Err(ContextError::Canceled));
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = Context::background().with_deadline(Instant::now());
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_child_keeps_earlier_deadline() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(3600));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn test_cancel_wins_over_deadline() {
        let ctx = Context::background().with_deadline(Instant::now());
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn test_context_reader_stops_after_cancel() {
        let ctx = Context::background();
        let mut reader = ContextReader::new(Cursor::new(b"abcdef".to_vec()), ctx.clone());

        let mut buf = [0u8; 3];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");

        ctx.cancel();
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(context_error(&err), Some(ContextError::Canceled));
    }

    #[test]
    fn test_context_error_ignores_plain_io_errors() {
        let err = io::Error::other("boom");
        assert_eq!(context_error(&err), None);
    }
}
