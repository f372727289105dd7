//! Suppression of native solver chatter on stdout
//!
//! CBC prints its progress log straight to the process stdout, which would interleave
//! with the diet report. The `gag` crate can redirect the stream, but only one gag per
//! stream may exist in a process at a time, so handles share a single instance through
//! a weak reference and the gag is lifted when the last handle is dropped.

use gag::Gag;
use std::sync::{Arc, Mutex, Weak};

/// Keeps stdout gagged while alive
pub struct StdoutGag {
    _gag: Arc<Gag>,
}

static SHARED_GAG: Mutex<Weak<Gag>> = Mutex::new(Weak::new());

impl StdoutGag {
    /// Acquire the shared stdout gag, creating it if no handle is alive
    pub fn acquire() -> std::io::Result<Self> {
        let mut shared = SHARED_GAG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(gag) = shared.upgrade() {
            return Ok(Self { _gag: gag });
        }

        let gag = Arc::new(Gag::stdout()?);
        *shared = Arc::downgrade(&gag);
        Ok(Self { _gag: gag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_share_one_gag() {
        let Ok(first) = StdoutGag::acquire() else {
            // stdout may already be redirected by the test harness
            return;
        };
        let second = StdoutGag::acquire().expect("second handle should reuse the gag");

        assert_eq!(Arc::as_ptr(&first._gag), Arc::as_ptr(&second._gag));
        assert_eq!(Arc::strong_count(&first._gag), 2);
    }
}
