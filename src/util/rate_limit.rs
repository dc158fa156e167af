//! Inbound message throttling for socket readers

use std::num::NonZeroU32;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};

/// Token bucket over one connection's inbound frames
pub struct InputThrottle {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    dropped: u64,
}

impl InputThrottle {
    /// Allow `per_second` frames with an equal burst; zero is treated as one
    pub fn per_second(per_second: u32) -> Self {
        let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_second(rate)),
            dropped: 0,
        }
    }

    /// True if the frame may be processed; refused frames are counted
    pub fn admit(&mut self) -> bool {
        if self.limiter.check().is_ok() {
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    /// Frames refused so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
