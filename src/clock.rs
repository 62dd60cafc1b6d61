use embassy_time::Instant;

/// Monotonic time source used for sub-millisecond scheduling.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Busy-wait until `deadline`.
    ///
    /// Never yields to a scheduler: the sampler's blanking deadline has to be
    /// hit within a few ticks. Callers bound the wait to one sensor conversion.
    fn spin_until(&self, deadline: Instant) {
        while self.now() < deadline {
            core::hint::spin_loop();
        }
    }
}

/// [`Clock`] backed by the embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn spin_until(&self, deadline: Instant) {
        (**self).spin_until(deadline);
    }
}
