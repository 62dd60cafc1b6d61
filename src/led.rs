//! Exclusive access to the LED driver chip.
//!
//! The dimming engine, the luminosity sampler and diagnostic callers all go
//! through [`SharedLed::lock`], so multi-register writes are never interleaved.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::LedDriver;
use crate::color::{BLACK, Currents, Pwms};

/// Currents and PWMs for all three channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedOutput {
    pub currents: Currents,
    pub pwms: Pwms,
}

impl LedOutput {
    pub const OFF: Self = Self {
        currents: BLACK,
        pwms: BLACK,
    };

    pub const fn is_off(&self) -> bool {
        (self.pwms.r == 0 || self.currents.r == 0)
            && (self.pwms.g == 0 || self.currents.g == 0)
            && (self.pwms.b == 0 || self.currents.b == 0)
    }
}

/// Driver state visible while the lock is held
pub struct LedLink<D> {
    driver: D,
    last: LedOutput,
    disable_depth: u8,
}

impl<D: LedDriver> LedLink<D> {
    /// Write an output and remember it as the current state
    pub fn write(&mut self, output: LedOutput) -> Result<(), D::Error> {
        self.driver.write_raw(output.currents, output.pwms)?;
        self.last = output;
        Ok(())
    }

    /// Write only while output is enabled; returns whether a write happened
    pub fn write_if_enabled(&mut self, output: LedOutput) -> Result<bool, D::Error> {
        if self.disable_depth > 0 {
            return Ok(false);
        }
        self.write(output).map(|()| true)
    }

    /// Drive every channel dark without forgetting the last output
    pub fn blank(&mut self) -> Result<(), D::Error> {
        self.driver.write_raw(BLACK, BLACK)
    }

    /// Write the remembered currents together with the given PWMs
    pub fn restore(&mut self, pwms: Pwms) -> Result<(), D::Error> {
        self.driver.write_raw(self.last.currents, pwms)
    }

    pub fn read_pwms(&mut self) -> Result<Pwms, D::Error> {
        self.driver.read_raw()
    }

    /// Last output written through [`LedLink::write`]
    pub const fn last_output(&self) -> LedOutput {
        self.last
    }

    pub const fn is_output_enabled(&self) -> bool {
        self.disable_depth == 0
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }
}

/// LED driver behind a blocking mutex
pub struct SharedLed<M: RawMutex, D> {
    inner: Mutex<M, RefCell<LedLink<D>>>,
}

impl<M: RawMutex, D: LedDriver> SharedLed<M, D> {
    pub const fn new(driver: D) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(LedLink {
                driver,
                last: LedOutput::OFF,
                disable_depth: 0,
            })),
        }
    }

    /// Run `f` with exclusive access to the driver
    pub fn lock<R>(&self, f: impl FnOnce(&mut LedLink<D>) -> R) -> R {
        self.inner.lock(|link| f(&mut link.borrow_mut()))
    }

    /// Raw write for diagnostic callers
    pub fn write_raw(&self, currents: Currents, pwms: Pwms) -> Result<(), D::Error> {
        self.lock(|link| link.write(LedOutput { currents, pwms }))
    }

    /// Suppress or re-allow periodic output.
    ///
    /// Calls nest: output resumes once every disable has been matched by an
    /// enable.
    pub fn set_output_enabled(&self, enabled: bool) {
        self.lock(|link| {
            link.disable_depth = if enabled {
                link.disable_depth.saturating_sub(1)
            } else {
                link.disable_depth.saturating_add(1)
            };
        });
    }

    pub fn last_output(&self) -> LedOutput {
        self.lock(|link| link.last_output())
    }

    pub fn is_ready(&self) -> bool {
        self.lock(|link| link.driver.is_ready())
    }

    pub fn health_check_and_reinit(&self) -> bool {
        self.lock(|link| link.driver.health_check_and_reinit())
    }
}
