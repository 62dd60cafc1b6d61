//! Light-sensor sample types and channel layout.

use core::fmt;

/// 4-bit wrapping sequence number attached to every channel sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleCounter(u8);

impl SampleCounter {
    pub const MODULUS: u8 = 16;

    pub const fn new(value: u8) -> Self {
        Self(value & (Self::MODULUS - 1))
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self::new(self.0.wrapping_add(1))
    }

    pub const fn prev(self) -> Self {
        Self::new(self.0.wrapping_add(Self::MODULUS - 1))
    }
}

impl fmt::Display for SampleCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One reading of a sensor channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSample {
    pub value: f32,
    pub counter: SampleCounter,
}

impl ChannelSample {
    pub const fn new(value: f32, counter: u8) -> Self {
        Self {
            value,
            counter: SampleCounter::new(counter),
        }
    }
}

/// Shared bus clock selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusSpeed {
    Normal,
    Fast,
}

/// Slots between the heartbeat and the guard channel in a round
pub const GUARD_SLOT_OFFSET: u8 = 1;

/// Slots between the heartbeat and the luminosity channel in a round
pub const LUMINOSITY_SLOT_OFFSET: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// A channel id is outside the sensor's round
    ChannelOutOfRange,
    /// Guard or luminosity channel is not at its fixed slot after the heartbeat
    UnexpectedOrder,
}

impl LayoutError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelOutOfRange => "CHANNEL_OUT_OF_RANGE",
            Self::UnexpectedOrder => "UNEXPECTED_CHANNEL_ORDER",
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which sensor channels the sampler synchronizes on.
///
/// The sensor converts its channels round-robin and every channel of a round
/// reports the same counter. The sampler relies on the guard channel
/// converting in the slot right after the heartbeat, and the luminosity
/// channel right after the guard. Both may wrap into the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    /// Channel whose counter edge marks the round boundary
    pub heartbeat: u8,
    /// Channel converting immediately before the luminosity channel
    pub guard: u8,
    /// Channel of interest
    pub luminosity: u8,
}

impl ChannelLayout {
    /// Red, green, blue and clear light channels in conversion order
    pub const RGBL: Self = Self {
        heartbeat: 1,
        guard: 2,
        luminosity: 3,
    };

    /// Check the layout against a sensor converting `channels_per_round` channels
    pub const fn validate(&self, channels_per_round: u8) -> Result<(), LayoutError> {
        if channels_per_round == 0
            || self.heartbeat >= channels_per_round
            || self.guard >= channels_per_round
            || self.luminosity >= channels_per_round
        {
            return Err(LayoutError::ChannelOutOfRange);
        }
        let guard = (self.heartbeat + GUARD_SLOT_OFFSET) % channels_per_round;
        let luminosity = (self.heartbeat + LUMINOSITY_SLOT_OFFSET) % channels_per_round;
        if guard != self.guard || luminosity != self.luminosity {
            return Err(LayoutError::UnexpectedOrder);
        }
        Ok(())
    }

    /// Counter the guard channel reports until it converts after the
    /// heartbeat edge carrying `edge`.
    ///
    /// A guard slot past the end of the round converts in the next round,
    /// so until then it still shows the edge's round.
    pub const fn guard_counter_before(&self, edge: SampleCounter) -> SampleCounter {
        if self.guard < self.heartbeat {
            edge
        } else {
            edge.prev()
        }
    }

    /// Counter of the luminosity sample converted in the slot after the guard
    pub const fn luminosity_counter(&self, edge: SampleCounter) -> SampleCounter {
        if self.luminosity < self.heartbeat {
            edge.next()
        } else {
            edge
        }
    }
}

impl Default for ChannelLayout {
    fn default() -> Self {
        Self::RGBL
    }
}
