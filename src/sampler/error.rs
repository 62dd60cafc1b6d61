use core::fmt;

/// Reason a luminosity measurement attempt was abandoned
///
/// None of these are fatal; the attempt yields NaN and the next periodic
/// trigger tries again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    SensorNotReady,
    /// No successful heartbeat read within the timeout
    TimeoutReadingHeartbeat,
    /// Heartbeat counter did not change within the timeout
    TimeoutWaitingHeartbeat,
    /// Luminosity counter did not reach the heartbeat's value in time
    TimeoutWaitingLuminosity,
    /// Luminosity counter jumped to a value outside the expected sequence
    LuminosityCntChangedUnexpectedly,
    FailedToBlankLed,
    GuardReadFailed,
    /// The guard channel had already converted when the LED went dark
    LuminosityChannelLate,
    RereadFailed,
    RereadCntChanged,
    RereadValChanged,
    FailedToReadLed,
    FailedToRestoreLed,
    /// Every direct read attempt failed
    DirectReadFailed,
}

impl SampleError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SensorNotReady => "SENSOR_NOT_READY",
            Self::TimeoutReadingHeartbeat => "TIMEOUT_READING_HEARTBEAT",
            Self::TimeoutWaitingHeartbeat => "TIMEOUT_WAITING_HEARTBEAT",
            Self::TimeoutWaitingLuminosity => "TIMEOUT_WAITING_LUMINOSITY",
            Self::LuminosityCntChangedUnexpectedly => "LUMINOSITY_CNT_CHANGED_UNEXPECTEDLY",
            Self::FailedToBlankLed => "FAILED_TO_BLANK_LED",
            Self::GuardReadFailed => "GUARD_READ_FAILED",
            Self::LuminosityChannelLate => "LUMINOSITY_CHANNEL_LATE",
            Self::RereadFailed => "REREAD_FAILED",
            Self::RereadCntChanged => "REREAD_CNT_CHANGED",
            Self::RereadValChanged => "REREAD_VAL_CHANGED",
            Self::FailedToReadLed => "FAILED_TO_READ_LED",
            Self::FailedToRestoreLed => "FAILED_TO_RESTORE_LED",
            Self::DirectReadFailed => "DIRECT_READ_FAILED",
        }
    }
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
