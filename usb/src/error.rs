use crate::endpoint::Direction;

/// A declared interface or endpoint does not exist on the connected device.
///
/// Signals a firmware/driver mismatch and is fatal for the session.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("unable to read device descriptors: {0}")]
    Descriptors(rusb::Error),

    #[error("device has no interface {interface}")]
    MissingInterface { interface: u8 },

    #[error("interface {interface} has no {direction} endpoint at index {endpoint}")]
    MissingEndpoint {
        interface: u8,
        endpoint: u8,
        direction: Direction,
    },
}

/// Fatal session errors. Any of these terminates the session; recovery means
/// tearing down and bringing the device up again from scratch.
#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("unable to claim interface {interface}: {source}")]
    ClaimFailed { interface: u8, source: rusb::Error },

    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),

    #[error("short write: {sent} of {expected} bytes sent")]
    ShortWrite { expected: usize, sent: usize },

    #[error("device session is not ready")]
    NotReady,

    #[error("device session was already initialized")]
    AlreadyInitialized,
}

/// A decoded field held a value outside its defined domain.
///
/// Non-fatal: the offending report is dropped and the prior chat-mix state
/// and status snapshot are kept. Values are never coerced or clamped.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("inactivity timeout code {0:#04x} outside 0..=6")]
    InactivityCode(u8),

    #[error("mix value {value} at offset {offset} exceeds 100")]
    MixValue { offset: usize, value: u8 },
}

/// A rejected settings mutation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingError {
    #[error("unknown setting {0:?}")]
    UnknownKey(String),

    #[error("{key} expects a {expected} value")]
    WrongKind {
        key: &'static str,
        expected: &'static str,
    },

    #[error("value {value:#04x} outside {min:#04x}..={max:#04x} for {key}")]
    OutOfRange {
        key: &'static str,
        value: u8,
        min: u8,
        max: u8,
    },

    #[error("no mutation command has been captured for {0}")]
    Unmapped(&'static str),
}
