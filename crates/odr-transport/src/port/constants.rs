//! Port table constants.

/// Well-known port of the time service.
pub const TIME_SERVER_PORT: u32 = 14508;

/// Number of ports in the ephemeral range above the well-known port.
pub const EPHEMERAL_PORT_SPAN: u32 = 2000;

/// Default ephemeral entry time-to-live (seconds).
pub const DEFAULT_PORT_TTL: u64 = 300;

/// Default IPC path of the time service.
pub const DEFAULT_TIME_SERVER_PATH: &str = "/tmp/14508-61375-timeServer";
