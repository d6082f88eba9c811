use std::fmt;

/// Transfer direction of an endpoint, seen from the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// Position of an endpoint within a device's descriptor table.
///
/// `interface` and `endpoint` are indexes, not wire addresses. The concrete
/// `bEndpointAddress` is looked up against the live device by the transport;
/// the lookup fails if no endpoint with the requested direction exists at
/// that position (firmware/driver mismatch). Once resolved, an address is
/// stable for the rest of the session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EndpointAddress {
    pub interface: u8,
    pub endpoint: u8,
    pub direction: Direction,
}

impl EndpointAddress {
    pub const fn new(interface: u8, endpoint: u8, direction: Direction) -> Self {
        Self {
            interface,
            endpoint,
            direction,
        }
    }

    pub const fn input(interface: u8, endpoint: u8) -> Self {
        Self::new(interface, endpoint, Direction::In)
    }

    pub const fn output(interface: u8, endpoint: u8) -> Self {
        Self::new(interface, endpoint, Direction::Out)
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.interface, self.endpoint, self.direction)
    }
}
