//! A polling, allocation free Ethernet/ARP/IPv4/ICMP/UDP stack for small
//! devices that exchange raw Ethernet frames with a MAC/PHY chip.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
extern crate byteorder;
#[cfg(feature = "std")]
extern crate libc;
#[macro_use]
extern crate log;

pub mod drivers;
pub mod net;

#[cfg(all(feature = "std", target_os = "linux"))]
pub mod linux;

use core::fmt::{
    Display,
    Formatter,
    Result as FmtResult,
};

use crate::net::dev::Error as DevError;
use crate::net::repr::Ipv4Address;

#[derive(Debug)]
pub enum Error {
    /// Indicates an error where a hardware address is not resolved yet. An ARP
    /// request may be in flight, so the operation can be retried later.
    MacResolution(Ipv4Address),
    /// Indicates an error where a buffer, device, etc. is full or empty.
    Exhausted,
    /// Indicates an error where a packet or frame is malformed.
    Malformed,
    /// Indicates an error where a checksum is invalid.
    Checksum,
    /// Indicates a well formed packet which is not meant for this interface.
    Ignored,
    /// Indicates an error reported by the hardware driver.
    Device(DevError),
}

impl From<DevError> for Error {
    fn from(err: DevError) -> Self {
        Error::Device(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match *self {
            Error::MacResolution(addr) => write!(f, "no hardware address for {} yet", addr),
            Error::Exhausted => write!(f, "buffer exhausted"),
            Error::Malformed => write!(f, "malformed packet"),
            Error::Checksum => write!(f, "invalid checksum"),
            Error::Ignored => write!(f, "packet ignored"),
            Error::Device(ref err) => write!(f, "device error: {:?}", err),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
