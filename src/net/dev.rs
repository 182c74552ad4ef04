//! Contracts between the stack and the hardware it runs on.
//!
//! The stack consumes a `Driver`, which moves whole Ethernet frames in and out
//! of a MAC/PHY. Chips attached over SPI and the like implement `Driver` on top
//! of a `Bus`, which the stack itself never touches.

use crate::net::repr::EthernetAddress;

#[derive(Debug)]
pub enum Error {
    /// Indicates a situation with no frame waiting to be received.
    Nothing,
    /// Indicates the device cannot accept a frame right now.
    Busy,
    /// Indicates an error where a buffer was not large enough.
    Overflow,
    /// Indicates the device did not respond as expected over the bus.
    Bus,
    /// Indicates the device is not the chip the driver expects.
    Unsupported,
    /// Indicates a generic IO error.
    #[cfg(feature = "std")]
    IO(std::io::Error),
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IO(err)
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// A driver for sending and receiving raw Ethernet frames.
///
/// The driver struct owns any driver private state, so an interface bound to
/// a driver is the only user of that device.
pub trait Driver {
    /// Brings the device up with the specified hardware address.
    fn init(&mut self, ethernet_addr: EthernetAddress) -> Result<()>;

    /// Writes a frame to the device and returns the number of bytes sent.
    fn transmit(&mut self, frame: &[u8]) -> Result<usize>;

    /// Reads at most one waiting frame into the buffer and returns the size of
    /// the frame, or 0 if no frame is waiting. You should ensure that the buffer
    /// has at least MAX_FRAME_LEN bytes to avoid errors.
    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Checks if the physical link is up.
    fn link_up(&mut self) -> bool;
}

/// A byte oriented serial bus with chip select framing, such as SPI.
///
/// All operations are synchronous and complete in a bounded number of byte
/// transfer cycles.
pub trait Bus {
    /// Starts a transaction, e.g. drives the chip select line low.
    fn begin(&mut self);

    /// Ends a transaction, e.g. drives the chip select line high.
    fn end(&mut self);

    /// Writes a byte and returns the byte read back in the same cycle.
    fn transfer(&mut self, byte: u8) -> u8;
}
