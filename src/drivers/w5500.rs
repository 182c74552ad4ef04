//! Driver for the WIZnet W5500 in MACRAW mode.
//!
//! The W5500 exposes its registers and socket buffers as blocks of memory
//! behind SPI. Socket 0 is opened in MACRAW mode and given the whole 16KB of
//! TX and RX buffer memory, turning the chip into a plain Ethernet MAC/PHY.
//!
//! [W5500 datasheet](https://docs.wiznet.io/img/products/w5500/W5500_ds_v110e.pdf)

use byteorder::{
    ByteOrder,
    NetworkEndian,
};

use crate::net::dev::{
    Bus,
    Driver,
    Error,
    Result,
};
use crate::net::repr::EthernetAddress;

/// Largest frame accepted by MACRAW TX. The chip appends the FCS itself.
const MAX_TX_FRAME_LEN: usize = 1514;

/// Block select bits for the control phase of an SPI frame.
mod blocks {
    pub const COMMON: u8 = 0x00;

    pub const SOCKET0: u8 = 0x01;

    pub const SOCKET0_TX: u8 = 0x02;

    pub const SOCKET0_RX: u8 = 0x03;

    /// Register block of socket n.
    pub fn socket(n: u8) -> u8 {
        (n << 2) | SOCKET0
    }
}

mod common {
    pub const MR: u16 = 0x0000;

    pub const SHAR: u16 = 0x0009;

    pub const PHYCFGR: u16 = 0x002E;

    pub const VERSIONR: u16 = 0x0039;

    pub const MR_RST: u8 = 0x80;

    pub const PHYCFGR_LNK: u8 = 0x01;

    pub const VERSION: u8 = 0x04;
}

mod socket {
    pub const MR: u16 = 0x0000;

    pub const CR: u16 = 0x0001;

    pub const SR: u16 = 0x0003;

    pub const RXBUF_SIZE: u16 = 0x001E;

    pub const TXBUF_SIZE: u16 = 0x001F;

    pub const TX_FSR: u16 = 0x0020;

    pub const TX_WR: u16 = 0x0024;

    pub const RX_RSR: u16 = 0x0026;

    pub const RX_RD: u16 = 0x0028;

    pub const MR_MACRAW: u8 = 0x04;

    /// Only receive frames for our address, broadcast and multicast.
    pub const MR_MFEN: u8 = 0x80;

    pub const CR_OPEN: u8 = 0x01;

    pub const CR_SEND: u8 = 0x20;

    pub const CR_RECV: u8 = 0x40;

    pub const SR_MACRAW: u8 = 0x42;
}

const CONTROL_WRITE: u8 = 0x04;

const CONTROL_READ: u8 = 0x00;

const NUM_SOCKETS: u8 = 8;

/// Buffer memory of socket 0 in KB.
const SOCKET0_BUF_KB: u8 = 16;

/// Bytes preceding each frame in the RX buffer, holding the frame length plus
/// the size of the prefix itself.
const RX_FRAME_PREFIX_LEN: usize = 2;

/// Polls of a self clearing register before giving up on the chip.
const MAX_POLLS: usize = 1000;

/// A W5500 attached to a bus.
#[derive(Debug)]
pub struct W5500<B: Bus> {
    bus: B,
}

impl<B: Bus> W5500<B> {
    pub fn new(bus: B) -> W5500<B> {
        W5500 { bus }
    }

    /// Releases the bus.
    pub fn free(self) -> B {
        self.bus
    }

    fn read(&mut self, block: u8, addr: u16, buffer: &mut [u8]) {
        self.bus.begin();
        self.bus.transfer((addr >> 8) as u8);
        self.bus.transfer(addr as u8);
        self.bus.transfer((block << 3) | CONTROL_READ);
        for byte in buffer.iter_mut() {
            *byte = self.bus.transfer(0);
        }
        self.bus.end();
    }

    fn write(&mut self, block: u8, addr: u16, buffer: &[u8]) {
        self.bus.begin();
        self.bus.transfer((addr >> 8) as u8);
        self.bus.transfer(addr as u8);
        self.bus.transfer((block << 3) | CONTROL_WRITE);
        for byte in buffer.iter() {
            self.bus.transfer(*byte);
        }
        self.bus.end();
    }

    fn read_u8(&mut self, block: u8, addr: u16) -> u8 {
        let mut buffer = [0; 1];
        self.read(block, addr, &mut buffer);
        buffer[0]
    }

    fn write_u8(&mut self, block: u8, addr: u16, value: u8) {
        self.write(block, addr, &[value]);
    }

    fn read_u16(&mut self, block: u8, addr: u16) -> u16 {
        let mut buffer = [0; 2];
        self.read(block, addr, &mut buffer);
        NetworkEndian::read_u16(&buffer)
    }

    fn write_u16(&mut self, block: u8, addr: u16, value: u16) {
        let mut buffer = [0; 2];
        NetworkEndian::write_u16(&mut buffer, value);
        self.write(block, addr, &buffer);
    }

    /// Reads a 16 bit register the chip may update between the two byte
    /// reads, until two reads agree.
    fn read_u16_stable(&mut self, block: u8, addr: u16) -> Result<u16> {
        let mut value = self.read_u16(block, addr);
        for _ in 0 .. MAX_POLLS {
            let again = self.read_u16(block, addr);
            if again == value {
                return Ok(value);
            }
            value = again;
        }
        Err(Error::Bus)
    }

    /// Issues a socket 0 command and waits for the chip to accept it.
    fn command(&mut self, command: u8) -> Result<()> {
        self.write_u8(blocks::SOCKET0, socket::CR, command);
        for _ in 0 .. MAX_POLLS {
            if self.read_u8(blocks::SOCKET0, socket::CR) == 0 {
                return Ok(());
            }
        }
        warn!("W5500 did not accept command {:#04X}.", command);
        Err(Error::Bus)
    }

    fn reset(&mut self) -> Result<()> {
        self.write_u8(blocks::COMMON, common::MR, common::MR_RST);
        for _ in 0 .. MAX_POLLS {
            if self.read_u8(blocks::COMMON, common::MR) & common::MR_RST == 0 {
                return Ok(());
            }
        }
        Err(Error::Bus)
    }

    /// Drops everything waiting in the RX buffer.
    fn discard_rx(&mut self, received: u16) -> Result<()> {
        let rx_rd = self.read_u16(blocks::SOCKET0, socket::RX_RD);
        self.write_u16(blocks::SOCKET0, socket::RX_RD, rx_rd.wrapping_add(received));
        self.command(socket::CR_RECV)
    }
}

impl<B: Bus> Driver for W5500<B> {
    fn init(&mut self, ethernet_addr: EthernetAddress) -> Result<()> {
        self.reset()?;

        let version = self.read_u8(blocks::COMMON, common::VERSIONR);
        if version != common::VERSION {
            warn!("Expected W5500 version {}, got {}.", common::VERSION, version);
            return Err(Error::Unsupported);
        }

        self.write(blocks::COMMON, common::SHAR, ethernet_addr.as_bytes());

        for n in 0 .. NUM_SOCKETS {
            let size = if n == 0 { SOCKET0_BUF_KB } else { 0 };
            self.write_u8(blocks::socket(n), socket::RXBUF_SIZE, size);
            self.write_u8(blocks::socket(n), socket::TXBUF_SIZE, size);
        }

        self.write_u8(
            blocks::SOCKET0,
            socket::MR,
            socket::MR_MACRAW | socket::MR_MFEN,
        );
        self.command(socket::CR_OPEN)?;

        let status = self.read_u8(blocks::SOCKET0, socket::SR);
        if status != socket::SR_MACRAW {
            warn!("W5500 socket failed to open in MACRAW mode, status {:#04X}.", status);
            return Err(Error::Bus);
        }

        debug!("W5500 up with {}.", ethernet_addr);
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<usize> {
        if frame.len() > MAX_TX_FRAME_LEN {
            return Err(Error::Overflow);
        }

        let free = self.read_u16_stable(blocks::SOCKET0, socket::TX_FSR)?;
        if (free as usize) < frame.len() {
            return Err(Error::Busy);
        }

        // Buffer addresses wrap within the socket's buffer memory on the chip.
        let tx_wr = self.read_u16(blocks::SOCKET0, socket::TX_WR);
        self.write(blocks::SOCKET0_TX, tx_wr, frame);
        self.write_u16(
            blocks::SOCKET0,
            socket::TX_WR,
            tx_wr.wrapping_add(frame.len() as u16),
        );
        self.command(socket::CR_SEND)?;

        Ok(frame.len())
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let received = self.read_u16_stable(blocks::SOCKET0, socket::RX_RSR)?;
        if received == 0 {
            return Ok(0);
        }

        let rx_rd = self.read_u16(blocks::SOCKET0, socket::RX_RD);
        let mut prefix = [0; RX_FRAME_PREFIX_LEN];
        self.read(blocks::SOCKET0_RX, rx_rd, &mut prefix);

        let total_len = NetworkEndian::read_u16(&prefix) as usize;
        if total_len < RX_FRAME_PREFIX_LEN || total_len > received as usize {
            warn!(
                "W5500 RX buffer out of sync with frame length {} and {} bytes received.",
                total_len, received
            );
            self.discard_rx(received)?;
            return Err(Error::Bus);
        }

        let frame_len = total_len - RX_FRAME_PREFIX_LEN;
        if frame_len > buffer.len() {
            self.write_u16(
                blocks::SOCKET0,
                socket::RX_RD,
                rx_rd.wrapping_add(total_len as u16),
            );
            self.command(socket::CR_RECV)?;
            return Err(Error::Overflow);
        }

        self.read(
            blocks::SOCKET0_RX,
            rx_rd.wrapping_add(RX_FRAME_PREFIX_LEN as u16),
            &mut buffer[.. frame_len],
        );
        self.write_u16(
            blocks::SOCKET0,
            socket::RX_RD,
            rx_rd.wrapping_add(total_len as u16),
        );
        self.command(socket::CR_RECV)?;

        Ok(frame_len)
    }

    fn link_up(&mut self) -> bool {
        self.read_u8(blocks::COMMON, common::PHYCFGR) & common::PHYCFGR_LNK != 0
    }
}
