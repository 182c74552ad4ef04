use byteorder::{
    ByteOrder,
    NetworkEndian,
};

use crate::net::check::internet_checksum;
use crate::net::repr::{
    ipv4_protocols,
    Ipv4Repr,
};
use crate::{
    Error,
    Result,
};

/// Safe representation of a UDP header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Repr {
    pub src_port: u16,
    pub dst_port: u16,
    /// Length of the header and payload in bytes.
    pub length: u16,
}

impl Repr {
    /// Returns the UDP packet size needed to serialize this UDP header and
    /// payload.
    pub fn buffer_len(&self) -> usize {
        self.length as usize
    }

    /// Tries to deserialize a packet into a UDP header.
    pub fn deserialize<T>(packet: &Packet<T>, ip_repr: &Ipv4Repr) -> Result<Repr>
    where
        T: AsRef<[u8]>,
    {
        packet.check_encoding(ip_repr)?;

        Ok(Repr {
            src_port: packet.src_port(),
            dst_port: packet.dst_port(),
            length: packet.length(),
        })
    }

    /// Serializes the UDP header into a packet.
    ///
    /// The checksum covers the payload, so the payload should be written
    /// before serializing the header.
    pub fn serialize<T>(&self, packet: &mut Packet<T>, ip_repr: &Ipv4Repr)
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        packet.set_src_port(self.src_port);
        packet.set_dst_port(self.dst_port);
        packet.set_length(self.length);
        packet.set_checksum(0);

        // A zero checksum means "no checksum", so it's sent as all ones.
        let checksum = match packet.gen_packet_checksum(ip_repr) {
            0 => 0xFFFF,
            checksum => checksum,
        };
        packet.set_checksum(checksum);
    }
}

/// [https://en.wikipedia.org/wiki/User_Datagram_Protocol](https://en.wikipedia.org/wiki/User_Datagram_Protocol)
mod fields {
    use core::ops::Range;

    pub const SRC_PORT: Range<usize> = 0 .. 2;

    pub const DST_PORT: Range<usize> = 2 .. 4;

    pub const LENGTH: Range<usize> = 4 .. 6;

    pub const CHECKSUM: Range<usize> = 6 .. 8;
}

/// View of a byte buffer as a UDP packet.
#[derive(Debug)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> AsRef<[u8]> for Packet<T> {
    fn as_ref(&self) -> &[u8] {
        self.buffer.as_ref()
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> AsMut<[u8]> for Packet<T> {
    fn as_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut()
    }
}

impl<T: AsRef<[u8]>> Packet<T> {
    pub const HEADER_LEN: usize = 8;

    pub const MAX_PACKET_LEN: usize = 65535;

    /// Tries to create a UDP packet view over a byte buffer.
    pub fn try_new(buffer: T) -> Result<Packet<T>> {
        let buffer_len = buffer.as_ref().len();

        if buffer_len < Self::HEADER_LEN || buffer_len > Self::MAX_PACKET_LEN {
            Err(Error::Exhausted)
        } else {
            Ok(Packet { buffer })
        }
    }

    /// Returns the length of a UDP packet with the specified payload size.
    pub fn buffer_len(payload_len: usize) -> usize {
        Self::HEADER_LEN + payload_len
    }

    /// Checks if the packet has a valid encoding. This may include checksum, field
    /// consistency, etc. checks.
    pub fn check_encoding(&self, ip_repr: &Ipv4Repr) -> Result<()> {
        let length = self.length() as usize;

        if length < Self::HEADER_LEN || length > self.buffer.as_ref().len() {
            Err(Error::Malformed)
        } else if self.checksum() != 0 && self.gen_packet_checksum(ip_repr) != 0 {
            // NOTE: Checksums are optional with IPv4.
            Err(Error::Checksum)
        } else {
            Ok(())
        }
    }

    /// Calculates the packet checksum over the IPv4 pseudo header and the
    /// first length() bytes of the buffer.
    pub fn gen_packet_checksum(&self, ip_repr: &Ipv4Repr) -> u16 {
        let length = (self.length() as usize).min(self.buffer.as_ref().len());

        let mut ip_pseudo_header = [0; 12];
        ip_pseudo_header[0 .. 4].copy_from_slice(ip_repr.src_addr.as_bytes());
        ip_pseudo_header[4 .. 8].copy_from_slice(ip_repr.dst_addr.as_bytes());
        ip_pseudo_header[9] = ipv4_protocols::UDP;
        NetworkEndian::write_u16(&mut ip_pseudo_header[10 .. 12], length as u16);

        let iter = ip_pseudo_header
            .iter()
            .chain(self.buffer.as_ref()[.. length].iter())
            .cloned();
        internet_checksum(iter)
    }

    pub fn src_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::SRC_PORT])
    }

    pub fn dst_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::DST_PORT])
    }

    pub fn length(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::LENGTH])
    }

    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::CHECKSUM])
    }

    /// Returns an immutable view of the payload.
    ///
    /// You should ensure check_encoding() passes to avoid panics.
    pub fn payload(&self) -> &[u8] {
        &self.buffer.as_ref()[Self::HEADER_LEN .. self.length() as usize]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_src_port(&mut self, port: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[fields::SRC_PORT], port);
    }

    pub fn set_dst_port(&mut self, port: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[fields::DST_PORT], port);
    }

    pub fn set_length(&mut self, length: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[fields::LENGTH], length);
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[fields::CHECKSUM], checksum);
    }

    /// Returns a mutable view of everything after the header.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[Self::HEADER_LEN ..]
    }
}
