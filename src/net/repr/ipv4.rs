use core::fmt::{
    Display,
    Formatter,
    Result as FmtResult,
};
use core::ops::Deref;
use core::result::Result as StdResult;
use core::str::FromStr;

use byteorder::{
    ByteOrder,
    NetworkEndian,
};

use crate::net::check::internet_checksum;
use crate::{
    Error,
    Result,
};

/// [IPv4 address](https://en.wikipedia.org/wiki/IPv4) in network byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address([u8; 4]);

impl Address {
    pub const BROADCAST: Address = Address([0xFF; 4]);

    pub const UNSPECIFIED: Address = Address([0x00; 4]);

    /// Creates an IPv4 address from a network byte order buffer.
    pub fn new(addr: [u8; 4]) -> Address {
        Address(addr)
    }

    /// Tries to create an IPv4 address from a network byte order slice.
    pub fn try_new(addr: &[u8]) -> Result<Address> {
        if addr.len() != 4 {
            return Err(Error::Exhausted);
        }

        let mut _addr: [u8; 4] = [0; 4];
        _addr.copy_from_slice(addr);
        Ok(Address(_addr))
    }

    /// Creates an IPv4 address from a host order integer.
    pub fn from_u32(addr: u32) -> Address {
        let mut _addr: [u8; 4] = [0; 4];
        NetworkEndian::write_u32(&mut _addr, addr);
        Address(_addr)
    }

    /// Returns the address as a host order integer.
    pub fn as_u32(&self) -> u32 {
        NetworkEndian::read_u32(&self.0)
    }

    /// Returns a reference to the network byte order representation of the
    /// address.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Checks if this is the limited broadcast address, 255.255.255.255.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn is_unspecified(&self) -> bool {
        *self == Self::UNSPECIFIED
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl FromStr for Address {
    type Err = ();

    /// Parses an IPv4 address from an A.B.C.D style string.
    fn from_str(addr: &str) -> StdResult<Address, Self::Err> {
        let mut ipv4: [u8; 4] = [0; 4];
        let mut tokens = addr.split('.');

        for byte in ipv4.iter_mut() {
            let token = tokens.next().ok_or(())?;
            *byte = token.parse::<u8>().map_err(|_| ())?;
        }

        if tokens.next().is_some() {
            return Err(());
        }

        Ok(Address::new(ipv4))
    }
}

/// An IPv4 address with a subnet mask, in
/// [CIDR](https://en.wikipedia.org/wiki/Classless_Inter-Domain_Routing) notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressCidr {
    address: Address,
    subnet_len: u8,
}

impl AddressCidr {
    /// Creates an address with a subnet mask of subnet_len bits.
    ///
    /// # Panics
    ///
    /// Causes a panic if subnet_len is greater than 32.
    pub fn new(address: Address, subnet_len: u8) -> AddressCidr {
        assert!(subnet_len <= 32);
        AddressCidr {
            address,
            subnet_len,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn subnet_len(&self) -> u8 {
        self.subnet_len
    }

    /// Returns the subnet mask, e.g. 255.255.255.0 for a /24.
    pub fn netmask(&self) -> Address {
        match self.subnet_len {
            0 => Address::UNSPECIFIED,
            n => Address::from_u32(!0u32 << (32 - n as u32)),
        }
    }

    /// Returns the directed broadcast address of the subnet.
    pub fn broadcast(&self) -> Address {
        Address::from_u32(self.address.as_u32() | !self.netmask().as_u32())
    }

    /// Checks if an address is on the same subnet.
    pub fn is_member(&self, address: Address) -> bool {
        let mask = self.netmask().as_u32();
        (self.address.as_u32() & mask) == (address.as_u32() & mask)
    }
}

impl Deref for AddressCidr {
    type Target = Address;

    fn deref(&self) -> &Address {
        &self.address
    }
}

impl Display for AddressCidr {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}/{}", self.address, self.subnet_len)
    }
}

impl FromStr for AddressCidr {
    type Err = ();

    /// Parses an IPv4 address with a subnet mask from an A.B.C.D/N style string.
    fn from_str(addr: &str) -> StdResult<AddressCidr, Self::Err> {
        let mut tokens = addr.splitn(2, '/');
        let address = tokens.next().ok_or(())?.parse::<Address>()?;
        let subnet_len = tokens
            .next()
            .ok_or(())?
            .parse::<u8>()
            .map_err(|_| ())?;

        if subnet_len > 32 {
            return Err(());
        }

        Ok(AddressCidr::new(address, subnet_len))
    }
}

/// [https://en.wikipedia.org/wiki/List_of_IP_protocol_numbers](https://en.wikipedia.org/wiki/List_of_IP_protocol_numbers)
pub mod protocols {
    pub const ICMP: u8 = 0x01;

    pub const UDP: u8 = 0x11;
}

pub mod flags {
    pub const MORE_FRAGMENTS: u16 = 0x2000;

    pub const FRAGMENT_OFFSET: u16 = 0x1FFF;
}

/// [https://en.wikipedia.org/wiki/IPv4#Header](https://en.wikipedia.org/wiki/IPv4#Header)
mod fields {
    use core::ops::Range;

    pub const VERSION_AND_HEADER_LEN: usize = 0;

    pub const DSCP_AND_ECN: usize = 1;

    pub const PACKET_LEN: Range<usize> = 2 .. 4;

    pub const IDENTIFICATION: Range<usize> = 4 .. 6;

    pub const FLAGS_AND_FRAGMENT_OFFSET: Range<usize> = 6 .. 8;

    pub const TTL: usize = 8;

    pub const PROTOCOL: usize = 9;

    pub const CHECKSUM: Range<usize> = 10 .. 12;

    pub const SRC_ADDR: Range<usize> = 12 .. 16;

    pub const DST_ADDR: Range<usize> = 16 .. 20;
}

/// View of a byte buffer as an IPv4 packet.
///
/// The buffer may extend past the packet length, e.g. with Ethernet padding.
/// Anything past packet_len() is not part of the payload.
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
    pub const MIN_HEADER_LEN: usize = 20;

    /// Tries to create an IPv4 packet view over a byte buffer.
    ///
    /// Only checks that the buffer is large enough to access the fixed header
    /// fields. Use check_encoding() before trusting the length fields!
    pub fn try_new(buffer: T) -> Result<Packet<T>> {
        if buffer.as_ref().len() < Self::MIN_HEADER_LEN {
            Err(Error::Exhausted)
        } else {
            Ok(Packet { buffer })
        }
    }

    /// Returns the length of a IPv4 packet with no options and the payload size.
    pub fn buffer_len(payload_len: usize) -> usize {
        Self::MIN_HEADER_LEN + payload_len
    }

    /// Checks if the packet has a valid encoding. This includes the version,
    /// length fields being consistent with the buffer and the header checksum.
    pub fn check_encoding(&self) -> Result<()> {
        let buffer_len = self.buffer.as_ref().len();
        let header_len = self.header_len() as usize;
        let packet_len = self.packet_len() as usize;

        if self.ip_version() != 4 {
            Err(Error::Malformed)
        } else if header_len < Self::MIN_HEADER_LEN || header_len > packet_len
            || packet_len > buffer_len
        {
            Err(Error::Exhausted)
        } else if self.gen_header_checksum() != 0 {
            Err(Error::Checksum)
        } else {
            Ok(())
        }
    }

    /// Calculates the header checksum, including any value in the checksum
    /// field. Yields 0 for a header with a valid checksum.
    pub fn gen_header_checksum(&self) -> u16 {
        let header_len = (self.header_len() as usize)
            .max(Self::MIN_HEADER_LEN)
            .min(self.buffer.as_ref().len());
        internet_checksum(self.buffer.as_ref()[.. header_len].iter().cloned())
    }

    pub fn ip_version(&self) -> u8 {
        self.buffer.as_ref()[fields::VERSION_AND_HEADER_LEN] >> 4
    }

    /// Returns the header length in bytes (not 32 bit words).
    pub fn header_len(&self) -> u8 {
        (self.buffer.as_ref()[fields::VERSION_AND_HEADER_LEN] & 0x0F) * 4
    }

    pub fn dscp(&self) -> u8 {
        self.buffer.as_ref()[fields::DSCP_AND_ECN] >> 2
    }

    pub fn ecn(&self) -> u8 {
        self.buffer.as_ref()[fields::DSCP_AND_ECN] & 0x03
    }

    pub fn packet_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::PACKET_LEN])
    }

    pub fn identification(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::IDENTIFICATION])
    }

    /// Returns the flags, still in the top 3 bits of the 16 bit field.
    pub fn flags(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::FLAGS_AND_FRAGMENT_OFFSET])
            & !flags::FRAGMENT_OFFSET
    }

    /// Returns the fragment offset in units of 8 bytes.
    pub fn fragment_offset(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::FLAGS_AND_FRAGMENT_OFFSET])
            & flags::FRAGMENT_OFFSET
    }

    pub fn ttl(&self) -> u8 {
        self.buffer.as_ref()[fields::TTL]
    }

    pub fn protocol(&self) -> u8 {
        self.buffer.as_ref()[fields::PROTOCOL]
    }

    pub fn header_checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::CHECKSUM])
    }

    pub fn src_addr(&self) -> Address {
        let mut addr = [0; 4];
        addr.copy_from_slice(&self.buffer.as_ref()[fields::SRC_ADDR]);
        Address(addr)
    }

    pub fn dst_addr(&self) -> Address {
        let mut addr = [0; 4];
        addr.copy_from_slice(&self.buffer.as_ref()[fields::DST_ADDR]);
        Address(addr)
    }

    /// Returns an immutable view of the payload.
    ///
    /// You should ensure check_encoding() passes to avoid panics.
    pub fn payload(&self) -> &[u8] {
        &self.buffer.as_ref()[self.header_len() as usize .. self.packet_len() as usize]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Sets the version and header length (in 32 bit words).
    pub fn set_version_and_header_len(&mut self, version: u8, header_len: u8) {
        self.buffer.as_mut()[fields::VERSION_AND_HEADER_LEN] = (version << 4) | (header_len & 0x0F);
    }

    pub fn set_dscp_and_ecn(&mut self, dscp: u8, ecn: u8) {
        self.buffer.as_mut()[fields::DSCP_AND_ECN] = (dscp << 2) | (ecn & 0x03);
    }

    pub fn set_packet_len(&mut self, packet_len: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[fields::PACKET_LEN], packet_len);
    }

    pub fn set_identification(&mut self, identification: u16) {
        NetworkEndian::write_u16(
            &mut self.buffer.as_mut()[fields::IDENTIFICATION],
            identification,
        );
    }

    pub fn set_flags_and_fragment_offset(&mut self, flags: u16, fragment_offset: u16) {
        let value = (flags & !flags::FRAGMENT_OFFSET) | (fragment_offset & flags::FRAGMENT_OFFSET);
        NetworkEndian::write_u16(
            &mut self.buffer.as_mut()[fields::FLAGS_AND_FRAGMENT_OFFSET],
            value,
        );
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.buffer.as_mut()[fields::TTL] = ttl;
    }

    pub fn set_protocol(&mut self, protocol: u8) {
        self.buffer.as_mut()[fields::PROTOCOL] = protocol;
    }

    pub fn set_header_checksum(&mut self, checksum: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[fields::CHECKSUM], checksum);
    }

    pub fn set_src_addr(&mut self, addr: Address) {
        self.buffer.as_mut()[fields::SRC_ADDR].copy_from_slice(addr.as_bytes());
    }

    pub fn set_dst_addr(&mut self, addr: Address) {
        self.buffer.as_mut()[fields::DST_ADDR].copy_from_slice(addr.as_bytes());
    }

    /// Recomputes the header checksum.
    pub fn fill_checksum(&mut self) {
        self.set_header_checksum(0);
        let checksum = self.gen_header_checksum();
        self.set_header_checksum(checksum);
    }

    /// Returns a mutable view of the payload.
    ///
    /// You should ensure the header and packet length are set to avoid panics.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let (header_len, packet_len) = (self.header_len() as usize, self.packet_len() as usize);
        &mut self.buffer.as_mut()[header_len .. packet_len]
    }
}

/// Safe representation of an IPv4 header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Repr {
    pub src_addr: Address,
    pub dst_addr: Address,
    pub protocol: u8,
    pub payload_len: u16,
    pub ttl: u8,
    pub identification: u16,
    pub more_fragments: bool,
    /// Fragment offset in units of 8 bytes.
    pub fragment_offset: u16,
}

impl Repr {
    /// Returns the IPv4 packet size needed to serialize this IPv4 header and
    /// payload. Options are never serialized.
    pub fn buffer_len(&self) -> usize {
        Packet::<&[u8]>::buffer_len(self.payload_len as usize)
    }

    /// Checks if the packet is a fragment of a larger datagram.
    pub fn is_fragment(&self) -> bool {
        self.more_fragments || self.fragment_offset != 0
    }

    /// Tries to deserialize a packet into an IPv4 header.
    pub fn deserialize<T>(packet: &Packet<T>) -> Result<Repr>
    where
        T: AsRef<[u8]>,
    {
        packet.check_encoding()?;

        Ok(Repr {
            src_addr: packet.src_addr(),
            dst_addr: packet.dst_addr(),
            protocol: packet.protocol(),
            payload_len: packet.packet_len() - packet.header_len() as u16,
            ttl: packet.ttl(),
            identification: packet.identification(),
            more_fragments: (packet.flags() & flags::MORE_FRAGMENTS) != 0,
            fragment_offset: packet.fragment_offset(),
        })
    }

    /// Serializes the IPv4 header into a packet, including a checksum.
    ///
    /// You should ensure the packet has at least buffer_len() bytes to avoid
    /// errors.
    pub fn serialize<T>(&self, packet: &mut Packet<T>) -> Result<()>
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        if packet.as_ref().len() < self.buffer_len() {
            return Err(Error::Exhausted);
        }

        let flags = if self.more_fragments {
            flags::MORE_FRAGMENTS
        } else {
            0
        };

        packet.set_version_and_header_len(4, 5);
        packet.set_dscp_and_ecn(0, 0);
        packet.set_packet_len(self.buffer_len() as u16);
        packet.set_identification(self.identification);
        packet.set_flags_and_fragment_offset(flags, self.fragment_offset);
        packet.set_ttl(self.ttl);
        packet.set_protocol(self.protocol);
        packet.set_src_addr(self.src_addr);
        packet.set_dst_addr(self.dst_addr);
        packet.fill_checksum();

        Ok(())
    }
}
