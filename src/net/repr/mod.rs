//! Serialization and deserialization of network packets.
//!
//! The `repr` module provides views over byte buffers for the headers at each
//! layer, along with plain representations of those headers. Every multi byte
//! field is converted to/from network byte order by exactly one accessor on a
//! view, and views are only created after checking the buffer is large enough.

pub mod arp;
pub mod ethernet;
pub mod icmpv4;
pub mod ipv4;
pub mod udp;

pub use self::arp::{
    hw_types as arp_hw_types,
    proto_types as arp_proto_types,
    Arp,
    Op as ArpOp,
};
pub use self::ethernet::{
    eth_types,
    Address as EthernetAddress,
    Frame as EthernetFrame,
    Repr as EthernetRepr,
};
pub use self::icmpv4::{
    Packet as Icmpv4Packet,
    Repr as Icmpv4Repr,
};
pub use self::ipv4::{
    flags as ipv4_flags,
    protocols as ipv4_protocols,
    Address as Ipv4Address,
    AddressCidr as Ipv4AddressCidr,
    Packet as Ipv4Packet,
    Repr as Ipv4Repr,
};
pub use self::udp::{
    Packet as UdpPacket,
    Repr as UdpRepr,
};
