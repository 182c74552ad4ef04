//! Decoding and encoding of whole Ethernet frames.
//!
//! `decode(...)` peels every header the stack understands off a received frame
//! and validates lengths and checksums along the way, while `encode(...)`
//! writes a complete frame, filling in length fields and checksums.

use crate::net::repr::{
    eth_types,
    ipv4_protocols,
    Arp,
    EthernetFrame,
    EthernetRepr,
    Icmpv4Packet,
    Icmpv4Repr,
    Ipv4Packet,
    Ipv4Repr,
    UdpPacket,
    UdpRepr,
};
use crate::{
    Error,
    Result,
};

/// The transport layer header of an IPv4 packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Icmpv4(Icmpv4Repr),
    Udp(UdpRepr),
    /// A protocol, ICMP message or fragment the stack does not interpret. The
    /// payload is the raw IPv4 payload.
    Unsupported,
}

/// Headers of a frame, from the link layer up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Headers {
    Arp {
        ethernet: EthernetRepr,
        arp: Arp,
    },
    Ipv4 {
        ethernet: EthernetRepr,
        ipv4: Ipv4Repr,
        transport: Transport,
    },
}

impl Headers {
    pub fn ethernet(&self) -> &EthernetRepr {
        match *self {
            Headers::Arp { ref ethernet, .. } => ethernet,
            Headers::Ipv4 { ref ethernet, .. } => ethernet,
        }
    }
}

/// A decoded frame. The payload is whatever follows the innermost header that
/// was decoded, e.g. the UDP payload or the ICMP echo data.
#[derive(Debug)]
pub struct Decoded<'a> {
    pub headers: Headers,
    pub payload: &'a [u8],
}

/// Decodes a received Ethernet frame.
///
/// Returns None for truncated, corrupt or unknown frames. Such frames are
/// simply dropped by the stack, so the reason is only logged.
pub fn decode(buffer: &[u8]) -> Option<Decoded> {
    match try_decode(buffer) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            debug!("Dropping frame of {} bytes with {:?}.", buffer.len(), err);
            None
        }
    }
}

fn try_decode(buffer: &[u8]) -> Result<Decoded> {
    let eth_frame = EthernetFrame::try_new(buffer)?;
    let ethernet = EthernetRepr::deserialize(&eth_frame);
    let eth_payload = &buffer[EthernetFrame::<&[u8]>::HEADER_LEN ..];

    match ethernet.payload_type {
        eth_types::ARP => Ok(Decoded {
            headers: Headers::Arp {
                ethernet,
                arp: Arp::deserialize(eth_payload)?,
            },
            payload: &[],
        }),
        eth_types::IPV4 => decode_ipv4(ethernet, eth_payload),
        _ => Err(Error::Ignored),
    }
}

fn decode_ipv4(ethernet: EthernetRepr, ipv4_buffer: &[u8]) -> Result<Decoded> {
    let ipv4_packet = Ipv4Packet::try_new(ipv4_buffer)?;
    let ipv4 = Ipv4Repr::deserialize(&ipv4_packet)?;

    let header_len = ipv4_packet.header_len() as usize;
    let ipv4_payload = &ipv4_buffer[header_len .. header_len + ipv4.payload_len as usize];

    // Only a first fragment carries the transport header, and even then the
    // checksum covers data that has not arrived yet.
    if ipv4.is_fragment() {
        return Ok(Decoded {
            headers: Headers::Ipv4 {
                ethernet,
                ipv4,
                transport: Transport::Unsupported,
            },
            payload: ipv4_payload,
        });
    }

    let (transport, payload) = match ipv4.protocol {
        ipv4_protocols::ICMP => {
            let icmp_packet = Icmpv4Packet::try_new(ipv4_payload)?;
            icmp_packet.check_encoding()?;

            match Icmpv4Repr::deserialize(&icmp_packet) {
                Ok(icmp_repr) => (
                    Transport::Icmpv4(icmp_repr),
                    &ipv4_payload[Icmpv4Packet::<&[u8]>::HEADER_LEN ..],
                ),
                Err(Error::Ignored) => (Transport::Unsupported, ipv4_payload),
                Err(err) => return Err(err),
            }
        }
        ipv4_protocols::UDP => {
            let udp_packet = UdpPacket::try_new(ipv4_payload)?;
            let udp_repr = UdpRepr::deserialize(&udp_packet, &ipv4)?;
            (
                Transport::Udp(udp_repr),
                &ipv4_payload[UdpPacket::<&[u8]>::HEADER_LEN .. udp_repr.length as usize],
            )
        }
        _ => (Transport::Unsupported, ipv4_payload),
    };

    Ok(Decoded {
        headers: Headers::Ipv4 {
            ethernet,
            ipv4,
            transport,
        },
        payload,
    })
}

/// Encodes a frame with the specified headers and payload into a buffer and
/// returns the length of the frame.
///
/// Length fields (IPv4 payload length, UDP length) are derived from the
/// payload, and all checksums are computed.
pub fn encode(headers: &Headers, payload: &[u8], buffer: &mut [u8]) -> Result<usize> {
    match *headers {
        Headers::Arp { ethernet, arp } => {
            let eth_frame_len = EthernetFrame::<&[u8]>::buffer_len(arp.buffer_len());
            if eth_frame_len > buffer.len() {
                return Err(Error::Exhausted);
            }

            let mut eth_frame = EthernetFrame::try_new(&mut buffer[.. eth_frame_len])?;
            ethernet.serialize(&mut eth_frame);
            arp.serialize(eth_frame.payload_mut())?;

            Ok(eth_frame_len)
        }
        Headers::Ipv4 {
            ethernet,
            ipv4,
            transport,
        } => {
            let transport_len = match transport {
                Transport::Icmpv4(ref icmp_repr) => icmp_repr.buffer_len(),
                Transport::Udp(_) => UdpPacket::<&[u8]>::HEADER_LEN,
                Transport::Unsupported => 0,
            };

            let ipv4_payload_len = transport_len + payload.len();
            if ipv4_payload_len > (u16::max_value() as usize) - Ipv4Packet::<&[u8]>::MIN_HEADER_LEN
            {
                return Err(Error::Exhausted);
            }

            let mut ipv4 = ipv4;
            ipv4.payload_len = ipv4_payload_len as u16;

            let eth_frame_len = EthernetFrame::<&[u8]>::buffer_len(ipv4.buffer_len());
            if eth_frame_len > buffer.len() {
                return Err(Error::Exhausted);
            }

            let mut eth_frame = EthernetFrame::try_new(&mut buffer[.. eth_frame_len])?;
            ethernet.serialize(&mut eth_frame);

            let mut ipv4_packet = Ipv4Packet::try_new(eth_frame.payload_mut())?;
            ipv4.serialize(&mut ipv4_packet)?;
            let ipv4_payload = ipv4_packet.payload_mut();

            match transport {
                Transport::Icmpv4(icmp_repr) => {
                    let mut icmp_packet = Icmpv4Packet::try_new(ipv4_payload)?;
                    icmp_packet.payload_mut().copy_from_slice(payload);
                    icmp_repr.serialize(&mut icmp_packet);
                }
                Transport::Udp(udp_repr) => {
                    let udp_repr = UdpRepr {
                        length: ipv4_payload_len as u16,
                        ..udp_repr
                    };
                    let mut udp_packet = UdpPacket::try_new(ipv4_payload)?;
                    udp_packet.payload_mut().copy_from_slice(payload);
                    udp_repr.serialize(&mut udp_packet, &ipv4);
                }
                Transport::Unsupported => ipv4_payload.copy_from_slice(payload),
            }

            Ok(eth_frame_len)
        }
    }
}
