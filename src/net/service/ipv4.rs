use crate::net::codec::{
    Headers,
    Transport,
};
use crate::net::dev::Driver;
use crate::net::repr::{
    eth_types,
    ipv4_protocols,
    EthernetAddress,
    EthernetRepr,
    Ipv4Address,
    Ipv4Repr,
};
use crate::net::service::{
    arp,
    ethernet,
    icmpv4,
    udp,
    Interface,
    DEFAULT_TTL,
};
use crate::net::time::Env;
use crate::{
    Error,
    Result,
};

/// Sends an IPv4 packet via the interface.
///
/// The Ethernet destination is resolved from the IPv4 destination, which may
/// fail with Error::MacResolution while an ARP request is outstanding.
pub fn send_packet<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    dst_addr: Ipv4Address,
    transport: Transport,
    payload: &[u8],
) -> Result<()> {
    let eth_dst_addr = if is_broadcast(interface, dst_addr) {
        EthernetAddress::BROADCAST
    } else {
        let next_hop = ipv4_addr_route(interface, dst_addr);
        arp::eth_addr_for_ip(interface, next_hop)?
    };

    send_packet_to(interface, eth_dst_addr, dst_addr, transport, payload)
}

/// Sends an IPv4 packet to a known Ethernet address, skipping ARP.
pub fn send_packet_to<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    eth_dst_addr: EthernetAddress,
    dst_addr: Ipv4Address,
    transport: Transport,
    payload: &[u8],
) -> Result<()> {
    let protocol = match transport {
        Transport::Icmpv4(_) => ipv4_protocols::ICMP,
        Transport::Udp(_) => ipv4_protocols::UDP,
        Transport::Unsupported => return Err(Error::Malformed),
    };

    let headers = Headers::Ipv4 {
        ethernet: EthernetRepr {
            dst_addr: eth_dst_addr,
            src_addr: interface.ethernet_addr,
            payload_type: eth_types::IPV4,
        },
        ipv4: Ipv4Repr {
            src_addr: *interface.ipv4_addr,
            dst_addr,
            protocol,
            payload_len: 0,
            ttl: DEFAULT_TTL,
            identification: interface.next_identification(),
            more_fragments: false,
            fragment_offset: 0,
        },
        transport,
    };

    ethernet::send_frame(interface, &headers, payload)?;
    Ok(())
}

/// Receives an IPv4 packet from an interface.
///
/// The IPv4 packet is filtered by destination and propagated up the network
/// stack.
pub fn recv_packet<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    eth_repr: &EthernetRepr,
    ipv4_repr: &Ipv4Repr,
    transport: &Transport,
    payload: &[u8],
) -> Result<()> {
    let broadcast = is_broadcast(interface, ipv4_repr.dst_addr);

    if ipv4_repr.dst_addr != *interface.ipv4_addr && !(broadcast && interface.accept_broadcast) {
        debug!(
            "Ignoring IPv4 packet with destination {}.",
            ipv4_repr.dst_addr
        );
        return Err(Error::Ignored);
    }

    if ipv4_repr.is_fragment() {
        debug!(
            "Dropping IPv4 fragment from {} with offset {}.",
            ipv4_repr.src_addr, ipv4_repr.fragment_offset
        );
        return Err(Error::Ignored);
    }

    match *transport {
        Transport::Icmpv4(ref icmp_repr) if !broadcast => {
            icmpv4::recv_packet(interface, eth_repr, ipv4_repr, icmp_repr, payload)
        }
        Transport::Udp(ref udp_repr) => udp::recv_packet(interface, ipv4_repr, udp_repr, payload),
        _ => {
            debug!(
                "Ignoring IPv4 packet with protocol {} to {}.",
                ipv4_repr.protocol, ipv4_repr.dst_addr
            );
            Err(Error::Ignored)
        }
    }
}

/// Returns the next hop for a packet destined to a specified address.
pub fn ipv4_addr_route<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    address: Ipv4Address,
) -> Ipv4Address {
    if interface.ipv4_addr.is_member(address) {
        debug!("{} will be routed through link.", address);
        address
    } else {
        debug!("{} will be routed through default gateway.", address);
        interface.default_gateway
    }
}

/// Checks if an address is the limited broadcast or the interface's subnet
/// broadcast address.
fn is_broadcast<D: Driver, E: Env>(interface: &Interface<D, E>, address: Ipv4Address) -> bool {
    address != *interface.ipv4_addr
        && (address.is_broadcast() || address == interface.ipv4_addr.broadcast())
}
