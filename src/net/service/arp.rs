use crate::net::codec::Headers;
use crate::net::dev::Driver;
use crate::net::repr::{
    eth_types,
    Arp,
    ArpOp,
    EthernetAddress,
    EthernetRepr,
    Ipv4Address,
};
use crate::net::service::{
    ethernet,
    Interface,
};
use crate::net::time::Env;
use crate::{
    Error,
    Result,
};

/// Sends an ARP packet via an interface.
pub fn send_packet<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    arp_repr: &Arp,
    dst_addr: EthernetAddress,
) -> Result<()> {
    let headers = Headers::Arp {
        ethernet: EthernetRepr {
            dst_addr,
            src_addr: interface.ethernet_addr,
            payload_type: eth_types::ARP,
        },
        arp: *arp_repr,
    };

    ethernet::send_frame(interface, &headers, &[])?;
    Ok(())
}

/// Receives an ARP packet from an interface.
///
/// This may result in a response to ARP requests, updating the ARP cache, etc.
pub fn recv_packet<D: Driver, E: Env>(interface: &mut Interface<D, E>, arp_repr: &Arp) -> Result<()> {
    match arp_repr.op {
        ArpOp::Reply => recv_reply(interface, arp_repr),
        ArpOp::Request => recv_request(interface, arp_repr),
    }
}

fn recv_reply<D: Driver, E: Env>(interface: &mut Interface<D, E>, arp_repr: &Arp) -> Result<()> {
    let (ipv4_addr, eth_addr) = (arp_repr.source_proto_addr, arp_repr.source_hw_addr);

    if interface.arp_cache.is_pending(ipv4_addr) {
        debug!("Received ARP, adding mapping from {} to {}.", ipv4_addr, eth_addr);
        interface.arp_cache.set_eth_addr_for_ip(ipv4_addr, eth_addr);
        Ok(())
    } else if interface.arp_cache.refresh(ipv4_addr, eth_addr) {
        debug!("Received ARP, refreshing mapping from {} to {}.", ipv4_addr, eth_addr);
        Ok(())
    } else {
        debug!("Ignoring unsolicited ARP reply from {}.", ipv4_addr);
        Err(Error::Ignored)
    }
}

fn recv_request<D: Driver, E: Env>(interface: &mut Interface<D, E>, arp_repr: &Arp) -> Result<()> {
    // A requester we already know about may have a new Ethernet address, but
    // requests alone never add mappings.
    interface
        .arp_cache
        .refresh(arp_repr.source_proto_addr, arp_repr.source_hw_addr);

    if arp_repr.target_proto_addr != *interface.ipv4_addr {
        debug!(
            "Ignoring ARP with target IPv4 address {}.",
            arp_repr.target_proto_addr
        );
        return Err(Error::Ignored);
    }

    let arp_reply = Arp {
        op: ArpOp::Reply,
        source_hw_addr: interface.ethernet_addr,
        source_proto_addr: *interface.ipv4_addr,
        target_hw_addr: arp_repr.source_hw_addr,
        target_proto_addr: arp_repr.source_proto_addr,
    };

    debug!(
        "Sending ARP reply to {}/{}.",
        arp_reply.target_proto_addr, arp_reply.target_hw_addr
    );

    send_packet(interface, &arp_reply, arp_reply.target_hw_addr)
}

/// Tries to retrieve the Ethernet address for an IPv4 address.
///
/// The IP address may not have an Ethernet mapping yet, in which case an ARP
/// request is dispatched (at most once per retry interval) and an error
/// returned. The ARP response (if the IP address exists on the network) will
/// be processed by `recv_packet(...)` and update the ARP cache.
pub fn eth_addr_for_ip<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    ipv4_addr: Ipv4Address,
) -> Result<EthernetAddress> {
    if let Some(eth_addr) = interface.arp_cache.eth_addr_for_ip(ipv4_addr) {
        return Ok(eth_addr);
    }

    if interface.arp_cache.should_request(ipv4_addr) {
        let arp_repr = Arp {
            op: ArpOp::Request,
            source_hw_addr: interface.ethernet_addr,
            source_proto_addr: *interface.ipv4_addr,
            target_hw_addr: EthernetAddress::UNSPECIFIED,
            target_proto_addr: ipv4_addr,
        };

        debug!("Sending ARP request for {}.", ipv4_addr);
        send_packet(interface, &arp_repr, EthernetAddress::BROADCAST)?;
    } else {
        debug!("Waiting on ARP reply for {}.", ipv4_addr);
    }

    Err(Error::MacResolution(ipv4_addr))
}
