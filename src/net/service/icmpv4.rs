use crate::net::codec::Transport;
use crate::net::dev::Driver;
use crate::net::repr::{
    EthernetRepr,
    Icmpv4Repr,
    Ipv4Address,
    Ipv4Repr,
};
use crate::net::service::{
    ipv4,
    Interface,
};
use crate::net::time::{
    Env,
    Instant,
};
use crate::Result;

/// An ICMP echo reply received by an interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EchoReply {
    pub src_addr: Ipv4Address,
    pub id: u16,
    pub seq: u16,
    pub received_at: Instant,
}

/// Sends an ICMP echo request via the interface.
///
/// Any reply is made available via `Interface::take_echo_reply()`.
pub fn send_echo_request<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    dst_addr: Ipv4Address,
    id: u16,
    seq: u16,
    payload: &[u8],
) -> Result<()> {
    debug!("Sending ping to {} with id {} and seq {}.", dst_addr, id, seq);
    let icmp_repr = Icmpv4Repr::EchoRequest { id, seq };
    ipv4::send_packet(interface, dst_addr, Transport::Icmpv4(icmp_repr), payload)
}

/// Receives an ICMP packet from an interface.
///
/// Echo requests are answered straight back to the Ethernet address they came
/// from.
pub fn recv_packet<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    eth_repr: &EthernetRepr,
    ipv4_repr: &Ipv4Repr,
    icmp_repr: &Icmpv4Repr,
    payload: &[u8],
) -> Result<()> {
    match *icmp_repr {
        Icmpv4Repr::EchoRequest { id, seq } => {
            debug!(
                "Got a ping from {}; Sending response...",
                ipv4_repr.src_addr
            );
            let icmp_reply = Icmpv4Repr::EchoReply { id, seq };
            ipv4::send_packet_to(
                interface,
                eth_repr.src_addr,
                ipv4_repr.src_addr,
                Transport::Icmpv4(icmp_reply),
                payload,
            )
        }
        Icmpv4Repr::EchoReply { id, seq } => {
            debug!(
                "Got a ping response from {} with id {} and seq {}.",
                ipv4_repr.src_addr, id, seq
            );
            interface.echo_reply = Some(EchoReply {
                src_addr: ipv4_repr.src_addr,
                id,
                seq,
                received_at: interface.arp_cache.now(),
            });
            Ok(())
        }
    }
}
