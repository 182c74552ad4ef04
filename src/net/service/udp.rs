use crate::net::codec::Transport;
use crate::net::dev::Driver;
use crate::net::repr::{
    Ipv4Address,
    Ipv4Repr,
    UdpRepr,
};
use crate::net::service::{
    ipv4,
    Interface,
};
use crate::net::time::Env;
use crate::{
    Error,
    Result,
};

/// Sends a UDP datagram via the interface.
///
/// This function takes care of serializing headers, calculating checksums and
/// resolving the next hop. While the next hop is being resolved the datagram
/// is dropped and Error::MacResolution returned, so the caller may retry on a
/// later poll.
pub fn send_datagram<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    dst_addr: Ipv4Address,
    dst_port: u16,
    src_port: u16,
    payload: &[u8],
) -> Result<()> {
    let udp_repr = UdpRepr {
        src_port,
        dst_port,
        length: 0,
    };

    ipv4::send_packet(interface, dst_addr, Transport::Udp(udp_repr), payload)
}

/// Receives a UDP datagram from an interface and hands it to the registered
/// handler, if any.
pub fn recv_packet<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    ipv4_repr: &Ipv4Repr,
    udp_repr: &UdpRepr,
    payload: &[u8],
) -> Result<()> {
    match interface.udp_handler {
        Some(handler) => {
            debug!(
                "Delivering UDP datagram from {}:{} to port {}.",
                ipv4_repr.src_addr, udp_repr.src_port, udp_repr.dst_port
            );
            handler(
                interface,
                ipv4_repr.src_addr,
                udp_repr.src_port,
                udp_repr.dst_port,
                payload,
            );
            Ok(())
        }
        None => {
            debug!(
                "Dropping UDP datagram to port {} with no handler.",
                udp_repr.dst_port
            );
            Err(Error::Ignored)
        }
    }
}
