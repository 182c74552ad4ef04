use crate::net::codec::{
    self,
    Headers,
};
use crate::net::dev::Driver;
use crate::net::repr::EthernetFrame;
use crate::net::service::{
    arp,
    ipv4,
    Interface,
};
use crate::net::time::Env;
use crate::{
    Error,
    Result,
};

/// Frames shorter than this are zero padded before transmission.
pub const MIN_FRAME_LEN: usize = 60;

/// Send an Ethernet frame via an interface and returns its length.
///
/// The frame is encoded in the interface's transmit buffer.
pub fn send_frame<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    headers: &Headers,
    payload: &[u8],
) -> Result<usize> {
    let mut eth_frame_len = codec::encode(headers, payload, &mut interface.tx_buffer[..])?;

    if eth_frame_len < MIN_FRAME_LEN {
        for byte in interface.tx_buffer[eth_frame_len .. MIN_FRAME_LEN].iter_mut() {
            *byte = 0;
        }
        eth_frame_len = MIN_FRAME_LEN;
    }

    interface
        .driver
        .transmit(&interface.tx_buffer[.. eth_frame_len])?;

    Ok(eth_frame_len)
}

/// Receives an Ethernet frame from an interface.
///
/// The Ethernet frame is parsed and propagated up the network stack.
pub fn recv_frame<D: Driver, E: Env>(
    interface: &mut Interface<D, E>,
    eth_buffer: &[u8],
) -> Result<()> {
    let eth_frame = EthernetFrame::try_new(eth_buffer)?;

    if eth_frame.dst_addr() != interface.ethernet_addr && !eth_frame.dst_addr().is_broadcast() {
        debug!(
            "Ignoring ethernet frame with destination {}.",
            eth_frame.dst_addr()
        );
        return Err(Error::Ignored);
    }

    let decoded = codec::decode(eth_buffer).ok_or(Error::Malformed)?;

    match decoded.headers {
        Headers::Arp { ref arp, .. } => arp::recv_packet(interface, arp),
        Headers::Ipv4 {
            ref ethernet,
            ref ipv4,
            ref transport,
        } => ipv4::recv_packet(interface, ethernet, ipv4, transport, decoded.payload),
    }
}
