//! Packet processing services for different network layers.
//!
//! The `service` module deals with packet transmission and reception logic at
//! different layers of the network stack. Everything runs from `poll(...)` or
//! from application calls on the same thread, so every service takes the
//! interface by `&mut`.

pub mod arp;
pub mod ethernet;
pub mod icmpv4;
pub mod ipv4;
pub mod udp;

use core::time::Duration;

use crate::net::arp_cache::ArpCache;
use crate::net::dev::{
    Driver,
    Error as DevError,
};
use crate::net::repr::ethernet::MAX_FRAME_LEN;
use crate::net::repr::{
    EthernetAddress,
    Ipv4Address,
    Ipv4AddressCidr,
};
use crate::net::time::Env;
use crate::Result;

pub use self::icmpv4::EchoReply;

/// TTL of every IPv4 packet sent by the stack.
pub const DEFAULT_TTL: u8 = 64;

pub const DEFAULT_ARP_EXPIRATION: Duration = Duration::from_secs(60);

pub const DEFAULT_ARP_RETRY: Duration = Duration::from_secs(1);

/// Application handler for UDP datagrams, invoked with the sender address,
/// source port, destination port and payload.
///
/// The handler runs inside `poll(...)` and may send packets via the interface,
/// but it must not block.
pub type UdpHandler<D, E> = fn(&mut Interface<D, E>, Ipv4Address, u16, u16, &[u8]);

/// Addresses and policies for an interface.
#[derive(Clone, Debug)]
pub struct Config {
    /// Ethernet address for the interface.
    pub ethernet_addr: EthernetAddress,
    /// IPv4 address and subnet for the interface.
    pub ipv4_addr: Ipv4AddressCidr,
    /// Default gateway for IPv4 packets not on the interface subnet. This
    /// should be on the same subnet as ipv4_addr!
    pub default_gateway: Ipv4Address,
    /// Deliver UDP datagrams sent to the limited or subnet broadcast address.
    pub accept_broadcast: bool,
    /// How long an IPv4 -> Ethernet address mapping stays valid.
    pub arp_expiration: Duration,
    /// Minimum time between ARP requests for the same address.
    pub arp_retry: Duration,
}

impl Config {
    pub fn new(
        ethernet_addr: EthernetAddress,
        ipv4_addr: Ipv4AddressCidr,
        default_gateway: Ipv4Address,
    ) -> Config {
        Config {
            ethernet_addr,
            ipv4_addr,
            default_gateway,
            accept_broadcast: false,
            arp_expiration: DEFAULT_ARP_EXPIRATION,
            arp_retry: DEFAULT_ARP_RETRY,
        }
    }
}

/// An interface for sending and receiving network packets.
pub struct Interface<D: Driver, E: Env> {
    /// Device for sending and receiving raw Ethernet frames.
    pub driver: D,
    /// Cache for IPv4/Ethernet address translations.
    pub arp_cache: ArpCache<E>,
    /// Ethernet address for the interface.
    pub ethernet_addr: EthernetAddress,
    /// IPv4 address for the interface.
    pub ipv4_addr: Ipv4AddressCidr,
    /// Default gateway for IPv4 packets not on the interface subnet.
    pub default_gateway: Ipv4Address,
    /// Deliver UDP datagrams sent to a broadcast address.
    pub accept_broadcast: bool,
    udp_handler: Option<UdpHandler<D, E>>,
    echo_reply: Option<EchoReply>,
    ipv4_identification: u16,
    tx_buffer: [u8; MAX_FRAME_LEN],
}

impl<D: Driver, E: Env> Interface<D, E> {
    /// Creates an interface bound to a driver. The driver is not touched until
    /// `init()`.
    pub fn new(driver: D, config: Config, time_env: E) -> Interface<D, E> {
        Interface {
            driver,
            arp_cache: ArpCache::new(config.arp_expiration, config.arp_retry, time_env),
            ethernet_addr: config.ethernet_addr,
            ipv4_addr: config.ipv4_addr,
            default_gateway: config.default_gateway,
            accept_broadcast: config.accept_broadcast,
            udp_handler: None,
            echo_reply: None,
            ipv4_identification: 0,
            tx_buffer: [0; MAX_FRAME_LEN],
        }
    }

    /// Brings up the underlying device with the interface's Ethernet address.
    pub fn init(&mut self) -> Result<()> {
        self.driver.init(self.ethernet_addr)?;
        info!(
            "Interface up with {} at {} via {}.",
            self.ethernet_addr, self.ipv4_addr, self.default_gateway
        );
        Ok(())
    }

    pub fn link_up(&mut self) -> bool {
        self.driver.link_up()
    }

    /// Registers the UDP handler, replacing any previous one.
    pub fn set_udp_handler(&mut self, handler: UdpHandler<D, E>) {
        self.udp_handler = Some(handler);
    }

    pub fn clear_udp_handler(&mut self) {
        self.udp_handler = None;
    }

    /// Returns the Ethernet address of the default gateway, if resolved.
    pub fn gateway_eth_addr(&mut self) -> Option<EthernetAddress> {
        let default_gateway = self.default_gateway;
        self.arp_cache.eth_addr_for_ip(default_gateway)
    }

    /// Returns the most recent ICMP echo reply received, if any.
    pub fn take_echo_reply(&mut self) -> Option<EchoReply> {
        self.echo_reply.take()
    }

    fn next_identification(&mut self) -> u16 {
        self.ipv4_identification = self.ipv4_identification.wrapping_add(1);
        self.ipv4_identification
    }
}

/// Receives and processes at most one Ethernet frame from an interface.
///
/// The buffer is used to receive the frame and should have room for
/// MAX_FRAME_LEN bytes. Returns true if a frame was processed, whether or not
/// it was dropped along the way.
pub fn poll<D: Driver, E: Env>(interface: &mut Interface<D, E>, rx_buffer: &mut [u8]) -> bool {
    let eth_frame_len = match interface.driver.receive(rx_buffer) {
        Ok(0) | Err(DevError::Nothing) => return false,
        Ok(eth_frame_len) => eth_frame_len.min(rx_buffer.len()),
        Err(err) => {
            warn!("Error receiving Ethernet frame with {:?}.", err);
            return false;
        }
    };

    if let Err(err) = ethernet::recv_frame(interface, &rx_buffer[.. eth_frame_len]) {
        debug!("Error processing Ethernet frame with {:?}.", err);
    }

    true
}
