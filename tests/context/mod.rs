#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use tinynet::net::codec::{
    self,
    Headers,
    Transport,
};
use tinynet::net::dev::{
    Driver,
    Error as DevError,
    Result as DevResult,
};
use tinynet::net::repr::ethernet::MAX_FRAME_LEN;
use tinynet::net::repr::{
    eth_types,
    ipv4_protocols,
    Arp,
    ArpOp,
    EthernetAddress,
    EthernetRepr,
    Ipv4Address,
    Ipv4AddressCidr,
    Ipv4Repr,
};
use tinynet::net::service::{
    self,
    Config,
    Interface,
};
use tinynet::net::time::MockEnv;

lazy_static! {
    pub static ref ETH_ADDR: EthernetAddress = {
        EthernetAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x0A])
    };

    pub static ref IPV4_ADDR: Ipv4Address = Ipv4Address::new([192, 168, 1, 10]);

    pub static ref IPV4_ADDR_CIDR: Ipv4AddressCidr = Ipv4AddressCidr::new(*IPV4_ADDR, 24);

    pub static ref GATEWAY_IPV4_ADDR: Ipv4Address = Ipv4Address::new([192, 168, 1, 1]);

    pub static ref GATEWAY_ETH_ADDR: EthernetAddress = {
        EthernetAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])
    };

    pub static ref PEER_IPV4_ADDR: Ipv4Address = Ipv4Address::new([192, 168, 1, 50]);

    pub static ref PEER_ETH_ADDR: EthernetAddress = {
        EthernetAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x32])
    };

    /// An IPv4 address off the interface subnet.
    pub static ref REMOTE_IPV4_ADDR: Ipv4Address = Ipv4Address::new([8, 8, 8, 8]);
}

/// A driver which receives queued frames and records transmitted ones.
#[derive(Debug, Default)]
pub struct MockDriver {
    pub inbound: VecDeque<Vec<u8>>,
    pub sent: Vec<Vec<u8>>,
    pub link: bool,
    pub initialized_with: Option<EthernetAddress>,
    pub fail_receive: bool,
}

impl Driver for MockDriver {
    fn init(&mut self, ethernet_addr: EthernetAddress) -> DevResult<()> {
        self.initialized_with = Some(ethernet_addr);
        self.link = true;
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> DevResult<usize> {
        self.sent.push(frame.to_vec());
        Ok(frame.len())
    }

    fn receive(&mut self, buffer: &mut [u8]) -> DevResult<usize> {
        if self.fail_receive {
            return Err(DevError::Bus);
        }

        match self.inbound.pop_front() {
            Some(ref frame) if frame.len() > buffer.len() => Err(DevError::Overflow),
            Some(frame) => {
                buffer[.. frame.len()].copy_from_slice(&frame);
                Ok(frame.len())
            }
            None => Ok(0),
        }
    }

    fn link_up(&mut self) -> bool {
        self.link
    }
}

pub type TestInterface = Interface<MockDriver, MockEnv>;

pub fn config() -> Config {
    Config::new(*ETH_ADDR, *IPV4_ADDR_CIDR, *GATEWAY_IPV4_ADDR)
}

/// Runs a function f against a freshly initialized interface.
pub fn run<F, R>(f: F) -> R
where
    F: FnOnce(&mut TestInterface) -> R,
{
    run_with_config(config(), f)
}

pub fn run_with_config<F, R>(config: Config, f: F) -> R
where
    F: FnOnce(&mut TestInterface) -> R,
{
    let _ = env_logger::try_init();

    let mut interface = Interface::new(MockDriver::default(), config, MockEnv::new());
    interface.init().unwrap();
    f(&mut interface)
}

/// Queues a frame on the interface's driver and polls once.
pub fn recv(interface: &mut TestInterface, frame: Vec<u8>) -> bool {
    interface.driver.inbound.push_back(frame);
    let mut rx_buffer = [0; MAX_FRAME_LEN];
    service::poll(interface, &mut rx_buffer)
}

/// Takes the frames transmitted so far.
pub fn sent(interface: &mut TestInterface) -> Vec<Vec<u8>> {
    interface.driver.sent.drain(..).collect()
}

pub fn advance(interface: &mut TestInterface, duration: Duration) {
    interface.arp_cache.time_env_mut().now += duration;
}

/// Decodes a transmitted frame, which must be well formed.
pub fn decode(frame: &[u8]) -> (Headers, Vec<u8>) {
    let decoded = codec::decode(frame).expect("Transmitted frame is malformed!");
    (decoded.headers, decoded.payload.to_vec())
}

pub fn encode(headers: &Headers, payload: &[u8]) -> Vec<u8> {
    let mut buffer = [0; MAX_FRAME_LEN];
    let eth_frame_len = codec::encode(headers, payload, &mut buffer[..]).unwrap();
    buffer[.. eth_frame_len].to_vec()
}

pub fn arp_frame(op: ArpOp, source: (EthernetAddress, Ipv4Address), target: Ipv4Address) -> Vec<u8> {
    let dst_addr = match op {
        ArpOp::Request => EthernetAddress::BROADCAST,
        ArpOp::Reply => *ETH_ADDR,
    };
    let target_hw_addr = match op {
        ArpOp::Request => EthernetAddress::UNSPECIFIED,
        ArpOp::Reply => *ETH_ADDR,
    };

    encode(
        &Headers::Arp {
            ethernet: EthernetRepr {
                dst_addr,
                src_addr: source.0,
                payload_type: eth_types::ARP,
            },
            arp: Arp {
                op,
                source_hw_addr: source.0,
                source_proto_addr: source.1,
                target_hw_addr,
                target_proto_addr: target,
            },
        },
        &[],
    )
}

pub fn ipv4_repr(src_addr: Ipv4Address, dst_addr: Ipv4Address, protocol: u8) -> Ipv4Repr {
    Ipv4Repr {
        src_addr,
        dst_addr,
        protocol,
        payload_len: 0,
        ttl: 32,
        identification: 0x1234,
        more_fragments: false,
        fragment_offset: 0,
    }
}

/// Encodes an IPv4 packet from the peer to some destination.
pub fn ipv4_frame(dst_addr: Ipv4Address, transport: Transport, payload: &[u8]) -> Vec<u8> {
    let protocol = match transport {
        Transport::Icmpv4(_) => ipv4_protocols::ICMP,
        _ => ipv4_protocols::UDP,
    };
    let eth_dst_addr = if dst_addr == *IPV4_ADDR {
        *ETH_ADDR
    } else {
        EthernetAddress::BROADCAST
    };

    encode(
        &Headers::Ipv4 {
            ethernet: EthernetRepr {
                dst_addr: eth_dst_addr,
                src_addr: *PEER_ETH_ADDR,
                payload_type: eth_types::IPV4,
            },
            ipv4: ipv4_repr(*PEER_IPV4_ADDR, dst_addr, protocol),
            transport,
        },
        payload,
    )
}

/// Resolves an address in the ARP cache as if a request had been answered.
pub fn resolve(interface: &mut TestInterface, ipv4_addr: Ipv4Address, eth_addr: EthernetAddress) {
    interface.arp_cache.set_eth_addr_for_ip(ipv4_addr, eth_addr);
}

pub fn random_payload(len: usize) -> Vec<u8> {
    (0 .. len).map(|_| rand::random::<u8>()).collect()
}
