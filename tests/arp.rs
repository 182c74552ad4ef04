#[macro_use]
extern crate assert_matches;
extern crate env_logger;
#[macro_use]
extern crate lazy_static;
extern crate rand;
extern crate tinynet;

mod context;

use std::time::Duration;

use tinynet::net::codec::Headers;
use tinynet::net::repr::{
    eth_types,
    Arp,
    ArpOp,
    EthernetAddress,
    EthernetRepr,
    Ipv4Address,
};
use tinynet::net::service::udp;
use tinynet::Error;

use context::*;

fn expect_arp(frame: &[u8]) -> (EthernetRepr, Arp) {
    match decode(frame).0 {
        Headers::Arp { ethernet, arp } => (ethernet, arp),
        headers => panic!("Expected ARP, got {:?}.", headers),
    }
}

#[test]
fn replies_to_request_for_own_address() {
    context::run(|interface| {
        let request = arp_frame(ArpOp::Request, (*PEER_ETH_ADDR, *PEER_IPV4_ADDR), *IPV4_ADDR);
        assert!(recv(interface, request));

        let frames = sent(interface);
        assert_eq!(frames.len(), 1);

        let (ethernet, arp) = expect_arp(&frames[0]);
        assert_eq!(
            ethernet,
            EthernetRepr {
                dst_addr: *PEER_ETH_ADDR,
                src_addr: *ETH_ADDR,
                payload_type: eth_types::ARP,
            }
        );
        assert_eq!(
            arp,
            Arp {
                op: ArpOp::Reply,
                source_hw_addr: *ETH_ADDR,
                source_proto_addr: Ipv4Address::new([192, 168, 1, 10]),
                target_hw_addr: *PEER_ETH_ADDR,
                target_proto_addr: Ipv4Address::new([192, 168, 1, 50]),
            }
        );
    });
}

#[test]
fn replies_are_padded_to_minimum_frame() {
    context::run(|interface| {
        let request = arp_frame(ArpOp::Request, (*PEER_ETH_ADDR, *PEER_IPV4_ADDR), *IPV4_ADDR);
        recv(interface, request);

        let frames = sent(interface);
        assert_eq!(frames[0].len(), 60);
        assert!(frames[0][42 ..].iter().all(|byte| *byte == 0));
    });
}

#[test]
fn ignores_request_for_other_address() {
    context::run(|interface| {
        let request = arp_frame(
            ArpOp::Request,
            (*PEER_ETH_ADDR, *PEER_IPV4_ADDR),
            Ipv4Address::new([192, 168, 1, 11]),
        );
        assert!(recv(interface, request));
        assert!(sent(interface).is_empty());
    });
}

#[test]
fn request_does_not_add_mapping() {
    context::run(|interface| {
        let request = arp_frame(ArpOp::Request, (*PEER_ETH_ADDR, *PEER_IPV4_ADDR), *IPV4_ADDR);
        recv(interface, request);
        assert_matches!(interface.arp_cache.eth_addr_for_ip(*PEER_IPV4_ADDR), None);
    });
}

#[test]
fn request_refreshes_existing_mapping() {
    context::run(|interface| {
        resolve(interface, *PEER_IPV4_ADDR, *GATEWAY_ETH_ADDR);

        let request = arp_frame(
            ArpOp::Request,
            (*PEER_ETH_ADDR, *PEER_IPV4_ADDR),
            Ipv4Address::new([192, 168, 1, 99]),
        );
        recv(interface, request);

        assert_eq!(
            interface.arp_cache.eth_addr_for_ip(*PEER_IPV4_ADDR),
            Some(*PEER_ETH_ADDR)
        );
    });
}

#[test]
fn resolves_gateway_for_off_link_destination() {
    context::run(|interface| {
        assert_matches!(interface.gateway_eth_addr(), None);

        let result = udp::send_datagram(interface, *REMOTE_IPV4_ADDR, 53, 4000, b"query");
        assert_matches!(result, Err(Error::MacResolution(addr)) if addr == *GATEWAY_IPV4_ADDR);

        let frames = sent(interface);
        assert_eq!(frames.len(), 1);
        let (ethernet, arp) = expect_arp(&frames[0]);
        assert_eq!(ethernet.dst_addr, EthernetAddress::BROADCAST);
        assert_eq!(ethernet.src_addr, *ETH_ADDR);
        assert_eq!(arp.op, ArpOp::Request);
        assert_eq!(arp.source_hw_addr, *ETH_ADDR);
        assert_eq!(arp.source_proto_addr, *IPV4_ADDR);
        assert_eq!(arp.target_proto_addr, *GATEWAY_IPV4_ADDR);

        let reply = arp_frame(ArpOp::Reply, (*GATEWAY_ETH_ADDR, *GATEWAY_IPV4_ADDR), *IPV4_ADDR);
        recv(interface, reply);
        assert_eq!(interface.gateway_eth_addr(), Some(*GATEWAY_ETH_ADDR));

        udp::send_datagram(interface, *REMOTE_IPV4_ADDR, 53, 4000, b"query").unwrap();
        let frames = sent(interface);
        assert_eq!(frames.len(), 1);
        assert_matches!(
            decode(&frames[0]).0,
            Headers::Ipv4 { ethernet, .. } if ethernet.dst_addr == *GATEWAY_ETH_ADDR
        );
    });
}

#[test]
fn ignores_unsolicited_reply() {
    context::run(|interface| {
        let reply = arp_frame(ArpOp::Reply, (*PEER_ETH_ADDR, *PEER_IPV4_ADDR), *IPV4_ADDR);
        recv(interface, reply);

        assert_matches!(interface.arp_cache.eth_addr_for_ip(*PEER_IPV4_ADDR), None);
        assert!(sent(interface).is_empty());
    });
}

#[test]
fn requests_are_rate_limited() {
    context::run(|interface| {
        for _ in 0 .. 5 {
            let result = udp::send_datagram(interface, *PEER_IPV4_ADDR, 7, 7, b"x");
            assert_matches!(result, Err(Error::MacResolution(_)));
        }
        assert_eq!(sent(interface).len(), 1);

        advance(interface, Duration::from_millis(999));
        let _ = udp::send_datagram(interface, *PEER_IPV4_ADDR, 7, 7, b"x");
        assert!(sent(interface).is_empty());

        advance(interface, Duration::from_millis(1));
        let _ = udp::send_datagram(interface, *PEER_IPV4_ADDR, 7, 7, b"x");
        let frames = sent(interface);
        assert_eq!(frames.len(), 1);
        assert_eq!(expect_arp(&frames[0]).1.target_proto_addr, *PEER_IPV4_ADDR);
    });
}

#[test]
fn mapping_expires() {
    context::run(|interface| {
        let _ = udp::send_datagram(interface, *PEER_IPV4_ADDR, 7, 7, b"x");
        sent(interface);

        let reply = arp_frame(ArpOp::Reply, (*PEER_ETH_ADDR, *PEER_IPV4_ADDR), *IPV4_ADDR);
        recv(interface, reply);

        advance(interface, Duration::from_secs(60));
        udp::send_datagram(interface, *PEER_IPV4_ADDR, 7, 7, b"x").unwrap();
        sent(interface);

        advance(interface, Duration::from_secs(1));
        let result = udp::send_datagram(interface, *PEER_IPV4_ADDR, 7, 7, b"x");
        assert_matches!(result, Err(Error::MacResolution(_)));
        assert_eq!(expect_arp(&sent(interface)[0]).1.op, ArpOp::Request);
    });
}

#[test]
fn ignores_frame_for_other_ethernet_address() {
    context::run(|interface| {
        let mut request =
            arp_frame(ArpOp::Request, (*PEER_ETH_ADDR, *PEER_IPV4_ADDR), *IPV4_ADDR);
        request[.. 6].copy_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x99]);

        assert!(recv(interface, request));
        assert!(sent(interface).is_empty());
    });
}
