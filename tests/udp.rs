#[macro_use]
extern crate assert_matches;
extern crate env_logger;
#[macro_use]
extern crate lazy_static;
extern crate rand;
extern crate tinynet;

mod context;

use std::cell::RefCell;

use tinynet::net::codec::{
    Headers,
    Transport,
};
use tinynet::net::repr::{
    EthernetAddress,
    Ipv4Address,
    UdpPacket,
    UdpRepr,
};
use tinynet::net::service::udp;
use tinynet::Error;

use context::*;

type Datagram = (Ipv4Address, u16, u16, Vec<u8>);

thread_local! {
    static RECEIVED: RefCell<Vec<(&'static str, Datagram)>> = RefCell::new(Vec::new());
}

fn record(name: &'static str, src_addr: Ipv4Address, src_port: u16, dst_port: u16, payload: &[u8]) {
    RECEIVED.with(|received| {
        received
            .borrow_mut()
            .push((name, (src_addr, src_port, dst_port, payload.to_vec())))
    });
}

fn first_handler(_: &mut TestInterface, src_addr: Ipv4Address, src_port: u16, dst_port: u16, payload: &[u8]) {
    record("first", src_addr, src_port, dst_port, payload);
}

fn second_handler(_: &mut TestInterface, src_addr: Ipv4Address, src_port: u16, dst_port: u16, payload: &[u8]) {
    record("second", src_addr, src_port, dst_port, payload);
}

fn echo_handler(
    interface: &mut TestInterface,
    src_addr: Ipv4Address,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) {
    udp::send_datagram(interface, src_addr, src_port, dst_port, payload).unwrap();
}

fn received() -> Vec<(&'static str, Datagram)> {
    RECEIVED.with(|received| received.borrow_mut().drain(..).collect())
}

fn datagram(dst_addr: Ipv4Address, src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    ipv4_frame(
        dst_addr,
        Transport::Udp(UdpRepr {
            src_port,
            dst_port,
            length: 0,
        }),
        payload,
    )
}

fn expect_udp(frame: &[u8]) -> (Headers, UdpRepr, Vec<u8>) {
    let (headers, payload) = decode(frame);
    let udp_repr = match headers {
        Headers::Ipv4 {
            transport: Transport::Udp(udp_repr),
            ..
        } => udp_repr,
        _ => panic!("Expected UDP, got {:?}.", headers),
    };
    (headers, udp_repr, payload)
}

#[test]
fn delivers_datagram_to_handler() {
    context::run(|interface| {
        interface.set_udp_handler(first_handler);

        let payload = random_payload(rand::random::<u8>() as usize);
        assert!(recv(interface, datagram(*IPV4_ADDR, 5000, 6000, &payload)));

        assert_eq!(
            received(),
            vec![("first", (*PEER_IPV4_ADDR, 5000, 6000, payload))]
        );
        assert!(sent(interface).is_empty());
    });
}

#[test]
fn delivers_empty_datagram() {
    context::run(|interface| {
        interface.set_udp_handler(first_handler);
        recv(interface, datagram(*IPV4_ADDR, 1, 2, &[]));
        assert_eq!(received(), vec![("first", (*PEER_IPV4_ADDR, 1, 2, vec![]))]);
    });
}

#[test]
fn delivers_datagram_without_checksum() {
    context::run(|interface| {
        interface.set_udp_handler(first_handler);

        let mut frame = datagram(*IPV4_ADDR, 5000, 6000, b"no checksum");
        {
            let mut udp_packet = UdpPacket::try_new(&mut frame[34 ..]).unwrap();
            udp_packet.set_checksum(0);
        }
        recv(interface, frame);

        assert_eq!(received().len(), 1);
    });
}

#[test]
fn drops_datagram_without_handler() {
    context::run(|interface| {
        assert!(recv(interface, datagram(*IPV4_ADDR, 5000, 6000, b"hello")));
        assert!(sent(interface).is_empty());

        interface.set_udp_handler(first_handler);
        interface.clear_udp_handler();
        assert!(recv(interface, datagram(*IPV4_ADDR, 5000, 6000, b"hello")));
        assert!(received().is_empty());
        assert!(sent(interface).is_empty());
    });
}

#[test]
fn replaces_handler() {
    context::run(|interface| {
        interface.set_udp_handler(first_handler);
        interface.set_udp_handler(second_handler);

        recv(interface, datagram(*IPV4_ADDR, 5000, 6000, b"hello"));

        assert_eq!(
            received(),
            vec![("second", (*PEER_IPV4_ADDR, 5000, 6000, b"hello".to_vec()))]
        );
    });
}

#[test]
fn handler_can_reply() {
    context::run(|interface| {
        resolve(interface, *PEER_IPV4_ADDR, *PEER_ETH_ADDR);
        interface.set_udp_handler(echo_handler);

        let payload = random_payload(100);
        recv(interface, datagram(*IPV4_ADDR, 5000, 7, &payload));

        let frames = sent(interface);
        assert_eq!(frames.len(), 1);
        let (headers, udp_repr, reply_payload) = expect_udp(&frames[0]);
        assert_eq!(headers.ethernet().dst_addr, *PEER_ETH_ADDR);
        assert_eq!(udp_repr.src_port, 7);
        assert_eq!(udp_repr.dst_port, 5000);
        assert_eq!(reply_payload, payload);
    });
}

#[test]
fn ignores_broadcast_by_default() {
    context::run(|interface| {
        interface.set_udp_handler(first_handler);
        recv(interface, datagram(Ipv4Address::BROADCAST, 68, 67, b"discover"));
        recv(
            interface,
            datagram(Ipv4Address::new([192, 168, 1, 255]), 68, 67, b"discover"),
        );
        assert!(received().is_empty());
    });
}

#[test]
fn delivers_broadcast_when_accepted() {
    let mut config = config();
    config.accept_broadcast = true;

    context::run_with_config(config, |interface| {
        interface.set_udp_handler(first_handler);
        recv(interface, datagram(Ipv4Address::BROADCAST, 68, 67, b"a"));
        recv(
            interface,
            datagram(Ipv4Address::new([192, 168, 1, 255]), 68, 67, b"b"),
        );
        recv(
            interface,
            datagram(Ipv4Address::new([192, 168, 2, 255]), 68, 67, b"c"),
        );

        let received: Vec<Vec<u8>> = received()
            .into_iter()
            .map(|(_, (_, _, _, payload))| payload)
            .collect();
        assert_eq!(received, vec![b"a".to_vec(), b"b".to_vec()]);
    });
}

#[test]
fn sends_datagram_on_link() {
    context::run(|interface| {
        let payload = random_payload(200);

        let result = udp::send_datagram(interface, *PEER_IPV4_ADDR, 6000, 5000, &payload);
        assert_matches!(result, Err(Error::MacResolution(addr)) if addr == *PEER_IPV4_ADDR);
        sent(interface);

        let reply = arp_frame(
            tinynet::net::repr::ArpOp::Reply,
            (*PEER_ETH_ADDR, *PEER_IPV4_ADDR),
            *IPV4_ADDR,
        );
        recv(interface, reply);

        udp::send_datagram(interface, *PEER_IPV4_ADDR, 6000, 5000, &payload).unwrap();
        let frames = sent(interface);
        assert_eq!(frames.len(), 1);

        let (headers, udp_repr, sent_payload) = expect_udp(&frames[0]);
        match headers {
            Headers::Ipv4 { ethernet, ipv4, .. } => {
                assert_eq!(ethernet.dst_addr, *PEER_ETH_ADDR);
                assert_eq!(ethernet.src_addr, *ETH_ADDR);
                assert_eq!(ipv4.src_addr, *IPV4_ADDR);
                assert_eq!(ipv4.dst_addr, *PEER_IPV4_ADDR);
                assert_eq!(ipv4.payload_len, 208);
                assert!(!ipv4.more_fragments);
            }
            _ => unreachable!(),
        }
        assert_eq!(
            udp_repr,
            UdpRepr {
                src_port: 5000,
                dst_port: 6000,
                length: 208,
            }
        );
        assert_eq!(sent_payload, payload);
    });
}

#[test]
fn sends_datagram_to_broadcast_without_arp() {
    context::run(|interface| {
        udp::send_datagram(interface, Ipv4Address::BROADCAST, 67, 68, b"discover").unwrap();
        udp::send_datagram(interface, Ipv4Address::new([192, 168, 1, 255]), 67, 68, b"x").unwrap();

        let frames = sent(interface);
        assert_eq!(frames.len(), 2);
        for frame in frames.iter() {
            let (headers, _, _) = expect_udp(frame);
            assert_eq!(headers.ethernet().dst_addr, EthernetAddress::BROADCAST);
        }
    });
}

#[test]
fn identification_changes_per_packet() {
    context::run(|interface| {
        resolve(interface, *PEER_IPV4_ADDR, *PEER_ETH_ADDR);
        udp::send_datagram(interface, *PEER_IPV4_ADDR, 1, 1, b"a").unwrap();
        udp::send_datagram(interface, *PEER_IPV4_ADDR, 1, 1, b"b").unwrap();

        let ids: Vec<u16> = sent(interface)
            .iter()
            .map(|frame| match decode(frame).0 {
                Headers::Ipv4 { ipv4, .. } => ipv4.identification,
                _ => unreachable!(),
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
    });
}

#[test]
fn rejects_oversized_datagram() {
    context::run(|interface| {
        resolve(interface, *PEER_IPV4_ADDR, *PEER_ETH_ADDR);
        let payload = vec![0; 1500];
        assert_matches!(
            udp::send_datagram(interface, *PEER_IPV4_ADDR, 1, 1, &payload),
            Err(Error::Exhausted)
        );
        assert!(sent(interface).is_empty());
    });
}
