#[macro_use]
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate lazy_static;
extern crate tinynet;

mod env;

use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::thread;
use std::time::Duration;

use tinynet::linux::Tap;
use tinynet::net::repr::ethernet::MAX_FRAME_LEN;
use tinynet::net::repr::Ipv4Address;
use tinynet::net::service::{
    self,
    udp,
    Interface,
};
use tinynet::net::time::SystemEnv;

use crate::env::App;

static PORT: AtomicUsize = AtomicUsize::new(0);

/// Echoes a datagram to the sender if it was sent to the bound port.
fn echo(
    interface: &mut Interface<Tap, SystemEnv>,
    src_addr: Ipv4Address,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) {
    if dst_port as usize != PORT.load(Ordering::Relaxed) {
        return;
    }

    println!("{} bytes from {}:{}", payload.len(), src_addr, src_port);

    if let Err(err) = udp::send_datagram(interface, src_addr, src_port, dst_port, payload) {
        println!("Dropped echo to {}:{}: {}", src_addr, src_port, err);
    }
}

/// Starts a UDP server that echo's packets to the sender.
fn main() {
    env_logger::init();

    let matches = clap_app!(udp_echo =>
        (@arg PORT: +takes_value +required "UDP port to bind")
    ).with_defaults()
        .get_matches();

    let port = matches
        .value_of("PORT")
        .and_then(|port| port.parse::<u16>().ok())
        .expect("Bad UDP port!");
    PORT.store(port as usize, Ordering::Relaxed);

    let mut interface = env::default_interface(&matches);
    interface.set_udp_handler(echo);

    println!(
        "Running UDP echo server; Use 'ncat -u {} {}' to send packets.",
        *interface.ipv4_addr, port
    );

    let mut rx_buffer = [0; MAX_FRAME_LEN];
    loop {
        if !service::poll(&mut interface, &mut rx_buffer) {
            thread::sleep(Duration::from_millis(1));
        }
    }
}
