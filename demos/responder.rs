#[macro_use]
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate lazy_static;
extern crate tinynet;

mod env;

use std::thread;
use std::time::{
    Duration,
    Instant,
};

use tinynet::net::repr::ethernet::MAX_FRAME_LEN;
use tinynet::net::service::{
    self,
    icmpv4,
};

use crate::env::App;

lazy_static! {
    static ref PING_INTERVAL: Duration = Duration::from_secs(1);
}

/// Answers ARP requests and pings, optionally pinging the default gateway.
fn main() {
    env_logger::init();

    let matches = clap_app!(responder =>
        (@arg PING: --ping "Ping the default gateway every second")
    ).with_defaults()
        .get_matches();

    let mut interface = env::default_interface(&matches);
    let mut rx_buffer = [0; MAX_FRAME_LEN];

    let ping = matches.is_present("PING");
    let mut ping_sent: Option<(u16, Instant)> = None;
    let mut seq: u16 = 0;

    println!(
        "Responding to ARP and ping; Use 'ping {}' to test.",
        *interface.ipv4_addr
    );

    loop {
        if !service::poll(&mut interface, &mut rx_buffer) {
            thread::sleep(Duration::from_millis(1));
        }

        if let Some(reply) = interface.take_echo_reply() {
            if let Some((sent_seq, sent_at)) = ping_sent {
                if reply.seq == sent_seq {
                    println!(
                        "Reply from {}: seq={} time={:?}",
                        reply.src_addr,
                        reply.seq,
                        sent_at.elapsed()
                    );
                }
            }
        }

        let due = match ping_sent {
            Some((_, sent_at)) => sent_at.elapsed() >= *PING_INTERVAL,
            None => true,
        };

        if ping && due {
            seq = seq.wrapping_add(1);
            let gateway = interface.default_gateway;
            match icmpv4::send_echo_request(&mut interface, gateway, 0x7E57, seq, &[0; 32]) {
                Ok(_) => {}
                Err(err) => println!("Ping {} seq={}: {}", gateway, seq, err),
            }
            ping_sent = Some((seq, Instant::now()));
        }
    }
}
