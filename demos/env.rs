use std::str::FromStr;

use tinynet::linux::Tap;
use tinynet::net::repr::{
    EthernetAddress,
    Ipv4Address,
    Ipv4AddressCidr,
};
use tinynet::net::service::{
    Config,
    Interface,
};
use tinynet::net::time::SystemEnv;

lazy_static! {
    /// Default interface IPv4 address with a subnet mask.
    pub static ref DEFAULT_IPV4_ADDR_CIDR: Ipv4AddressCidr = {
        Ipv4AddressCidr::new(Ipv4Address::new([10, 0, 0, 102]), 24)
    };

    /// Default interface IPv4 gateway.
    pub static ref DEFAULT_IPV4_GATEWAY: Ipv4Address = {
        Ipv4Address::new([10, 0, 0, 101])
    };

    /// Default interface MAC address.
    pub static ref DEFAULT_ETH_ADDR: EthernetAddress = {
        // Use a local MAC address!
        EthernetAddress::new([0x06, 0x11, 0x22, 0x33, 0x44, 0x55])
    };
}

pub trait App {
    fn with_defaults(self) -> Self;
}

impl<'a, 'b> App for clap::App<'a, 'b> {
    fn with_defaults(self) -> Self {
        self.arg(
            clap::Arg::with_name("tap")
                .long("tap")
                .value_name("TAP")
                .help("Linux TAP interface")
                .default_value("tap0")
                .takes_value(true),
        ).arg(
                clap::Arg::with_name("mac")
                    .long("mac")
                    .value_name("MAC")
                    .help("MAC address of the interface")
                    .takes_value(true),
            )
            .arg(
                clap::Arg::with_name("ipv4")
                    .long("ipv4")
                    .value_name("IPV4/N")
                    .help("IPv4 address and subnet of the interface")
                    .takes_value(true),
            )
            .arg(
                clap::Arg::with_name("gateway")
                    .long("gateway")
                    .value_name("IPV4")
                    .help("IPv4 address of the default gateway")
                    .takes_value(true),
            )
            .arg(
                clap::Arg::with_name("broadcast")
                    .long("broadcast")
                    .help("Accept UDP datagrams sent to broadcast addresses"),
            )
    }
}

fn value_or<T: FromStr + Copy>(matches: &clap::ArgMatches, name: &str, default: T) -> T {
    match matches.value_of(name) {
        Some(value) => value
            .parse::<T>()
            .unwrap_or_else(|_| panic!("Bad value '{}' for --{}!", value, name)),
        None => default,
    }
}

/// Creates an interface config from command line arguments.
pub fn config(matches: &clap::ArgMatches) -> Config {
    let mut config = Config::new(
        value_or(matches, "mac", *DEFAULT_ETH_ADDR),
        value_or(matches, "ipv4", *DEFAULT_IPV4_ADDR_CIDR),
        value_or(matches, "gateway", *DEFAULT_IPV4_GATEWAY),
    );
    config.accept_broadcast = matches.is_present("broadcast");
    config
}

/// Creates and brings up a network interface on a TAP. See tap.sh for more
/// info.
pub fn default_interface(matches: &clap::ArgMatches) -> Interface<Tap, SystemEnv> {
    let ifr_name = matches.value_of("tap").unwrap_or("tap0");
    let tap = Tap::new(ifr_name).unwrap_or_else(|err| panic!("Opening {}: {:?}", ifr_name, err));

    let mut interface = Interface::new(tap, config(matches), SystemEnv::new());
    interface
        .init()
        .unwrap_or_else(|err| panic!("Bringing up {}: {}", ifr_name, err));

    let link = if interface.link_up() { "UP" } else { "DOWN" };
    println!(
        "Interface: (TAP = {}, MAC = {}, IPv4 = {}, Gateway: {}, Link: {})",
        ifr_name, interface.ethernet_addr, interface.ipv4_addr, interface.default_gateway, link,
    );

    interface
}
