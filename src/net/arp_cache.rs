use core::time::Duration;

use crate::net::repr::{
    EthernetAddress,
    Ipv4Address,
};
use crate::net::time::{
    Env,
    Instant,
};

/// Maximum number of IPv4 -> Ethernet address mappings held at once.
pub const ARP_CACHE_ENTRIES: usize = 4;

#[derive(Clone, Copy, Debug)]
struct Entry {
    ipv4_addr: Ipv4Address,
    eth_addr: EthernetAddress,
    in_cache_since: Instant,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    ipv4_addr: Ipv4Address,
    last_request: Instant,
}

/// Maintains an expiring, fixed size set of IPv4 -> Ethernet address mappings,
/// along with the one address currently being resolved.
#[derive(Debug)]
pub struct ArpCache<E: Env> {
    entries: [Option<Entry>; ARP_CACHE_ENTRIES],
    pending: Option<Pending>,
    expiration: Duration,
    retry: Duration,
    time_env: E,
}

impl<E: Env> ArpCache<E> {
    /// Creates an ARP cache where mappings expire after expiration, and
    /// requests for the same address are repeated at most once per retry.
    pub fn new(expiration: Duration, retry: Duration, time_env: E) -> ArpCache<E> {
        ArpCache {
            entries: [None; ARP_CACHE_ENTRIES],
            pending: None,
            expiration,
            retry,
            time_env,
        }
    }

    /// Lookup the Ethernet address for an IPv4 address.
    pub fn eth_addr_for_ip(&mut self, ipv4_addr: Ipv4Address) -> Option<EthernetAddress> {
        self.expire_eth_addr();

        self.entries
            .iter()
            .filter_map(|entry| *entry)
            .find(|entry| entry.ipv4_addr == ipv4_addr)
            .map(|entry| entry.eth_addr)
    }

    /// Create or update the Ethernet address mapping for an IPv4 address.
    ///
    /// When the cache is full, the entry resolved least recently is replaced.
    pub fn set_eth_addr_for_ip(&mut self, ipv4_addr: Ipv4Address, eth_addr: EthernetAddress) {
        self.expire_eth_addr();

        let in_cache_since = self.time_env.now_instant();

        if self.is_pending(ipv4_addr) {
            self.pending = None;
        }

        let slot = self.slot_for(ipv4_addr);
        if let Some(ref evicted) = self.entries[slot] {
            if evicted.ipv4_addr != ipv4_addr {
                debug!("Evicting {} from the ARP cache.", evicted.ipv4_addr);
            }
        }

        self.entries[slot] = Some(Entry {
            ipv4_addr,
            eth_addr,
            in_cache_since,
        });
    }

    /// Updates the mapping for an IPv4 address only if one already exists,
    /// returning whether it did.
    pub fn refresh(&mut self, ipv4_addr: Ipv4Address, eth_addr: EthernetAddress) -> bool {
        if self.eth_addr_for_ip(ipv4_addr).is_some() {
            self.set_eth_addr_for_ip(ipv4_addr, eth_addr);
            true
        } else {
            false
        }
    }

    /// Checks if a request for an IPv4 address is outstanding.
    pub fn is_pending(&self, ipv4_addr: Ipv4Address) -> bool {
        match self.pending {
            Some(ref pending) => pending.ipv4_addr == ipv4_addr,
            None => false,
        }
    }

    /// Checks if a request should be sent for an IPv4 address, and if so marks
    /// the address as pending as of now.
    ///
    /// A request for the address being resolved is repeated only once the
    /// retry interval has elapsed. A request for any other address takes over
    /// the pending slot.
    pub fn should_request(&mut self, ipv4_addr: Ipv4Address) -> bool {
        let now = self.time_env.now_instant();

        match self.pending {
            Some(ref pending)
                if pending.ipv4_addr == ipv4_addr
                    && now.duration_since(pending.last_request) < self.retry =>
            {
                false
            }
            _ => {
                self.pending = Some(Pending {
                    ipv4_addr,
                    last_request: now,
                });
                true
            }
        }
    }

    pub fn now(&self) -> Instant {
        self.time_env.now_instant()
    }

    pub fn time_env_mut(&mut self) -> &mut E {
        &mut self.time_env
    }

    /// Returns the slot for a mapping: the existing one, an empty one, or the
    /// oldest one.
    fn slot_for(&self, ipv4_addr: Ipv4Address) -> usize {
        let existing = self.entries.iter().position(|entry| match *entry {
            Some(ref entry) => entry.ipv4_addr == ipv4_addr,
            None => false,
        });
        let empty = || self.entries.iter().position(|entry| entry.is_none());
        let oldest = || {
            self.entries
                .iter()
                .enumerate()
                .filter_map(|(i, entry)| entry.map(|entry| (i, entry.in_cache_since)))
                .min_by_key(|&(_, in_cache_since)| in_cache_since)
                .map(|(i, _)| i)
                .unwrap_or(0)
        };

        existing.or_else(empty).unwrap_or_else(oldest)
    }

    /// Purge Ethernet address mappings that have expired.
    fn expire_eth_addr(&mut self) {
        let now = self.time_env.now_instant();
        let expiration = self.expiration;

        for slot in self.entries.iter_mut() {
            let expired = match *slot {
                Some(ref entry) => now.duration_since(entry.in_cache_since) > expiration,
                None => false,
            };
            if expired {
                *slot = None;
            }
        }
    }
}
