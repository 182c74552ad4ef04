//! Core, platform independent networking code.

pub mod arp_cache;
pub mod check;
pub mod codec;
pub mod dev;
pub mod repr;
pub mod service;
pub mod time;
