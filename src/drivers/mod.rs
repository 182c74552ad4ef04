//! Drivers for Ethernet MAC/PHY chips attached over a `Bus`.

pub mod w5500;

pub use self::w5500::W5500;
