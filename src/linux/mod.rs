//! Host side pieces for running the stack on Linux.

pub mod libc;
pub mod tap;

pub use self::tap::Tap;
