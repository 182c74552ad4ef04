use std::io;

use crate::linux::libc as _libc;
use crate::net::dev::{
    Driver,
    Error,
    Result,
};
use crate::net::repr::EthernetAddress;

/// [TAP interface](https://www.kernel.org/doc/Documentation/networking/tuntap.txt)
/// for sending and receiving raw ethernet frames.
///
/// The TAP is opened non-blocking, so `receive(...)` returns 0 when nothing is
/// waiting, matching a chip polled over a bus.
#[derive(Debug)]
pub struct Tap {
    tapfd: libc::c_int,
    ifreq: _libc::c_ifreq,
}

impl Tap {
    /// Creates or binds to an existing TAP interface with the specified name.
    pub fn new(ifr_name: &str) -> Result<Tap> {
        let ifreq = _libc::c_ifreq::with_name(ifr_name);

        unsafe {
            let tapfd = libc::open(
                "/dev/net/tun\0".as_ptr() as *const libc::c_char,
                libc::O_RDWR | libc::O_NONBLOCK,
            );

            if tapfd < 0 {
                return Err(Error::IO(io::Error::last_os_error()));
            }

            let mut _ifreq = ifreq;
            _ifreq.ifr_flags = _libc::IFF_TAP | _libc::IFF_NO_PI;
            if libc::ioctl(tapfd, _libc::TUNSETIFF, &mut _ifreq as *mut _libc::c_ifreq) == -1 {
                let err = io::Error::last_os_error();
                libc::close(tapfd);
                return Err(Error::IO(err));
            }

            Ok(Tap { tapfd, ifreq })
        }
    }

    fn flags(&self) -> io::Result<libc::c_short> {
        unsafe {
            let sockfd = libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0);

            if sockfd == -1 {
                return Err(io::Error::last_os_error());
            }

            let mut _ifreq = self.ifreq;
            let result = libc::ioctl(
                sockfd,
                _libc::SIOCGIFFLAGS,
                &mut _ifreq as *mut _libc::c_ifreq,
            );
            let err = io::Error::last_os_error();
            libc::close(sockfd);

            if result == -1 {
                Err(err)
            } else {
                Ok(_ifreq.ifr_flags)
            }
        }
    }
}

impl Driver for Tap {
    /// The TAP is created up front and the kernel filters nothing, so there
    /// is nothing to program.
    fn init(&mut self, ethernet_addr: EthernetAddress) -> Result<()> {
        debug!("TAP ready for {}.", ethernet_addr);
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<usize> {
        unsafe {
            let wrote = libc::write(
                self.tapfd,
                frame.as_ptr() as *const libc::c_void,
                frame.len(),
            );

            if wrote < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::WouldBlock {
                    Err(Error::Busy)
                } else {
                    Err(Error::IO(err))
                }
            } else {
                Ok(wrote as usize)
            }
        }
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize> {
        unsafe {
            let read = libc::read(
                self.tapfd,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len(),
            );

            if read < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::WouldBlock {
                    Ok(0)
                } else {
                    Err(Error::IO(err))
                }
            } else {
                Ok(read as usize)
            }
        }
    }

    fn link_up(&mut self) -> bool {
        match self.flags() {
            Ok(flags) => flags & (libc::IFF_UP as libc::c_short) != 0,
            Err(err) => {
                warn!("Error querying TAP flags with {}.", err);
                false
            }
        }
    }
}

impl Drop for Tap {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.tapfd);
        }
    }
}
