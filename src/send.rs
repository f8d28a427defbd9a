//! One-shot outbound datagram helpers.
//!
//! These are fire-and-forget: each call dials a fresh socket, sends one
//! payload, and drops the socket.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};

use crate::group::membership::Candidate;
use crate::net::Interface;

/// Sends one datagram to `target` over a freshly dialed socket.
///
/// The socket is bound to the unspecified address of the target's family,
/// connected, used for a single send, and closed on return.
///
/// # Errors
///
/// Returns an error if the target resolves to no addresses or any of the
/// socket operations fail.
pub fn send_once<A: ToSocketAddrs>(target: A, payload: &[u8]) -> io::Result<usize> {
    let addr = target.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "target resolved to no addresses",
        )
    })?;
    let bind = match addr {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    };
    let socket = UdpSocket::bind(bind)?;
    socket.connect(addr)?;
    socket.send(payload)
}

/// Sends one datagram to a multicast group, routed via `iface`.
///
/// Multicast loopback is enabled so listeners on the sending host receive
/// the datagram too; the integration tests and the demo greeting rely on
/// this.
///
/// # Errors
///
/// Returns an error if the interface carries no address of the group's
/// family or a socket operation fails.
pub fn send_to_group(candidate: &Candidate, iface: &Interface, payload: &[u8]) -> io::Result<usize> {
    let dest = candidate.endpoint().as_socket_addr().into();
    match candidate.addr {
        IpAddr::V4(_) => {
            let local = iface
                .addrs()
                .iter()
                .find_map(|a| match a {
                    IpAddr::V4(v4) => Some(*v4),
                    IpAddr::V6(_) => None,
                })
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::AddrNotAvailable,
                        "interface has no IPv4 address",
                    )
                })?;
            let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
            socket.set_multicast_if_v4(&local)?;
            socket.set_multicast_loop_v4(true)?;
            socket.send_to(payload, &dest)
        }
        IpAddr::V6(_) => {
            let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
            socket.set_multicast_if_v6(iface.index())?;
            socket.set_multicast_loop_v6(true)?;
            socket.send_to(payload, &dest)
        }
    }
}
