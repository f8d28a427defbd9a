//! Multicast group membership.
//!
//! One [`Candidate`] joined on one interface yields one [`JoinedGroup`]
//! owning one socket. Candidates sharing a group address on different ports
//! are independent memberships; nothing is de-duplicated.

use std::net::{AddrParseError, IpAddr, SocketAddr, UdpSocket};
use std::str::FromStr;

use socket2::{Domain, InterfaceIndexOrAddress, Protocol, Socket, Type};
use thiserror::Error;

use crate::net::{Endpoint, Interface};

/// Error joining one candidate group.
///
/// Either kind skips the affected candidate only; sibling candidates are
/// unaffected.
#[derive(Debug, Error)]
pub enum MembershipError {
    /// The local group endpoint could not be bound.
    #[error("failed to bind group endpoint: {0}")]
    Listen(std::io::Error),
    /// The multicast join on the bound socket failed.
    #[error("failed to join multicast group: {0}")]
    Join(std::io::Error),
}

/// A configured (group address, port) pair to join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// Multicast group address, IPv4 or IPv6.
    pub addr: IpAddr,
    /// UDP port the local endpoint is bound to.
    pub port: u16,
}

impl Candidate {
    /// Creates a candidate from a group address and port.
    #[must_use]
    pub const fn new(addr: IpAddr, port: u16) -> Self {
        Self { addr, port }
    }

    /// Returns the local endpoint this candidate binds to.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.addr, self.port)
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.endpoint().fmt(f)
    }
}

impl FromStr for Candidate {
    type Err = AddrParseError;

    /// Parses `"addr:port"` text, IPv6 in brackets (`[ff02::7]:9000`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr: SocketAddr = s.parse()?;
        Ok(Self::new(addr.ip(), addr.port()))
    }
}

/// A successfully joined group: the candidate plus the bound socket.
///
/// The socket is handed to exactly one receive loop and lives as long as
/// that loop runs.
#[derive(Debug)]
pub struct JoinedGroup {
    candidate: Candidate,
    socket: UdpSocket,
}

impl JoinedGroup {
    /// Returns the candidate this membership was created from.
    #[must_use]
    pub const fn candidate(&self) -> Candidate {
        self.candidate
    }

    /// Consumes the membership, releasing the joined socket.
    #[must_use]
    pub fn into_socket(self) -> UdpSocket {
        self.socket
    }
}

/// Joins one candidate group on the given interface.
///
/// Opens a UDP socket of the candidate's family, binds it to the group
/// endpoint, then issues the multicast join bound to the interface index
/// and the group address (the port plays no part in the join itself). A
/// failed join closes the just-bound socket before returning.
///
/// # Errors
///
/// [`MembershipError::Listen`] if the bind fails (e.g. the port is already
/// taken), [`MembershipError::Join`] if the group join fails (e.g. the
/// address is not a multicast address).
pub fn join_group(iface: &Interface, candidate: &Candidate) -> Result<JoinedGroup, MembershipError> {
    let endpoint = candidate.endpoint();

    let domain = match candidate.addr {
        IpAddr::V4(_) => Domain::IPV4,
        IpAddr::V6(_) => Domain::IPV6,
    };
    let socket =
        Socket::new(domain, Type::DGRAM, Some(Protocol::UDP)).map_err(MembershipError::Listen)?;
    if matches!(candidate.addr, IpAddr::V6(_)) {
        socket.set_only_v6(true).map_err(MembershipError::Listen)?;
    }
    socket
        .bind(&endpoint.as_socket_addr().into())
        .map_err(MembershipError::Listen)?;

    match candidate.addr {
        IpAddr::V4(group) => socket
            .join_multicast_v4_n(&group, &InterfaceIndexOrAddress::Index(iface.index()))
            .map_err(MembershipError::Join)?,
        IpAddr::V6(group) => socket
            .join_multicast_v6(&group, iface.index())
            .map_err(MembershipError::Join)?,
    }

    Ok(JoinedGroup {
        candidate: *candidate,
        socket: socket.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn candidate_parses_v4() {
        let candidate: Candidate = "224.0.0.1:8025".parse().unwrap();
        assert_eq!(candidate.addr, IpAddr::V4(Ipv4Addr::new(224, 0, 0, 1)));
        assert_eq!(candidate.port, 8025);
    }

    #[test]
    fn candidate_parses_bracketed_v6() {
        let candidate: Candidate = "[ff02::123]:9000".parse().unwrap();
        assert_eq!(
            candidate.addr,
            IpAddr::V6(Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0x123))
        );
        assert_eq!(candidate.port, 9000);
    }

    #[test]
    fn candidate_rejects_garbage() {
        assert!("not-an-endpoint".parse::<Candidate>().is_err());
    }

    #[test]
    fn candidate_display_matches_endpoint_form() {
        let v4 = Candidate::new(IpAddr::V4(Ipv4Addr::new(224, 0, 0, 1)), 1235);
        assert_eq!(v4.to_string(), "224.0.0.1:1235");

        let v6 = Candidate::new(IpAddr::V6(Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 7)), 9000);
        assert_eq!(v6.to_string(), "[ff02::7]:9000");
    }
}
