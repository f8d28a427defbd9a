//! Network interface resolution.
//!
//! A named interface is resolved once at join time into its index (used for
//! the multicast join itself) and the list of addresses the OS reports for
//! it (iterated for diagnostics and the per-address join pass).

use std::net::IpAddr;

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;

/// Error resolving a named interface.
#[derive(Debug, Error)]
pub enum InterfaceError {
    /// The name did not resolve to an interface index.
    #[error("interface {name} not found: {source}")]
    NotFound {
        name: String,
        source: std::io::Error,
    },
    /// The OS address listing could not be produced.
    #[error("failed to enumerate interface addresses: {0}")]
    Enumeration(#[from] local_ip_address::Error),
    /// The probe socket for the index lookup could not be opened.
    #[error("failed to open interface probe socket: {0}")]
    Probe(std::io::Error),
}

/// A resolved network interface.
///
/// Snapshot taken at resolution time; the interface itself belongs to the
/// OS and is only referenced by index afterwards.
#[derive(Debug)]
pub struct Interface {
    name: String,
    index: u32,
    addrs: Vec<IpAddr>,
}

impl Interface {
    /// Resolves an interface by name.
    ///
    /// The index lookup goes through a short-lived probe socket; the
    /// address list comes from the OS interface enumeration, filtered to
    /// entries carrying this name. An interface with no configured
    /// addresses resolves successfully with an empty list.
    ///
    /// # Errors
    ///
    /// [`InterfaceError::NotFound`] if the name does not resolve,
    /// [`InterfaceError::Enumeration`] if the address listing fails.
    pub fn resolve(name: &str) -> Result<Self, InterfaceError> {
        let probe = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(InterfaceError::Probe)?;
        let index =
            rustix::net::netdevice::name_to_index(&probe, name).map_err(|e| {
                InterfaceError::NotFound {
                    name: name.to_owned(),
                    source: e.into(),
                }
            })?;

        let mut addrs = Vec::new();
        for (ifname, addr) in local_ip_address::list_afinet_netifas()? {
            if ifname == name {
                addrs.push(addr);
            }
        }

        Ok(Self {
            name: name.to_owned(),
            index,
            addrs,
        })
    }

    /// Returns the interface name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the OS interface index.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Returns the addresses the OS reported for this interface.
    #[must_use]
    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }
}
