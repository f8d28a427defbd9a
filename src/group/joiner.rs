//! Join orchestration and the receive-loop lifecycle handle.
//!
//! `join_all` performs the whole setup pass synchronously: resolve the
//! interface, walk its addresses, join every candidate, spawn one reader
//! thread per joined group. Setup failures on the interface itself are
//! fatal; everything per-candidate is logged and skipped so one bad
//! candidate never takes down its siblings.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::handler::DatagramHandler;
use crate::net::{Interface, InterfaceError};

use super::membership::{join_group, Candidate};
use super::receiver::ReceiveLoop;

/// Handle to the receive loops spawned by [`join_all`].
///
/// The owning process decides the lifecycle explicitly: [`wait`] parks on
/// the loops (normally forever, since only read errors end them), while
/// [`shutdown`] stops every loop and joins its thread before returning.
/// Dropping the handle raises the stop flag but does not wait.
///
/// [`wait`]: GroupSet::wait
/// [`shutdown`]: GroupSet::shutdown
#[derive(Debug)]
pub struct GroupSet {
    stop: Arc<AtomicBool>,
    groups: Vec<(String, Arc<UdpSocket>)>,
    threads: Vec<JoinHandle<()>>,
}

impl GroupSet {
    /// Returns the number of groups with a running receive loop.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Blocks until every receive loop has exited.
    pub fn wait(mut self) {
        self.join_threads();
    }

    /// Stops every receive loop and waits for its thread to exit.
    ///
    /// After this returns no further handler invocations happen and all
    /// joined sockets are released.
    pub fn shutdown(mut self) {
        info!(groups = self.groups.len(), "shutdown initiated");
        self.stop.store(true, Ordering::Relaxed);

        for (label, socket) in &self.groups {
            // Unconnected UDP sockets report ENOTCONN here, but the kernel
            // still wakes the blocked reader, which then sees the flag.
            if let Err(e) = rustix::net::shutdown(&**socket, rustix::net::Shutdown::Read) {
                debug!(group = %label, error = %e, "socket read shutdown");
            }
        }

        self.join_threads();
        info!("shutdown complete");
    }

    fn join_threads(&mut self) {
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for GroupSet {
    fn drop(&mut self) {
        // Signal the loops if shutdown() was never called; readers still
        // blocked in recv keep their socket alive until they next wake.
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Joins every candidate group on the named interface and spawns one
/// receive loop per successful join.
///
/// The interface's addresses are enumerated for diagnostics, and the full
/// candidate list is joined once per usable address. On a multi-address
/// interface the later passes normally fail their binds with
/// address-in-use and are logged and skipped. Join failures never fail the
/// call; the returned [`GroupSet`] reports how many loops are actually
/// running.
///
/// The handler is shared by every spawned loop and may be invoked
/// concurrently from all of them.
///
/// # Errors
///
/// [`InterfaceError::NotFound`] when the interface does not resolve,
/// [`InterfaceError::Enumeration`] when its address list cannot be
/// produced. Both leave zero loops running.
///
/// # Panics
///
/// Panics if a receive thread cannot be spawned.
pub fn join_all(
    interface: &str,
    candidates: &[Candidate],
    handler: Arc<dyn DatagramHandler>,
) -> Result<GroupSet, InterfaceError> {
    let iface = Interface::resolve(interface)?;
    info!(
        interface = %iface.name(),
        index = iface.index(),
        addrs = iface.addrs().len(),
        "interface resolved"
    );

    let stop = Arc::new(AtomicBool::new(false));
    let mut groups: Vec<(String, Arc<UdpSocket>)> = Vec::new();
    let mut threads: Vec<JoinHandle<()>> = Vec::new();

    for addr in iface.addrs() {
        if addr.is_unspecified() {
            warn!(interface = %iface.name(), %addr, "skipping unusable interface address");
            continue;
        }
        debug!(interface = %iface.name(), %addr, "join pass for interface address");

        for candidate in candidates {
            let group = match join_group(&iface, candidate) {
                Ok(group) => group,
                Err(e) => {
                    warn!(
                        candidate = %candidate,
                        %addr,
                        error = %e,
                        "join failed, skipping candidate"
                    );
                    continue;
                }
            };

            let label = group.candidate().to_string();
            let socket = Arc::new(group.into_socket());
            info!(group = %label, "joined multicast group");

            let thread = {
                let socket = Arc::clone(&socket);
                let handler = Arc::clone(&handler);
                let stop = Arc::clone(&stop);
                let source = label.clone();
                thread::Builder::new()
                    .name(format!("rx-{label}"))
                    .spawn(move || {
                        let mut rx = ReceiveLoop::new(socket, source, handler, stop);
                        rx.run();
                    })
                    .expect("failed to spawn receive thread")
            };

            groups.push((label, socket));
            threads.push(thread);
        }
    }

    info!(joined = groups.len(), "join pass complete");
    Ok(GroupSet {
        stop,
        groups,
        threads,
    })
}
