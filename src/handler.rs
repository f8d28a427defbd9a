//! Datagram handler capability.

/// Receives datagrams from the receive loops.
///
/// One handler instance is shared by every loop spawned from a single
/// [`join_all`](crate::join_all) call, and loops dispatch to it without any
/// cross-loop coordination: invocations from different groups may run
/// concurrently. The `Send + Sync` bounds state that obligation where the
/// compiler can enforce it.
///
/// `payload` is an owned copy sized to the bytes actually received; the
/// handler may keep it as long as it likes.
pub trait DatagramHandler: Send + Sync {
    /// Called once per received datagram.
    ///
    /// `source` is the group endpoint label the datagram arrived on
    /// (e.g. `224.0.0.1:8025`), `len` the received byte count.
    fn on_datagram(&self, source: &str, len: usize, payload: Vec<u8>);
}

impl<F> DatagramHandler for F
where
    F: Fn(&str, usize, Vec<u8>) + Send + Sync,
{
    fn on_datagram(&self, source: &str, len: usize, payload: Vec<u8>) {
        self(source, len, payload);
    }
}
