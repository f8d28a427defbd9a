//! Per-group receive loop.
//!
//! Each loop owns one joined socket and one reusable scratch buffer. It
//! blocks for the next datagram, copies it, and dispatches to the handler;
//! the first read error (or a raised stop flag) terminates the loop for
//! good. No rejoin, no retry.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, trace, warn};

use crate::handler::DatagramHandler;

/// Capacity of the per-loop scratch buffer. Datagrams longer than this are
/// truncated by the socket, not reassembled.
pub const RECV_BUFFER_CAPACITY: usize = 1000;

/// One group's receive loop state.
pub struct ReceiveLoop {
    socket: Arc<UdpSocket>,
    source: String,
    handler: Arc<dyn DatagramHandler>,
    stop: Arc<AtomicBool>,
    recv_buf: Vec<u8>,
}

impl ReceiveLoop {
    /// Creates the loop state for one joined group.
    ///
    /// `source` is the label passed to every handler invocation; `stop` is
    /// shared with the owning [`GroupSet`](crate::GroupSet) and checked
    /// after every wakeup.
    pub fn new(
        socket: Arc<UdpSocket>,
        source: String,
        handler: Arc<dyn DatagramHandler>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            socket,
            source,
            handler,
            stop,
            recv_buf: vec![0u8; RECV_BUFFER_CAPACITY],
        }
    }

    /// Runs until a read error or the stop flag.
    ///
    /// Datagrams are dispatched in arrival order. Handler panics are not
    /// caught; they unwind through the loop's thread.
    pub fn run(&mut self) {
        info!(group = %self.source, "receive loop started");

        loop {
            let (len, from) = match self.socket.recv_from(&mut self.recv_buf) {
                Ok(received) => received,
                Err(e) => {
                    if !self.stop.load(Ordering::Relaxed) {
                        warn!(group = %self.source, error = %e, "read failed, terminating receive loop");
                    }
                    break;
                }
            };

            if self.stop.load(Ordering::Relaxed) {
                break;
            }

            trace!(group = %self.source, from = %from, len, "datagram received");

            // The scratch buffer is overwritten by the next read; the
            // handler gets its own copy sized to the bytes received.
            let payload = self.recv_buf[..len].to_vec();
            self.handler.on_datagram(&self.source, len, payload);
        }

        info!(group = %self.source, "receive loop exiting");
    }
}
