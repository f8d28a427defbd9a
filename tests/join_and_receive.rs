//! End-to-end join and receive tests over the loopback interface.
//!
//! These drive the real join path: resolve the loopback interface, join
//! multicast groups on it, send datagrams routed back through it, and
//! observe handler invocations. Environments without a usable loopback
//! interface skip the network-dependent tests.
//!
//! # Running with tracing
//!
//! ```bash
//! RUST_LOG=groupcast=trace cargo test --test join_and_receive -- --nocapture
//! ```

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::{Arc, Mutex, Once};
use std::thread;
use std::time::{Duration, Instant};

use groupcast::send::send_to_group;
use groupcast::{join_all, Candidate, DatagramHandler, Interface, InterfaceError};

static INIT_TRACING: Once = Once::new();

/// Initialize tracing for tests (only once).
fn init_test_tracing() {
    INIT_TRACING.call_once(groupcast::trace::init_subscriber);
}

/// Records every handler invocation for later assertions.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(String, usize, Vec<u8>)>>,
}

impl Recorder {
    fn snapshot(&self) -> Vec<(String, usize, Vec<u8>)> {
        self.events.lock().unwrap().clone()
    }
}

impl DatagramHandler for Recorder {
    fn on_datagram(&self, source: &str, len: usize, payload: Vec<u8>) {
        self.events
            .lock()
            .unwrap()
            .push((source.to_owned(), len, payload));
    }
}

/// Resolves the loopback interface, if this environment has one.
fn loopback() -> Option<Interface> {
    ["lo", "lo0"].iter().find_map(|name| {
        Interface::resolve(name)
            .ok()
            .filter(|iface| iface.addrs().iter().any(|a| a.is_loopback()))
    })
}

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

fn v4_candidate(a: u8, b: u8, c: u8, d: u8, port: u16) -> Candidate {
    Candidate::new(IpAddr::V4(Ipv4Addr::new(a, b, c, d)), port)
}

#[test]
fn unknown_interface_reports_not_found_and_spawns_nothing() {
    init_test_tracing();
    let recorder = Arc::new(Recorder::default());

    let err = join_all(
        "no-such-interface0",
        &[v4_candidate(224, 0, 0, 1, 8025)],
        Arc::clone(&recorder) as Arc<dyn DatagramHandler>,
    )
    .unwrap_err();

    assert!(matches!(err, InterfaceError::NotFound { .. }));
    assert!(recorder.snapshot().is_empty());
}

#[test]
fn delivers_hello_world_to_joined_group() {
    init_test_tracing();
    let Some(iface) = loopback() else {
        eprintln!("skipping: no loopback interface");
        return;
    };

    let candidate = v4_candidate(224, 0, 0, 1, 8025);
    let recorder = Arc::new(Recorder::default());
    let set = join_all(
        iface.name(),
        &[candidate],
        Arc::clone(&recorder) as Arc<dyn DatagramHandler>,
    )
    .unwrap();
    assert_eq!(set.group_count(), 1);

    send_to_group(&candidate, &iface, b"hello, world").unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        recorder.snapshot().len() == 1
    }));
    let events = recorder.snapshot();
    assert_eq!(events[0].0, "224.0.0.1:8025");
    assert_eq!(events[0].1, 12);
    assert_eq!(events[0].2, b"hello, world".to_vec());

    set.shutdown();
}

#[test]
fn same_group_different_ports_are_independent() {
    init_test_tracing();
    let Some(iface) = loopback() else {
        eprintln!("skipping: no loopback interface");
        return;
    };

    let first = v4_candidate(224, 0, 0, 1, 1235);
    let second = v4_candidate(224, 0, 0, 1, 11235);
    let recorder = Arc::new(Recorder::default());
    let set = join_all(
        iface.name(),
        &[first, second],
        Arc::clone(&recorder) as Arc<dyn DatagramHandler>,
    )
    .unwrap();
    assert_eq!(set.group_count(), 2);

    send_to_group(&first, &iface, b"to-1235").unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        recorder.snapshot().len() == 1
    }));
    // Give a stray cross-delivery time to show up before asserting.
    thread::sleep(Duration::from_millis(200));
    let events = recorder.snapshot();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "224.0.0.1:1235");
    assert_eq!(events[0].2, b"to-1235".to_vec());

    set.shutdown();
}

#[test]
fn join_failures_are_isolated_per_candidate() {
    init_test_tracing();
    let Some(iface) = loopback() else {
        eprintln!("skipping: no loopback interface");
        return;
    };

    // Occupies a port so the bind for the third candidate fails.
    let blocker = UdpSocket::bind("0.0.0.0:12036").unwrap();

    let joinable = v4_candidate(224, 0, 0, 99, 12035);
    // Not a local address: the bind fails.
    let unbindable = v4_candidate(203, 0, 113, 9, 12037);
    let conflicting = v4_candidate(224, 0, 0, 99, 12036);

    let recorder = Arc::new(Recorder::default());
    let set = join_all(
        iface.name(),
        &[joinable, unbindable, conflicting],
        Arc::clone(&recorder) as Arc<dyn DatagramHandler>,
    )
    .unwrap();

    // The two failures are logged and skipped; the call still succeeds.
    assert_eq!(set.group_count(), 1);

    send_to_group(&joinable, &iface, b"still-works").unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        recorder.snapshot().len() == 1
    }));
    assert_eq!(recorder.snapshot()[0].0, "224.0.0.99:12035");

    set.shutdown();
    drop(blocker);
}

#[test]
fn shutdown_stops_deliveries() {
    init_test_tracing();
    let Some(iface) = loopback() else {
        eprintln!("skipping: no loopback interface");
        return;
    };

    let candidate = v4_candidate(224, 0, 0, 1, 13035);
    let recorder = Arc::new(Recorder::default());
    let set = join_all(
        iface.name(),
        &[candidate],
        Arc::clone(&recorder) as Arc<dyn DatagramHandler>,
    )
    .unwrap();
    assert_eq!(set.group_count(), 1);

    send_to_group(&candidate, &iface, b"before").unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        recorder.snapshot().len() == 1
    }));

    // shutdown() joins the loop threads, so once it returns the membership
    // is gone and nothing further may reach the handler.
    set.shutdown();
    send_to_group(&candidate, &iface, b"after").unwrap();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(recorder.snapshot().len(), 1);
}

#[test]
fn retained_payloads_survive_later_datagrams() {
    init_test_tracing();
    let Some(iface) = loopback() else {
        eprintln!("skipping: no loopback interface");
        return;
    };

    let candidate = v4_candidate(224, 0, 0, 1, 14035);
    let recorder = Arc::new(Recorder::default());
    let set = join_all(
        iface.name(),
        &[candidate],
        Arc::clone(&recorder) as Arc<dyn DatagramHandler>,
    )
    .unwrap();
    assert_eq!(set.group_count(), 1);

    send_to_group(&candidate, &iface, b"keep-me").unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        recorder.snapshot().len() == 1
    }));
    let retained = recorder.snapshot().remove(0).2;

    // The loop reuses its scratch buffer for the next read; the payload
    // delivered earlier must be an independent copy.
    send_to_group(&candidate, &iface, b"overwrite").unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        recorder.snapshot().len() == 2
    }));
    assert_eq!(retained, b"keep-me".to_vec());

    set.shutdown();
}
