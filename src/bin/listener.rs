//! Multicast listener daemon.
//!
//! Joins a set of multicast groups on one interface and logs every
//! datagram the receive loops deliver.
//!
//! # Usage
//!
//! ```sh
//! listener --interface eth0 --group 224.0.0.1:8025 --greet 224.0.0.1:11049
//! ```

use std::fmt::Write as _;
use std::io;
use std::sync::Arc;

use groupcast::Candidate;
use tracing::{info, warn};

/// Interface used when none is given.
const DEFAULT_INTERFACE: &str = "eth0";

/// Groups joined when no `--group` flags are given.
const DEFAULT_GROUPS: [&str; 5] = [
    "224.0.0.1:8025",
    "224.0.0.2:8012",
    "224.0.0.3:1111",
    "224.0.0.4:1345",
    "224.0.0.1:1235",
];

/// Payload of the optional greeting datagram.
const GREETING: &[u8] = b"hello, world";

struct Config {
    interface: String,
    groups: Vec<Candidate>,
    greet: Option<String>,
}

fn main() {
    groupcast::trace::init_subscriber();

    if let Err(e) = run() {
        eprintln!("listener: {e}");
        std::process::exit(1);
    }
}

fn run() -> io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = parse_args(&args)?;

    let handler = Arc::new(|source: &str, len: usize, payload: Vec<u8>| {
        info!(group = %source, len, payload = %hex_line(&payload), "datagram");
    });

    let listeners = groupcast::join_all(&config.interface, &config.groups, handler)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    if listeners.group_count() == 0 {
        warn!(interface = %config.interface, "no groups joined");
    }

    if let Some(target) = &config.greet {
        match groupcast::send::send_once(target.as_str(), GREETING) {
            Ok(sent) => info!(dest = %target, sent, "greeting sent"),
            Err(e) => warn!(dest = %target, error = %e, "greeting send failed"),
        }
    }

    listeners.wait();
    Ok(())
}

/// Renders a payload as space-separated hex pairs.
fn hex_line(payload: &[u8]) -> String {
    let mut out = String::with_capacity(payload.len() * 3);
    for (i, byte) in payload.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

fn parse_args(args: &[String]) -> io::Result<Config> {
    let mut interface: Option<String> = None;
    let mut groups: Vec<Candidate> = Vec::new();
    let mut greet: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--interface" | "-i" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| invalid("missing value for --interface".into()))?;
                interface = Some(value.clone());
            }
            "--group" | "-g" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| invalid("missing value for --group".into()))?;
                let candidate = value
                    .parse()
                    .map_err(|e| invalid(format!("bad group '{value}': {e}")))?;
                groups.push(candidate);
            }
            "--greet" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| invalid("missing value for --greet".into()))?;
                greet = Some(value.clone());
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg => return Err(invalid(format!("unknown argument: {arg}"))),
        }
        i += 1;
    }

    if groups.is_empty() {
        groups = DEFAULT_GROUPS
            .iter()
            .map(|s| s.parse().expect("default group is valid"))
            .collect();
    }

    Ok(Config {
        interface: interface.unwrap_or_else(|| DEFAULT_INTERFACE.to_owned()),
        groups,
        greet,
    })
}

fn print_usage() {
    eprintln!(
        r#"listener - multicast group listener daemon

USAGE:
    listener [OPTIONS]

OPTIONS:
    -i, --interface <NAME>   Interface to join groups on (default: eth0)
    -g, --group <ADDR:PORT>  Group to join (can be repeated; IPv6 in brackets)
    --greet <ADDR:PORT>      Send a one-shot greeting datagram after joining
    -h, --help               Print this help message

EXAMPLE:
    listener --interface eth0 --group 224.0.0.1:8025 --group '[ff02::7]:9000'
"#
    );
}
