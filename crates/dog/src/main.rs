//! # dog
//!
//! Copies stdin into every file named on the command line, like `tee`
//! without the stdout copy. All outputs share one ring buffer; a slow output
//! only holds back the input once the ring is full, never the other outputs.
//!
//! ## Running
//!
//! ```bash
//! # Fan a stream out to three files
//! producer | cargo run -p dog --release -- a.out b.out c.out
//!
//! # Bigger ring, chattier logs
//! RUST_LOG=teering=debug,dog=debug cargo run -p dog -- --capacity 524288 out.log
//! ```

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;
use teering::{Config, Relay, RelayConfig};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: dog [--capacity BYTES] [--poll-ms MS] FILE...";

#[derive(Debug, PartialEq, Eq)]
struct Args {
    capacity: usize,
    poll_interval: Duration,
    outputs: Vec<PathBuf>,
}

impl Args {
    /// Returns `Ok(None)` when help was requested.
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>> {
        let mut capacity = Config::default().capacity;
        let mut poll_interval = RelayConfig::default().poll_interval;
        let mut outputs = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--capacity" => {
                    let value = args.next().context("--capacity needs a value")?;
                    capacity = value
                        .parse()
                        .with_context(|| format!("invalid capacity '{value}'"))?;
                }
                "--poll-ms" => {
                    let value = args.next().context("--poll-ms needs a value")?;
                    let ms: u64 = value
                        .parse()
                        .with_context(|| format!("invalid poll interval '{value}'"))?;
                    poll_interval = Duration::from_millis(ms);
                }
                "-h" | "--help" => return Ok(None),
                "--" => outputs.extend(args.by_ref().map(PathBuf::from)),
                flag if flag.starts_with("--") => bail!("unknown option '{flag}'\n{USAGE}"),
                path => outputs.push(PathBuf::from(path)),
            }
        }

        if outputs.is_empty() {
            bail!("no output files given\n{USAGE}");
        }
        Ok(Some(Self {
            capacity,
            poll_interval,
            outputs,
        }))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Args::parse(std::env::args().skip(1))? {
        Some(args) => run(&args),
        None => {
            println!("{USAGE}");
            Ok(())
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let outputs = args
        .outputs
        .iter()
        .map(|path| open_output(path).with_context(|| format!("cannot open {}", path.display())))
        .collect::<Result<Vec<File>>>()?;

    let stdin = fd::NonBlockingStdin::new().context("cannot set up stdin")?;

    let config = Config::default().with_capacity(args.capacity);
    let relay_config = RelayConfig::default().with_poll_interval(args.poll_interval);
    let mut relay = Relay::with_relay_config(stdin, outputs, config, relay_config)?;

    tracing::info!(
        outputs = args.outputs.len(),
        capacity = args.capacity,
        "relaying stdin"
    );
    let stats = relay.run().map_err(|e| match e.sink_index() {
        Some(i) => anyhow::Error::new(e).context(format!("{}", args.outputs[i].display())),
        None => anyhow::Error::new(e),
    })?;

    for (path, bytes) in args.outputs.iter().zip(&stats.bytes_out) {
        tracing::debug!(path = %path.display(), bytes, "output complete");
    }
    Ok(())
}

#[cfg(unix)]
fn open_output(path: &std::path::Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

#[cfg(not(unix))]
fn open_output(path: &std::path::Path) -> std::io::Result<File> {
    File::create(path)
}

#[cfg(unix)]
mod fd {
    use std::fs::File;
    use std::io::{self, Read};
    use std::os::fd::{AsFd, AsRawFd};

    /// A duplicate of stdin switched to non-blocking mode.
    ///
    /// The flag lives on the shared open file description, so it is put
    /// back on drop; otherwise the parent shell inherits a non-blocking
    /// terminal.
    pub struct NonBlockingStdin {
        file: File,
        saved_flags: libc::c_int,
    }

    impl NonBlockingStdin {
        pub fn new() -> io::Result<Self> {
            let file = File::from(io::stdin().as_fd().try_clone_to_owned()?);
            let fd = file.as_raw_fd();

            // SAFETY: fd is a valid descriptor owned by `file`.
            let saved_flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
            if saved_flags < 0 {
                return Err(io::Error::last_os_error());
            }
            // SAFETY: as above; only the status flags are changed.
            if unsafe { libc::fcntl(fd, libc::F_SETFL, saved_flags | libc::O_NONBLOCK) } < 0 {
                return Err(io::Error::last_os_error());
            }
            tracing::debug!(fd, "stdin set to non-blocking");
            Ok(Self { file, saved_flags })
        }
    }

    impl Read for NonBlockingStdin {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.file.read(buf)
        }
    }

    impl Drop for NonBlockingStdin {
        fn drop(&mut self) {
            // SAFETY: the descriptor is still open; we restore the flags we read.
            let rc =
                unsafe { libc::fcntl(self.file.as_raw_fd(), libc::F_SETFL, self.saved_flags) };
            if rc < 0 {
                tracing::warn!(
                    error = %io::Error::last_os_error(),
                    "failed to restore stdin flags"
                );
            }
        }
    }
}

#[cfg(not(unix))]
mod fd {
    use std::io::{self, Read, Stdin};

    /// Plain blocking stdin where non-blocking descriptors are unavailable.
    pub struct NonBlockingStdin(Stdin);

    impl NonBlockingStdin {
        pub fn new() -> io::Result<Self> {
            Ok(Self(io::stdin()))
        }
    }

    impl Read for NonBlockingStdin {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>> {
        Args::parse(args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn test_parse_outputs_with_defaults() {
        let args = parse(&["a.out", "b.out"]).unwrap().unwrap();
        assert_eq!(args.capacity, Config::default().capacity);
        assert_eq!(args.poll_interval, RelayConfig::default().poll_interval);
        assert_eq!(args.outputs, vec![PathBuf::from("a.out"), PathBuf::from("b.out")]);
    }

    #[test]
    fn test_parse_options() {
        let args = parse(&["--capacity", "4096", "--poll-ms", "5", "--", "--weird-name"])
            .unwrap()
            .unwrap();
        assert_eq!(args.capacity, 4096);
        assert_eq!(args.poll_interval, Duration::from_millis(5));
        assert_eq!(args.outputs, vec![PathBuf::from("--weird-name")]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--capacity"]).is_err());
        assert!(parse(&["--capacity", "lots", "x"]).is_err());
        assert!(parse(&["--bogus", "x"]).is_err());
    }

    #[test]
    fn test_parse_help_is_not_an_error() {
        assert!(parse(&["--help"]).unwrap().is_none());
        assert!(parse(&["a.out", "-h"]).unwrap().is_none());
        assert!(parse(&["-h", "--bogus"]).unwrap().is_none());
    }

    #[test]
    fn test_run_copies_into_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = [dir.path().join("one"), dir.path().join("two")];

        let files = paths
            .iter()
            .map(|p| open_output(p).unwrap())
            .collect::<Vec<_>>();
        let data = b"woof woof\n".repeat(1000);
        let config = Config::default().with_capacity(1024);
        let mut relay = Relay::new(&data[..], files, config).unwrap();
        relay.run().unwrap();
        drop(relay);

        for path in &paths {
            assert_eq!(std::fs::read(path).unwrap(), data);
        }
    }

    #[test]
    fn test_run_truncates_existing_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale");
        std::fs::write(&path, b"leftover bytes from an earlier run").unwrap();

        let args = Args {
            capacity: 64,
            poll_interval: Duration::from_millis(1),
            outputs: vec![path.clone()],
        };
        let files = args
            .outputs
            .iter()
            .map(|p| open_output(p).unwrap())
            .collect::<Vec<_>>();
        let config = Config::default().with_capacity(args.capacity);
        let mut relay = Relay::new(&b"fresh"[..], files, config).unwrap();
        relay.run().unwrap();
        drop(relay);

        assert_eq!(std::fs::read(&path).unwrap(), b"fresh");
    }
}
