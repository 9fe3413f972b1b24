//! Command line and runtime configuration.

use clap::Parser;

/// Relay host used when `--host` is not given.
pub const DEFAULT_HOST: &str = "localhost";

/// Relay port used when `--port` is not given.
pub const DEFAULT_PORT: u16 = 8546;

/// Nickname stamped on outgoing messages.
pub const DEFAULT_NICK: &str = "self";

/// Entries kept per scroll buffer.
pub const DEFAULT_SCROLLBACK: usize = 10_000;

/// Parley terminal chat client
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "parley")]
#[command(about = "Terminal chat client talking to peers through a relay node")]
#[command(version)]
pub struct Args {
    /// Relay host to connect to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Relay websocket port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Relay host.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Own nickname.
    pub nick: String,
    /// Entries kept per scroll buffer; `None` keeps everything.
    pub scrollback: Option<usize>,
    /// Queued inbound events before peers wait on the remote feed.
    pub inbound_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            nick: DEFAULT_NICK.to_string(),
            scrollback: Some(DEFAULT_SCROLLBACK),
            inbound_capacity: 256,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self { host: args.host, port: args.port, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let args = Args::parse_from(["parley"]);
        assert_eq!(args.host, DEFAULT_HOST);
        assert_eq!(args.port, DEFAULT_PORT);
    }

    #[test]
    fn short_and_long_flags() {
        let args = Args::parse_from(["parley", "-H", "relay.local", "-p", "9000"]);
        assert_eq!((args.host.as_str(), args.port), ("relay.local", 9000));

        let args = Args::parse_from(["parley", "--host", "10.0.0.1", "--port", "1"]);
        assert_eq!((args.host.as_str(), args.port), ("10.0.0.1", 1));
    }

    #[test]
    fn rejects_unknown_flags_and_bad_port() {
        assert!(Args::try_parse_from(["parley", "--verbose"]).is_err());
        assert!(Args::try_parse_from(["parley", "--port", "70000"]).is_err());
    }

    #[test]
    fn config_keeps_fixed_settings() {
        let config = Config::from(Args::parse_from(["parley", "-p", "9000"]));
        assert_eq!(config.port, 9000);
        assert_eq!(config.nick, DEFAULT_NICK);
        assert_eq!(config.scrollback, Some(DEFAULT_SCROLLBACK));
    }
}
