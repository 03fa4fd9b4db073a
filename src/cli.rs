use std::str::FromStr;
use std::time::Duration;

use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Address to bind the listener to
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// How often expired entries are evicted, e.g. "1s" or "500ms"
    #[arg(long, value_name = "DURATION", default_value = "1s", value_parser = humantime::parse_duration)]
    pub reap_interval: Duration,

    /// Block an address on startup. Accepts IP or IP=DURATION, e.g. 1.2.3.4=10m
    #[arg(long = "ban", value_name = "IP[=DURATION]")]
    pub bans: Vec<BanArg>,

    /// Body sent to blocked callers
    #[arg(long, value_name = "TEXT", default_value = ipblock::gate::DEFAULT_DENY_MESSAGE)]
    pub message: String,

    /// Take the caller address from X-Forwarded-For / X-Real-IP headers
    #[arg(long)]
    pub trust_proxy: bool,

    /// Write log to this file
    #[arg(long, value_name = "FILE")]
    pub log: Option<String>,

    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,
}

/// A `--ban` argument. A missing duration means the ban never expires.
#[derive(Debug, Clone, PartialEq)]
pub struct BanArg {
    pub ip: String,
    pub duration: Option<Duration>,
}

impl BanArg {
    /// Ban length in whole seconds, zero for a permanent ban.
    ///
    /// Sub-second durations round up to one second so they never turn
    /// into a permanent ban.
    pub fn duration_secs(&self) -> i64 {
        match self.duration {
            Some(d) if d.is_zero() => 0,
            Some(d) => {
                let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
                i64::try_from(secs).unwrap_or(i64::MAX)
            }
            None => 0,
        }
    }
}

impl FromStr for BanArg {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip, duration) = match s.split_once('=') {
            Some((ip, duration)) => {
                let duration =
                    humantime::parse_duration(duration).map_err(|_| "invalid duration string")?;
                (ip, Some(duration))
            }
            None => (s, None),
        };

        if ip.trim().is_empty() {
            return Err("missing address");
        }

        Ok(BanArg {
            ip: ip.trim().to_string(),
            duration,
        })
    }
}
