use crate::ping_error::PingError;
use std::net::{IpAddr, Ipv4Addr};
use std::result::Result;
use std::time::{SystemTime, UNIX_EPOCH};

/// First IPv4 address `hostname` resolves to. Dotted-quad input is returned as is.
pub fn lookup_host_v4(hostname: &str) -> Result<Ipv4Addr, PingError> {
    if let Ok(ip) = hostname.parse::<Ipv4Addr>() {
        return Ok(ip);
    }
    let ips: Vec<IpAddr> = dns_lookup::lookup_host(hostname).map_err(|error| PingError::Resolution {
        host: hostname.to_owned(),
        message: error.to_string(),
    })?;
    ips.into_iter()
        .find_map(|ip| match ip {
            IpAddr::V4(ipv4) => Some(ipv4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| PingError::Resolution { host: hostname.to_owned(), message: "no IPv4 address".to_owned() })
}

/// Seconds since the UNIX epoch; this is what echo requests carry as payload.
pub(crate) fn unix_time_secs() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0.0, |elapsed| elapsed.as_secs_f64())
}
