//! Private / reserved address detection used to skip lookups before any API call

use crate::entity::Entity;
use crate::options::Options;
use ip_network::Ipv4Network;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

/// Non-globally-routable IPv4 blocks (RFC 1918, RFC 6890 special purpose,
/// loopback, link-local, multicast, reserved and broadcast).
const RESERVED_V4: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.0.0.0/24",
    "192.0.2.0/24",
    "192.168.0.0/16",
    "198.18.0.0/15",
    "198.51.100.0/24",
    "203.0.113.0/24",
    "224.0.0.0/4",
    "240.0.0.0/4",
    "255.255.255.255/32",
];

static RESERVED_TABLE: OnceLock<Vec<Ipv4Network>> = OnceLock::new();

fn reserved_table() -> &'static [Ipv4Network] {
    RESERVED_TABLE.get_or_init(|| {
        RESERVED_V4
            .iter()
            .filter_map(|cidr| match cidr.parse::<Ipv4Network>() {
                Ok(net) => Some(net),
                Err(e) => {
                    log::error!("Bad reserved range {}: {:?}", cidr, e);
                    None
                }
            })
            .collect()
    })
}

fn is_reserved_v4(addr: Ipv4Addr) -> bool {
    reserved_table().iter().any(|net| net.contains(addr))
}

fn is_reserved_v6(addr: Ipv6Addr) -> bool {
    if let Some(v4) = addr.to_ipv4_mapped() {
        return is_reserved_v4(v4);
    }
    let first = addr.segments()[0];
    addr.is_loopback()
        || addr.is_unspecified()
        || addr.is_multicast()
        || (first & 0xfe00) == 0xfc00 // fc00::/7 unique local
        || (first & 0xffc0) == 0xfe80 // fe80::/10 link local
}

/// True if `value` parses as an IP address in a private or reserved range.
/// Values that are not IP addresses are never private.
pub fn is_private_ip(value: &str) -> bool {
    match value.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_reserved_v4(v4),
        Ok(IpAddr::V6(v6)) => is_reserved_v6(v6),
        Err(_) => false,
    }
}

/// Whether the pipeline should answer for `entity` without calling the API
pub fn should_skip(entity: &Entity, options: &Options) -> bool {
    options.ignore_private_ips && entity.is_ip && is_private_ip(&entity.value)
}
