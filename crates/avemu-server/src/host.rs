//! Addresses clients can use to reach this host.

use std::net::{Ipv4Addr, UdpSocket};

/// Documentation-range address used only to pick a route. No packet is sent.
const ROUTE_PROBE: (Ipv4Addr, u16) = (Ipv4Addr::new(192, 0, 2, 1), 9);

/// Non-loopback IPv4 addresses of this host, best effort.
///
/// Reports the address of the interface holding the default route. Returns an
/// empty list when the host has no route (offline, sandboxed).
pub fn host_ipv4_addresses() -> Vec<Ipv4Addr> {
    let probe = || -> std::io::Result<Ipv4Addr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(ROUTE_PROBE)?;
        match socket.local_addr()?.ip() {
            std::net::IpAddr::V4(ip) => Ok(ip),
            std::net::IpAddr::V6(_) => Err(std::io::Error::other("unexpected IPv6 route")),
        }
    };

    match probe() {
        Ok(ip) if !ip.is_loopback() && !ip.is_unspecified() => vec![ip],
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::debug!("cannot determine host address: {e}");
            Vec::new()
        },
    }
}
