//! Best-effort discovery of this host's IPv4 addresses, for pointing phones at the hub.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::process::Command;

/// Non-loopback IPv4 addresses, private ranges first.
pub fn host_ipv4_addresses() -> Vec<Ipv4Addr> {
    let mut addrs = command_stdout("ip", &["-4", "-o", "addr", "show"])
        .map(|out| parse_ip_addr(&out))
        .unwrap_or_default();
    if addrs.is_empty() {
        addrs = command_stdout("ifconfig", &[])
            .map(|out| parse_ifconfig(&out))
            .unwrap_or_default();
    }
    sort_addresses(addrs)
}

fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let out = Command::new(program).args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout).ok()
}

/// Lines like `2: eth0    inet 192.168.1.10/24 brd ...`.
pub fn parse_ip_addr(output: &str) -> BTreeSet<Ipv4Addr> {
    output
        .lines()
        .filter_map(|line| {
            let mut words = line.split_whitespace();
            words.find(|w| *w == "inet")?;
            let cidr = words.next()?;
            cidr.split('/').next()?.parse().ok()
        })
        .filter(|a: &Ipv4Addr| !a.is_loopback())
        .collect()
}

/// Lines like `inet 10.0.0.5 netmask 0xffffff00 ...`.
pub fn parse_ifconfig(output: &str) -> BTreeSet<Ipv4Addr> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("inet ")?;
            let addr = rest.split_whitespace().next()?;
            addr.trim_start_matches("addr:").parse().ok()
        })
        .filter(|a: &Ipv4Addr| !a.is_loopback())
        .collect()
}

fn rank(addr: &Ipv4Addr) -> u8 {
    if addr.is_private() {
        0
    } else if addr.is_link_local() {
        2
    } else {
        1
    }
}

pub fn sort_addresses(addrs: BTreeSet<Ipv4Addr>) -> Vec<Ipv4Addr> {
    let mut out: Vec<_> = addrs.into_iter().collect();
    out.sort_by_key(|a| (rank(a), a.to_string()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iproute2_output() {
        let out = "1: lo    inet 127.0.0.1/8 scope host lo\n\
                   2: eth0    inet 192.168.1.10/24 brd 192.168.1.255 scope global eth0\n\
                   3: wlan0    inet 10.0.0.7/8 scope global wlan0\n";
        let addrs = parse_ip_addr(out);
        assert_eq!(addrs.len(), 2);
        assert!(addrs.contains(&Ipv4Addr::new(192, 168, 1, 10)));
        assert!(addrs.contains(&Ipv4Addr::new(10, 0, 0, 7)));
    }

    #[test]
    fn parses_ifconfig_output() {
        let out = "en0: flags=8863<UP>\n\tinet 172.20.1.4 netmask 0xffff0000\n\
                   lo0: flags=8049<UP>\n\tinet 127.0.0.1 netmask 0xff000000\n\
                   eth1 Link encap:Ethernet\n          inet addr:169.254.3.3  Bcast:169.254.255.255\n";
        let addrs = parse_ifconfig(out);
        assert_eq!(
            addrs.into_iter().collect::<Vec<_>>(),
            vec![Ipv4Addr::new(169, 254, 3, 3), Ipv4Addr::new(172, 20, 1, 4)]
        );
    }

    #[test]
    fn private_addresses_sort_first_link_local_last() {
        let addrs: BTreeSet<Ipv4Addr> = [
            Ipv4Addr::new(169, 254, 1, 1),
            Ipv4Addr::new(8, 8, 8, 8),
            Ipv4Addr::new(192, 168, 0, 2),
            Ipv4Addr::new(10, 1, 1, 1),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            sort_addresses(addrs),
            vec![
                Ipv4Addr::new(10, 1, 1, 1),
                Ipv4Addr::new(192, 168, 0, 2),
                Ipv4Addr::new(8, 8, 8, 8),
                Ipv4Addr::new(169, 254, 1, 1),
            ]
        );
    }
}
