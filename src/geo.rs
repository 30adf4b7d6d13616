//! Geographic lookup for anonymous editors.
//!
//! The decoder only knows the [`GeoLookup`] trait. [`GeoTable`] is an in-memory
//! provider loaded from a CSV of networks; [`NoGeoLookup`] is used when no
//! database is configured.

use crate::error::GeoError;
use serde::Deserialize;
use std::io;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub continent: String,
    pub country: String,
    pub region: String,
    pub city: String,
}

/// Resolves an editor address to a location. Must be safe to share across threads.
pub trait GeoLookup: Send + Sync {
    fn lookup(&self, address: &str) -> Result<Location, GeoError>;
}

impl<T: GeoLookup + ?Sized> GeoLookup for &T {
    fn lookup(&self, address: &str) -> Result<Location, GeoError> {
        (**self).lookup(address)
    }
}

impl<T: GeoLookup + ?Sized> GeoLookup for Box<T> {
    fn lookup(&self, address: &str) -> Result<Location, GeoError> {
        (**self).lookup(address)
    }
}

impl<T: GeoLookup + ?Sized> GeoLookup for Arc<T> {
    fn lookup(&self, address: &str) -> Result<Location, GeoError> {
        (**self).lookup(address)
    }
}

/// Knows no locations; every lookup is `NotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeoLookup;

impl GeoLookup for NoGeoLookup {
    fn lookup(&self, address: &str) -> Result<Location, GeoError> {
        Err(GeoError::NotFound {
            address: address.to_string(),
        })
    }
}

/// An IPv4 or IPv6 block in CIDR form. A bare address is a full-length block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Network {
    addr: IpAddr,
    prefix_len: u8,
}

impl Network {
    fn parse(s: &str) -> Option<Self> {
        let (addr, prefix_len) = match s.split_once('/') {
            Some((addr, len)) => (
                addr.trim().parse::<IpAddr>().ok()?,
                len.trim().parse::<u8>().ok()?,
            ),
            None => {
                let addr = s.trim().parse::<IpAddr>().ok()?;
                let full = if addr.is_ipv4() { 32 } else { 128 };
                (addr, full)
            }
        };
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if prefix_len > max {
            return None;
        }
        Some(Self { addr, prefix_len })
    }

    fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - self.prefix_len as u32).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - self.prefix_len as u32).unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoRecord {
    network: String,
    continent: String,
    country: String,
    region: String,
    city: String,
}

/// Read-only network → location table, longest prefix wins.
#[derive(Debug, Clone, Default)]
pub struct GeoTable {
    entries: Vec<(Network, Location)>,
}

impl GeoTable {
    /// Loads a CSV with header `network,continent,country,region,city`.
    pub fn from_path(path: &Path) -> Result<Self, GeoError> {
        let reader = csv::Reader::from_path(path).map_err(csv_error)?;
        let table = Self::from_csv(reader)?;
        info!(networks = table.len(), path = ?path, "Geo table loaded");
        Ok(table)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, GeoError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, GeoError> {
        let mut entries = Vec::new();
        for (i, record) in reader.deserialize::<GeoRecord>().enumerate() {
            let record = record.map_err(csv_error)?;
            let network = Network::parse(&record.network).ok_or_else(|| {
                GeoError::Data(format!(
                    "row {}: invalid network [{}]",
                    i + 1,
                    record.network
                ))
            })?;
            entries.push((
                network,
                Location {
                    continent: record.continent,
                    country: record.country,
                    region: record.region,
                    city: record.city,
                },
            ));
        }
        // Stable sort keeps file order among equal-length blocks.
        entries.sort_by(|a, b| b.0.prefix_len.cmp(&a.0.prefix_len));
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GeoLookup for GeoTable {
    fn lookup(&self, address: &str) -> Result<Location, GeoError> {
        let ip: IpAddr = address.parse().map_err(|_| GeoError::MalformedAddress {
            address: address.to_string(),
        })?;
        self.entries
            .iter()
            .find(|(network, _)| network.contains(ip))
            .map(|(_, location)| location.clone())
            .ok_or_else(|| GeoError::NotFound {
                address: address.to_string(),
            })
    }
}

fn csv_error(e: csv::Error) -> GeoError {
    let message = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => GeoError::Io(io),
        _ => GeoError::Data(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
network,continent,country,region,city
10.0.0.0/8,Europe,France,Ile-de-France,Paris
10.1.0.0/16,North America,United States,California,San Francisco
192.168.1.7,Asia,Japan,Tokyo,Tokyo
2001:db8::/32,Oceania,Australia,New South Wales,Sydney
";

    fn table() -> GeoTable {
        GeoTable::from_reader(TABLE.as_bytes()).unwrap()
    }

    #[test]
    fn loads_all_rows() {
        assert_eq!(table().len(), 4);
        assert!(!table().is_empty());
        assert!(GeoTable::from_reader("network,continent,country,region,city\n".as_bytes())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn exact_address_match() {
        let loc = table().lookup("192.168.1.7").unwrap();
        assert_eq!(loc.country, "Japan");
        assert_eq!(loc.city, "Tokyo");
    }

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(table().lookup("10.1.2.3").unwrap().city, "San Francisco");
        assert_eq!(table().lookup("10.2.0.1").unwrap().city, "Paris");
    }

    #[test]
    fn ipv6_block_match() {
        assert_eq!(table().lookup("2001:db8::1").unwrap().country, "Australia");
    }

    #[test]
    fn unknown_address_not_found() {
        assert!(matches!(
            table().lookup("8.8.8.8"),
            Err(GeoError::NotFound { .. })
        ));
    }

    #[test]
    fn malformed_address() {
        assert!(matches!(
            table().lookup("999.1.1.1"),
            Err(GeoError::MalformedAddress { .. })
        ));
        assert!(matches!(
            table().lookup("1x2x3x4"),
            Err(GeoError::MalformedAddress { .. })
        ));
    }

    #[test]
    fn invalid_network_is_data_error() {
        let bad = "network,continent,country,region,city\n10.0.0.0/40,a,b,c,d\n";
        assert!(matches!(
            GeoTable::from_reader(bad.as_bytes()),
            Err(GeoError::Data(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            GeoTable::from_path(Path::new("/nonexistent/geo.csv")),
            Err(GeoError::Io(_))
        ));
    }

    #[test]
    fn zero_length_prefix_matches_everything_in_family() {
        let t = GeoTable::from_reader(
            "network,continent,country,region,city\n0.0.0.0/0,Earth,,,\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(t.lookup("203.0.113.9").unwrap().continent, "Earth");
        assert!(t.lookup("::1").is_err());
    }

    #[test]
    fn no_geo_lookup_never_finds() {
        assert!(matches!(
            NoGeoLookup.lookup("1.2.3.4"),
            Err(GeoError::NotFound { .. })
        ));
    }
}
