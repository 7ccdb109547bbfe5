// crates/rdap-core/src/range.rs
//
// Closed intervals over the three resource key spaces: IPv4 addresses,
// IPv6 addresses and AS numbers. All bounds are widened to u128 so one
// index implementation serves every namespace.
//
// Accepted notations:
//   - IPv4:  `192.0.2.1`, `192.0.2.0/24`, `192.0.2.0 - 192.0.2.255`
//   - IPv6:  `2001:db8::1`, `2001:db8::/32`, `2001:db8:: - 2001:db8::ff`
//   - ASN:   `123`, `AS123`, `AS100 - AS200`

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RdapError;
use crate::object::{ObjectType, Source};

/// Independent key space of a range. Queries never match across namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Namespace {
    Ipv4,
    Ipv6,
    Asn,
}

impl Namespace {
    /// Largest value representable in this namespace.
    pub fn max_value(&self) -> u128 {
        match self {
            Namespace::Ipv4 | Namespace::Asn => u32::MAX as u128,
            Namespace::Ipv6 => u128::MAX,
        }
    }

    fn bits(&self) -> u32 {
        match self {
            Namespace::Ipv4 | Namespace::Asn => 32,
            Namespace::Ipv6 => 128,
        }
    }
}

/// Closed interval `[start, end]`. Invariant: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    start: u128,
    end: u128,
}

impl Interval {
    pub fn new(start: u128, end: u128) -> Result<Self, RdapError> {
        if start > end {
            return Err(RdapError::BadRequest(format!(
                "Invalid range: start {} > end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn point(value: u128) -> Self {
        Self {
            start: value,
            end: value,
        }
    }

    pub fn start(&self) -> u128 {
        self.start
    }

    pub fn end(&self) -> u128 {
        self.end
    }

    /// Whether `other` lies entirely within this interval (equality included).
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn is_disjoint(&self, other: &Interval) -> bool {
        self.end < other.start || other.end < self.start
    }

    /// Overlapping without either interval containing the other.
    pub fn partially_overlaps(&self, other: &Interval) -> bool {
        !self.is_disjoint(other) && !self.contains(other) && !other.contains(self)
    }
}

/// A namespace plus an interval in it.
///
/// Serialized in its display notation, so 128-bit bounds survive JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceRange {
    pub namespace: Namespace,
    pub interval: Interval,
}

impl ResourceRange {
    pub fn new(namespace: Namespace, start: u128, end: u128) -> Result<Self, RdapError> {
        if end > namespace.max_value() {
            return Err(RdapError::BadRequest(format!(
                "Value {} out of range for {:?}",
                end, namespace
            )));
        }
        Ok(Self {
            namespace,
            interval: Interval::new(start, end)?,
        })
    }

    /// Parse an IPv4 or IPv6 address, CIDR prefix, or `start - end` range.
    pub fn parse_ip(input: &str) -> Result<Self, RdapError> {
        let input = input.trim();
        if let Some((lo, hi)) = input.split_once('-') {
            let (ns_lo, lo) = parse_address(lo.trim())?;
            let (ns_hi, hi) = parse_address(hi.trim())?;
            if ns_lo != ns_hi {
                return Err(RdapError::BadRequest(format!(
                    "Mixed address families in range '{}'",
                    input
                )));
            }
            return Self::new(ns_lo, lo, hi);
        }

        if let Some((addr, prefix)) = input.split_once('/') {
            let (namespace, value) = parse_address(addr.trim())?;
            let prefix: u32 = prefix.trim().parse().map_err(|_| {
                RdapError::BadRequest(format!("Invalid prefix length in '{}'", input))
            })?;
            return Self::from_prefix(namespace, value, prefix);
        }

        let (namespace, value) = parse_address(input)?;
        Ok(Self {
            namespace,
            interval: Interval::point(value),
        })
    }

    /// Parse an AS number (`123`, `AS123`) or an AS range (`AS100 - AS200`).
    pub fn parse_asn(input: &str) -> Result<Self, RdapError> {
        let input = input.trim();
        match input.split_once('-') {
            Some((lo, hi)) => {
                Self::new(Namespace::Asn, parse_as_number(lo)?, parse_as_number(hi)?)
            }
            None => {
                let n = parse_as_number(input)?;
                Self::new(Namespace::Asn, n, n)
            }
        }
    }

    /// Interpret the primary key of a range object.
    pub fn parse_key(object_type: ObjectType, key: &str) -> Result<Self, RdapError> {
        let range = match object_type {
            ObjectType::Inetnum | ObjectType::Inet6num => Self::parse_ip(key)?,
            ObjectType::AutNum | ObjectType::AsBlock => Self::parse_asn(key)?,
            other => {
                return Err(RdapError::InvalidObject(format!(
                    "{} objects have no range key",
                    other
                )))
            }
        };
        let expected = match object_type {
            ObjectType::Inetnum => Namespace::Ipv4,
            ObjectType::Inet6num => Namespace::Ipv6,
            _ => Namespace::Asn,
        };
        if range.namespace != expected {
            return Err(RdapError::InvalidObject(format!(
                "{} key '{}' is not a {:?} range",
                object_type, key, expected
            )));
        }
        Ok(range)
    }

    /// Build the interval covered by `value/prefix`. Host bits are masked off.
    pub fn from_prefix(namespace: Namespace, value: u128, prefix: u32) -> Result<Self, RdapError> {
        let bits = namespace.bits();
        if prefix > bits {
            return Err(RdapError::BadRequest(format!(
                "Prefix length {} exceeds {} bits",
                prefix, bits
            )));
        }
        let host_bits = bits - prefix;
        let host_mask: u128 = if host_bits == 128 {
            u128::MAX
        } else {
            (1u128 << host_bits) - 1
        };
        let start = value & !host_mask;
        Self::new(namespace, start, start | host_mask)
    }

    pub fn start(&self) -> u128 {
        self.interval.start()
    }

    pub fn end(&self) -> u128 {
        self.interval.end()
    }

    pub fn is_point(&self) -> bool {
        self.start() == self.end()
    }

    /// Same namespace and `other` entirely inside this range.
    pub fn contains(&self, other: &ResourceRange) -> bool {
        self.namespace == other.namespace && self.interval.contains(&other.interval)
    }

    /// Prefix length if the range is exactly one CIDR block.
    pub fn prefix_len(&self) -> Option<u32> {
        if self.namespace == Namespace::Asn {
            return None;
        }
        let span = self.end() - self.start();
        let bits = self.namespace.bits();
        if span == self.namespace.max_value() {
            return Some(0);
        }
        let size = span + 1;
        if size.is_power_of_two() && self.start() & span == 0 {
            Some(bits - size.trailing_zeros())
        } else {
            None
        }
    }

    /// Render one bound in the namespace's native notation.
    pub fn format_value(&self, value: u128) -> String {
        match self.namespace {
            Namespace::Ipv4 => Ipv4Addr::from(value as u32).to_string(),
            Namespace::Ipv6 => Ipv6Addr::from(value).to_string(),
            Namespace::Asn => format!("AS{}", value),
        }
    }
}

impl fmt::Display for ResourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.format_value(self.start());
        match self.namespace {
            Namespace::Ipv4 => write!(f, "{} - {}", start, self.format_value(self.end())),
            Namespace::Ipv6 => match self.prefix_len() {
                Some(len) => write!(f, "{}/{}", start, len),
                None => write!(f, "{} - {}", start, self.format_value(self.end())),
            },
            Namespace::Asn if self.is_point() => f.write_str(&start),
            Namespace::Asn => write!(f, "{} - {}", start, self.format_value(self.end())),
        }
    }
}

impl FromStr for ResourceRange {
    type Err = RdapError;

    /// Parse either notation: AS keys start with `AS`, everything else is
    /// an address range.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let is_asn = s
            .trim()
            .get(..2)
            .map(|p| p.eq_ignore_ascii_case("as"))
            .unwrap_or(false);
        if is_asn {
            Self::parse_asn(s)
        } else {
            Self::parse_ip(s)
        }
    }
}

impl TryFrom<String> for ResourceRange {
    type Error = RdapError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ResourceRange> for String {
    fn from(range: ResourceRange) -> Self {
        range.to_string()
    }
}

fn parse_address(input: &str) -> Result<(Namespace, u128), RdapError> {
    if input.contains(':') {
        input
            .parse::<Ipv6Addr>()
            .map(|a| (Namespace::Ipv6, u128::from(a)))
            .map_err(|_| RdapError::BadRequest(format!("Invalid IPv6 address '{}'", input)))
    } else {
        input
            .parse::<Ipv4Addr>()
            .map(|a| (Namespace::Ipv4, u32::from(a) as u128))
            .map_err(|_| RdapError::BadRequest(format!("Invalid IPv4 address '{}'", input)))
    }
}

fn parse_as_number(input: &str) -> Result<u128, RdapError> {
    let trimmed = input.trim();
    let digits = match trimmed.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("as") => &trimmed[2..],
        _ => trimmed,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RdapError::BadRequest(format!("Invalid AS number '{}'", input.trim())));
    }
    digits
        .parse::<u32>()
        .map(|n| n as u128)
        .map_err(|_| RdapError::BadRequest(format!("AS number '{}' out of range", trimmed)))
}

/// One indexed block: its range plus the record it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub range: ResourceRange,
    pub object_type: ObjectType,
    /// Normalised primary key of the record.
    pub key: String,
    pub source: Source,
}

impl RangeEntry {
    pub fn new(range: ResourceRange, object_type: ObjectType, key: &str, source: Source) -> Self {
        Self {
            range,
            object_type,
            key: key.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4_point() {
        let r = ResourceRange::parse_ip("192.0.2.1").unwrap();
        assert_eq!(r.namespace, Namespace::Ipv4);
        assert!(r.is_point());
        assert_eq!(r.start(), u32::from(Ipv4Addr::new(192, 0, 2, 1)) as u128);
    }

    #[test]
    fn test_parse_ipv4_cidr_and_range_agree() {
        let cidr = ResourceRange::parse_ip("192.0.2.0/24").unwrap();
        let range = ResourceRange::parse_ip("192.0.2.0 - 192.0.2.255").unwrap();
        assert_eq!(cidr, range);
        assert_eq!(cidr.to_string(), "192.0.2.0 - 192.0.2.255");
    }

    #[test]
    fn test_cidr_host_bits_masked() {
        let r = ResourceRange::parse_ip("192.0.2.77/24").unwrap();
        assert_eq!(r.format_value(r.start()), "192.0.2.0");
        assert_eq!(r.format_value(r.end()), "192.0.2.255");
    }

    #[test]
    fn test_parse_ipv6_prefix_display() {
        let r = ResourceRange::parse_ip("2001:2002:2003::/48").unwrap();
        assert_eq!(r.namespace, Namespace::Ipv6);
        assert_eq!(r.prefix_len(), Some(48));
        assert_eq!(r.to_string(), "2001:2002:2003::/48");
        assert_eq!(
            r.format_value(r.end()),
            "2001:2002:2003:ffff:ffff:ffff:ffff:ffff"
        );
    }

    #[test]
    fn test_zero_prefix_covers_namespace() {
        let v6 = ResourceRange::parse_ip("::/0").unwrap();
        assert_eq!(v6.start(), 0);
        assert_eq!(v6.end(), u128::MAX);
        let v4 = ResourceRange::parse_ip("0.0.0.0/0").unwrap();
        assert_eq!(v4.end(), u32::MAX as u128);
    }

    #[test]
    fn test_invalid_ip_rejected() {
        assert!(ResourceRange::parse_ip("invalid").unwrap_err().is_bad_request());
        assert!(ResourceRange::parse_ip("192.0.2.0/33").unwrap_err().is_bad_request());
        assert!(ResourceRange::parse_ip("192.0.2.0 - ::1").unwrap_err().is_bad_request());
        assert!(ResourceRange::parse_ip("192.0.2.9 - 192.0.2.1")
            .unwrap_err()
            .is_bad_request());
    }

    #[test]
    fn test_parse_asn_forms() {
        assert_eq!(ResourceRange::parse_asn("123").unwrap().start(), 123);
        assert_eq!(ResourceRange::parse_asn("as123").unwrap().start(), 123);
        let block = ResourceRange::parse_asn("AS100 - AS200").unwrap();
        assert_eq!((block.start(), block.end()), (100, 200));
        assert_eq!(block.to_string(), "AS100 - AS200");
        assert!(ResourceRange::parse_asn("XYZ").is_err());
        assert!(ResourceRange::parse_asn("AS4294967296").is_err());
    }

    #[test]
    fn test_parse_key_checks_namespace() {
        assert!(ResourceRange::parse_key(ObjectType::Inetnum, "2001:db8::/32").is_err());
        assert!(ResourceRange::parse_key(ObjectType::Inet6num, "2001:db8::/32").is_ok());
        assert!(ResourceRange::parse_key(ObjectType::Person, "TP1-TEST").is_err());
    }

    #[test]
    fn test_serde_uses_display_notation() {
        let v6 = ResourceRange::parse_ip("2001:db8::/32").unwrap();
        let json = serde_json::to_string(&v6).unwrap();
        assert_eq!(json, "\"2001:db8::/32\"");
        let back: ResourceRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v6);

        let asn: ResourceRange = serde_json::from_str("\"AS100 - AS200\"").unwrap();
        assert_eq!(asn.namespace, Namespace::Asn);
        assert!(serde_json::from_str::<ResourceRange>("\"nonsense\"").is_err());
    }

    #[test]
    fn test_interval_relations() {
        let outer = Interval::new(0, 100).unwrap();
        let inner = Interval::new(10, 20).unwrap();
        let straddle = Interval::new(90, 110).unwrap();
        assert!(outer.contains(&inner));
        assert!(outer.contains(&outer));
        assert!(!inner.contains(&outer));
        assert!(outer.partially_overlaps(&straddle));
        assert!(!outer.partially_overlaps(&inner));
        assert!(inner.is_disjoint(&straddle));
    }
}
