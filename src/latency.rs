//! Symmetric latency sample table.
//!
//! Probe latencies are pooled at four granularities: the exact IP pair, the
//! city pair, the country pair, and a single global bucket. Every pair is
//! stored under a canonical ordering (smaller key first), so `(a, b)` and
//! `(b, a)` always address the same sample list.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Aggregation level of a latency sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Granularity {
    IpPair,
    CityPair,
    CountryPair,
    Global,
}

impl Granularity {
    /// All granularities in fallback order
    pub const CASCADE: [Granularity; 4] = [
        Granularity::IpPair,
        Granularity::CityPair,
        Granularity::CountryPair,
        Granularity::Global,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IpPair => "ip2ip",
            Self::CityPair => "city2city",
            Self::CountryPair => "country2country",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pair of keys at one granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplePair<'a> {
    Ip(&'a str, &'a str),
    City(u32, u32),
    Country(&'a str, &'a str),
    Global,
}

impl SamplePair<'_> {
    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Ip(..) => Granularity::IpPair,
            Self::City(..) => Granularity::CityPair,
            Self::Country(..) => Granularity::CountryPair,
            Self::Global => Granularity::Global,
        }
    }
}

/// Order a pair so that the smaller key comes first
fn canonical<K: Ord>(a: K, b: K) -> (K, K) {
    if b < a {
        (b, a)
    } else {
        (a, b)
    }
}

/// Samples keyed by unordered pair, nested as `lo -> hi -> samples`
#[derive(Debug, Clone)]
struct PairMap<K> {
    samples: HashMap<K, HashMap<K, Vec<f64>>>,
}

impl<K> Default for PairMap<K> {
    fn default() -> Self {
        Self { samples: HashMap::new() }
    }
}

impl<K: Ord + Hash> PairMap<K> {
    fn record(&mut self, a: K, b: K, latency: f64) {
        let (lo, hi) = canonical(a, b);
        self.samples.entry(lo).or_default().entry(hi).or_default().push(latency);
    }

    fn lookup<Q>(&self, a: &Q, b: &Q) -> Option<&[f64]>
    where
        K: Borrow<Q>,
        Q: Ord + Hash + ?Sized,
    {
        let (lo, hi) = canonical(a, b);
        self.samples.get(lo)?.get(hi).map(Vec::as_slice)
    }

    fn len(&self) -> usize {
        self.samples.values().map(HashMap::len).sum()
    }
}

/// Latency samples at every granularity
///
/// The table is filled during probe ingestion and only read afterwards;
/// densification borrows it immutably, so it can be shared across workers.
#[derive(Debug, Clone, Default)]
pub struct LatencyTable {
    ip: PairMap<String>,
    city: PairMap<u32>,
    country: PairMap<String>,
    global: Vec<f64>,
}

impl LatencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample under the unordered pair
    pub fn record(&mut self, pair: SamplePair<'_>, latency: f64) {
        match pair {
            SamplePair::Ip(a, b) => self.ip.record(a.to_string(), b.to_string(), latency),
            SamplePair::City(a, b) => self.city.record(a, b, latency),
            SamplePair::Country(a, b) => self.country.record(a.to_string(), b.to_string(), latency),
            SamplePair::Global => self.global.push(latency),
        }
    }

    /// Record one probe at every granularity it contributes to
    ///
    /// City pairs are only recorded when both endpoints have a city code.
    pub fn record_probe(
        &mut self,
        ips: (&str, &str),
        cities: (Option<u32>, Option<u32>),
        countries: (&str, &str),
        latency: f64,
    ) {
        self.record(SamplePair::Ip(ips.0, ips.1), latency);
        if let (Some(src_city), Some(dst_city)) = cities {
            self.record(SamplePair::City(src_city, dst_city), latency);
        }
        self.record(SamplePair::Country(countries.0, countries.1), latency);
        self.record(SamplePair::Global, latency);
    }

    /// Samples recorded for the unordered pair, if any
    pub fn lookup(&self, pair: SamplePair<'_>) -> Option<&[f64]> {
        match pair {
            SamplePair::Ip(a, b) => self.ip.lookup(a, b),
            SamplePair::City(a, b) => self.city.lookup(&a, &b),
            SamplePair::Country(a, b) => self.country.lookup(a, b),
            SamplePair::Global => Some(self.global.as_slice()).filter(|s| !s.is_empty()),
        }
    }

    /// Number of distinct pairs stored at a granularity (1 for a non-empty global bucket)
    pub fn pair_count(&self, granularity: Granularity) -> usize {
        match granularity {
            Granularity::IpPair => self.ip.len(),
            Granularity::CityPair => self.city.len(),
            Granularity::CountryPair => self.country.len(),
            Granularity::Global => usize::from(!self.global.is_empty()),
        }
    }

    /// Total number of samples in the global bucket, i.e. probes recorded
    pub fn sample_count(&self) -> usize {
        self.global.len()
    }
}

/// Arithmetic mean of a sample list
pub fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_symmetric() {
        let mut table = LatencyTable::new();
        table.record(SamplePair::Ip("10.0.0.2", "10.0.0.1"), 10.0);
        table.record(SamplePair::Ip("10.0.0.1", "10.0.0.2"), 20.0);

        assert_eq!(table.pair_count(Granularity::IpPair), 1);
        assert_eq!(table.lookup(SamplePair::Ip("10.0.0.1", "10.0.0.2")), Some(&[10.0, 20.0][..]));
        assert_eq!(
            table.lookup(SamplePair::Ip("10.0.0.1", "10.0.0.2")),
            table.lookup(SamplePair::Ip("10.0.0.2", "10.0.0.1"))
        );
    }

    #[test]
    fn test_lookup_symmetry_at_every_granularity() {
        let mut table = LatencyTable::new();
        table.record_probe(("a", "b"), (Some(7), Some(3)), ("US", "DE"), 42.0);

        assert_eq!(table.lookup(SamplePair::City(7, 3)), table.lookup(SamplePair::City(3, 7)));
        assert_eq!(table.lookup(SamplePair::City(3, 7)), Some(&[42.0][..]));
        assert_eq!(
            table.lookup(SamplePair::Country("DE", "US")),
            table.lookup(SamplePair::Country("US", "DE"))
        );
        assert_eq!(table.lookup(SamplePair::Global), Some(&[42.0][..]));
    }

    #[test]
    fn test_city_pair_requires_both_cities() {
        let mut table = LatencyTable::new();
        table.record_probe(("a", "b"), (Some(7), None), ("US", "US"), 5.0);

        assert_eq!(table.pair_count(Granularity::CityPair), 0);
        assert_eq!(table.pair_count(Granularity::CountryPair), 1);
        assert_eq!(table.lookup(SamplePair::Country("US", "US")), Some(&[5.0][..]));
    }

    #[test]
    fn test_missing_pairs_are_absent() {
        let mut table = LatencyTable::new();
        assert!(table.lookup(SamplePair::Global).is_none());

        table.record_probe(("a", "b"), (None, None), ("US", "DE"), 5.0);
        assert!(table.lookup(SamplePair::Ip("a", "c")).is_none());
        assert!(table.lookup(SamplePair::City(1, 2)).is_none());
        assert!(table.lookup(SamplePair::Country("US", "FR")).is_none());
        assert_eq!(table.sample_count(), 1);
    }

    #[test]
    fn test_global_accumulates_every_probe() {
        let mut table = LatencyTable::new();
        table.record_probe(("a", "b"), (None, None), ("US", "DE"), 10.0);
        table.record_probe(("c", "d"), (Some(1), Some(2)), ("FR", "IT"), 30.0);

        let global = table.lookup(SamplePair::Global).unwrap();
        assert_eq!(global, &[10.0, 30.0]);
        assert_eq!(mean(global), 20.0);
    }
}
