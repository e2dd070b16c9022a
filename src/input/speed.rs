//! Bandwidth speed profile.
//!
//! The profile maps MaxMind city codes and ISO country codes to measured
//! upload/download rates in Mbit/s. Global averages are computed once at
//! load time over all country entries.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// KiB/s per Mbit/s
pub const KIB_PER_MBIT: f64 = 122.07;

/// Convert a rate in Mbit/s to whole KiB/s, truncating
pub fn mbit_to_kib(mbits: f64) -> u64 {
    (mbits * KIB_PER_MBIT) as u64
}

/// Upload and download rate of a region in Mbit/s
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bandwidth {
    pub up_mbits: f64,
    pub down_mbits: f64,
}

impl Bandwidth {
    pub fn up_kib(&self) -> u64 {
        mbit_to_kib(self.up_mbits)
    }

    pub fn down_kib(&self) -> u64 {
        mbit_to_kib(self.down_mbits)
    }
}

/// Which level of the profile a bandwidth lookup resolved at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandwidthSource {
    City,
    Country,
    Global,
}

#[derive(Debug, Deserialize)]
struct RawSpeedData {
    #[serde(default)]
    countries: HashMap<String, Bandwidth>,
    #[serde(default)]
    cities: HashMap<String, Bandwidth>,
}

/// Read-only bandwidth reference data
#[derive(Debug, Clone)]
pub struct SpeedProfile {
    countries: HashMap<String, Bandwidth>,
    cities: HashMap<u32, Bandwidth>,
    global: Bandwidth,
}

impl SpeedProfile {
    /// Build a profile from already-parsed maps, computing the global average
    pub fn new(countries: HashMap<String, Bandwidth>, cities: HashMap<u32, Bandwidth>) -> Self {
        let global = if countries.is_empty() {
            warn!("Speed profile has no country entries; global average bandwidth is 0");
            Bandwidth { up_mbits: 0.0, down_mbits: 0.0 }
        } else {
            let n = countries.len() as f64;
            Bandwidth {
                up_mbits: countries.values().map(|b| b.up_mbits).sum::<f64>() / n,
                down_mbits: countries.values().map(|b| b.down_mbits).sum::<f64>() / n,
            }
        };

        Self { countries, cities, global }
    }

    /// Parse a speed profile from JSON
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: RawSpeedData = serde_json::from_reader(reader).wrap_err("Failed to parse speed profile JSON")?;

        let mut cities = HashMap::with_capacity(raw.cities.len());
        for (code, bandwidth) in raw.cities {
            match code.trim().parse::<u32>() {
                Ok(city) => {
                    cities.insert(city, bandwidth);
                }
                Err(_) => warn!("Skipping speed profile city with non-numeric code '{}'", code),
            }
        }

        Ok(Self::new(raw.countries, cities))
    }

    /// Load a speed profile from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading speedtest data from {}...", path.display());

        let file = File::open(path)
            .wrap_err_with(|| format!("Failed to open speed profile '{}'", path.display()))?;
        let profile = Self::from_reader(BufReader::new(file))
            .wrap_err_with(|| format!("Invalid speed profile '{}'", path.display()))?;

        info!(
            "Found global averages: {} mbit/s up, {} mbit/s down ({} countries, {} cities)",
            profile.global.up_mbits,
            profile.global.down_mbits,
            profile.countries.len(),
            profile.cities.len()
        );

        Ok(profile)
    }

    pub fn city(&self, city: u32) -> Option<&Bandwidth> {
        self.cities.get(&city)
    }

    pub fn country(&self, country: &str) -> Option<&Bandwidth> {
        self.countries.get(country)
    }

    /// Mean over all country entries
    pub fn global(&self) -> &Bandwidth {
        &self.global
    }

    /// Resolve bandwidth for a location, preferring city, then country, then
    /// the global average
    pub fn resolve(&self, city: Option<u32>, country: &str) -> (Bandwidth, BandwidthSource) {
        if let Some(bandwidth) = city.and_then(|c| self.city(c)) {
            return (*bandwidth, BandwidthSource::City);
        }
        if let Some(bandwidth) = self.country(country) {
            return (*bandwidth, BandwidthSource::Country);
        }
        (self.global, BandwidthSource::Global)
    }
}
