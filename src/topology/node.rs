//! Node synthesis.

use log::trace;

use crate::input::SpeedProfile;
use crate::topology::types::{CityInfo, Node};

/// Build a node with bandwidth resolved from the speed profile
///
/// Bandwidth comes from the city entry when the city code is known to the
/// profile, otherwise from the country entry, otherwise from the global
/// average.
pub fn synthesize_node(ip: &str, city: Option<CityInfo>, country: &str, profile: &SpeedProfile) -> Node {
    let (bandwidth, source) = profile.resolve(city.as_ref().map(|c| c.code), country);
    trace!("Bandwidth for {} resolved at {:?}", ip, source);

    Node {
        ip: ip.to_string(),
        country: country.to_string(),
        city,
        bandwidth_up: bandwidth.up_kib(),
        bandwidth_down: bandwidth.down_kib(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Bandwidth;
    use std::collections::HashMap;

    fn city(code: u32, name: &str) -> CityInfo {
        CityInfo { code, name: name.to_string() }
    }

    fn profile() -> SpeedProfile {
        let countries = HashMap::from([
            ("US".to_string(), Bandwidth { up_mbits: 10.0, down_mbits: 100.0 }),
            ("DE".to_string(), Bandwidth { up_mbits: 30.0, down_mbits: 50.0 }),
        ]);
        let cities = HashMap::from([(5128581, Bandwidth { up_mbits: 1.0, down_mbits: 2.0 })]);
        SpeedProfile::new(countries, cities)
    }

    #[test]
    fn test_city_bandwidth_wins() {
        let node = synthesize_node("1.1.1.1", Some(city(5128581, "New York")), "US", &profile());

        assert_eq!(node.bandwidth_up, 122);
        assert_eq!(node.bandwidth_down, 244);
        assert_eq!(node.city_code(), Some(5128581));
        assert_eq!(node.city_name(), Some("New York"));
    }

    #[test]
    fn test_country_fallback() {
        let node = synthesize_node("1.1.1.1", Some(city(1, "Nowhere")), "US", &profile());

        assert_eq!(node.bandwidth_up, 1220);
        assert_eq!(node.bandwidth_down, 12207);
        assert_eq!(node.city_code(), Some(1));
    }

    #[test]
    fn test_global_fallback_without_city() {
        let node = synthesize_node("1.1.1.1", None, "ZZ", &profile());

        // global average: 20 up, 75 down
        assert_eq!(node.bandwidth_up, 2441);
        assert_eq!(node.bandwidth_down, 9155);
        assert!(node.city.is_none());
        assert_eq!(node.city_name(), None);
        assert_eq!(node.country, "ZZ");
    }
}
