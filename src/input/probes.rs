//! Latency probe records.
//!
//! Probes are read from a CSV file with the header
//! `src,dst,src_country,dst_country,src_city,dst_city,src_city_name,dst_city_name,latency`.
//! City codes are MaxMind integer ids; an empty field or `0` means the
//! endpoint could not be resolved to a city.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

/// One measured latency between two endpoints
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProbeRecord {
    pub src: String,
    pub dst: String,
    pub src_country: String,
    pub dst_country: String,
    #[serde(deserialize_with = "city_code")]
    pub src_city: Option<u32>,
    #[serde(deserialize_with = "city_code")]
    pub dst_city: Option<u32>,
    #[serde(default)]
    pub src_city_name: String,
    #[serde(default)]
    pub dst_city_name: String,
    /// Milliseconds
    pub latency: f64,
}

fn city_code<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let code = Option::<u32>::deserialize(deserializer)?;
    Ok(code.filter(|&c| c != 0))
}

/// Parse every probe record from CSV input, in file order
pub fn read_probes<R: Read>(reader: R) -> Result<Vec<ProbeRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut probes = Vec::new();
    for (index, record) in rdr.deserialize::<ProbeRecord>().enumerate() {
        // index 0 is the first data row, line 2 of the file
        let probe = record.wrap_err_with(|| format!("Malformed probe record at data row {}", index + 1))?;
        probes.push(probe);
    }

    Ok(probes)
}

/// Load all latency probes from a CSV file
pub fn load_probes(path: &Path) -> Result<Vec<ProbeRecord>> {
    info!("Loading latency probes from {}...", path.display());

    let file = std::fs::File::open(path)
        .wrap_err_with(|| format!("Failed to open latency probes '{}'", path.display()))?;
    let probes = read_probes(std::io::BufReader::new(file))
        .wrap_err_with(|| format!("Invalid latency probes '{}'", path.display()))?;

    info!("Loaded {} latency probes", probes.len());
    Ok(probes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "src,dst,src_country,dst_country,src_city,dst_city,src_city_name,dst_city_name,latency\n";

    #[test]
    fn test_read_probes() {
        let data = format!(
            "{}{}{}",
            HEADER,
            "1.1.1.1,2.2.2.2,US,DE,5128581,2950159,New York,Berlin,50.5\n",
            "1.1.1.1,3.3.3.3,US,FR,5128581,,New York,,80\n",
        );

        let probes = read_probes(data.as_bytes()).unwrap();
        assert_eq!(probes.len(), 2);

        assert_eq!(probes[0].src, "1.1.1.1");
        assert_eq!(probes[0].dst_city, Some(2950159));
        assert_eq!(probes[0].dst_city_name, "Berlin");
        assert_eq!(probes[0].latency, 50.5);

        assert_eq!(probes[1].src_city, Some(5128581));
        assert_eq!(probes[1].dst_city, None);
        assert_eq!(probes[1].latency, 80.0);
    }

    #[test]
    fn test_zero_city_code_is_absent() {
        let data = format!("{}{}", HEADER, "1.1.1.1,2.2.2.2,US,DE,0,0,,,12\n");

        let probes = read_probes(data.as_bytes()).unwrap();
        assert_eq!(probes[0].src_city, None);
        assert_eq!(probes[0].dst_city, None);
    }

    #[test]
    fn test_malformed_latency_is_an_error() {
        let data = format!("{}{}", HEADER, "1.1.1.1,2.2.2.2,US,DE,1,2,a,b,fast\n");

        let err = read_probes(data.as_bytes()).unwrap_err();
        assert!(format!("{:?}", err).contains("data row 1"));
    }

    #[test]
    fn test_empty_input() {
        let probes = read_probes(HEADER.as_bytes()).unwrap();
        assert!(probes.is_empty());
    }
}
