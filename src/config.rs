//! Run configuration.
//!
//! Every URL, file list and external program the pipeline touches lives in
//! [`HarvestConfig`]. The defaults reproduce the Arista/IETF/IEEE/IANA sources;
//! a JSON file can override any subset of them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ARISTA_MIB_PAGE: &str =
    "https://www.arista.com/en/support/product-documentation/arista-snmp-mibs";
pub const ARISTA_DOWNLOAD_PREFIX: &str = "https://www.arista.com";
pub const IETF_URL: &str = "https://www.simpleweb.org/ietf/mibs/modules/IETF/txt/";
pub const IEEE_URL: &str = "http://www.ieee802.org/1/files/public/MIBs/";
pub const IANA_URL: &str = "https://www.simpleweb.org/ietf/mibs/modules/IANA/txt/";

const IETF_FILES: &[&str] = &[
    "P-BRIDGE-MIB",
    "RFC1213-MIB",
    "RFC-1212",
    "RFC1155-SMI",
    "RFC1271-MIB",
    "INET-ADDRESS-MIB",
    "TOKEN-RING-RMON-MIB",
    "SNMP-FRAMEWORK-MIB",
    "SNMPv2-CONF",
    "SNMPv2-TC",
    "ENTITY-STATE-TC-MIB",
    "SNMPv2-SMI",
    "MAU-MIB",
    "IF-MIB",
    "Q-BRIDGE-MIB",
    "RMON-MIB",
    "RMON2-MIB",
    "HC-RMON-MIB",
    "EtherLike-MIB",
    "SNMPv2-MIB",
    "IF-INVERTED-STACK-MIB",
    "IP-FORWARD-MIB",
    "BRIDGE-MIB",
    "UDP-MIB",
    "TCP-MIB",
    "IP-MIB",
    "VRRP-MIB",
    "IPMROUTE-STD-MIB",
    "IGMP-STD-MIB",
    "PIM-MIB",
    "HOST-RESOURCES-MIB",
    "ENTITY-MIB",
    "ENTITY-SENSOR-MIB",
    "ENTITY-STATE-MIB",
    "MSDP-MIB",
    "OSPF-MIB",
    "BGP4-MIB",
    "SNMP-TLS-TM-MIB",
    "SNMP-TSM-MIB",
];

const IEEE_FILES: &[&str] = &[
    "lldp.mib",
    "lldp_dot1.mib",
    "lldp_dot3.mib",
    "IEEE8021-PFC-MIB-201412150000Z.mib",
];

const IANA_FILES: &[&str] = &["IANA-MAU-MIB", "IANAifType-MIB"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub vendor: VendorSource,
    pub mib_sets: Vec<MibSet>,
    pub compiler: CompilerConfig,
    pub transfer: TransferConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            vendor: VendorSource::default(),
            mib_sets: MibSet::standard_sets(),
            compiler: CompilerConfig::default(),
            transfer: TransferConfig::default(),
        }
    }
}

impl HarvestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Vendor documentation page scraped for proprietary MIB links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorSource {
    pub page_url: String,
    /// Substring an anchor must contain to be harvested
    pub link_filter: String,
    /// Prepended to each harvested href
    pub download_prefix: String,
}

impl Default for VendorSource {
    fn default() -> Self {
        Self {
            page_url: ARISTA_MIB_PAGE.to_string(),
            link_filter: ".txt".to_string(),
            download_prefix: ARISTA_DOWNLOAD_PREFIX.to_string(),
        }
    }
}

/// A statically enumerated group of standard MIBs sharing one base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MibSet {
    pub label: String,
    pub base_url: String,
    pub files: Vec<String>,
}

impl MibSet {
    fn new(label: &str, base_url: &str, files: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            base_url: base_url.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// The IETF, IEEE and IANA sets.
    pub fn standard_sets() -> Vec<MibSet> {
        vec![
            MibSet::new("IETF", IETF_URL, IETF_FILES),
            MibSet::new("IEEE", IEEE_URL, IEEE_FILES),
            MibSet::new("IANA", IANA_URL, IANA_FILES),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub program: String,
    /// System-wide MIB directories; the working directory is always appended
    pub mib_sources: Vec<String>,
    /// Per-file limit; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl CompilerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "mibdump.py".to_string(),
            mib_sources: vec!["/usr/share/snmp".to_string()],
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub program: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            program: "curl".to_string(),
        }
    }
}
