//! Package records - dependency risk/license metadata
//!
//! Packages are keyed by name across the whole store. Ingesting another
//! project that references the same package replaces the stored version.

use serde::{Deserialize, Serialize};

/// Risk level used when a package is not in the known table.
pub const UNKNOWN_RISK: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(rename = "package")]
    pub name: String,
    pub version: String,
    pub risk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            risk: UNKNOWN_RISK.to_string(),
            license: None,
        }
    }

    pub fn with_risk(mut self, risk: impl Into<String>) -> Self {
        self.risk = risk.into();
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    /// High-risk entries are the ones the known table flags as `High...`
    pub fn is_high_risk(&self) -> bool {
        self.risk.starts_with("High")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_wire_shape() {
        let pkg = PackageRecord::new("Dapper", "2.1.0")
            .with_risk("Low")
            .with_license("Apache-2.0");
        let json = serde_json::to_value(&pkg).unwrap();
        assert_eq!(json["package"], "Dapper");
        assert_eq!(json["license"], "Apache-2.0");

        let bare = serde_json::to_value(PackageRecord::new("Foo", "")).unwrap();
        assert_eq!(bare["risk"], UNKNOWN_RISK);
        assert!(bare.get("license").is_none());
    }
}
