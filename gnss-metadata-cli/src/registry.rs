//! JSON document backed station registry
use std::{collections::HashMap, path::Path};

use gnss_metadata::prelude::{Registry, RegistryRecord, StationMetadata};
use serde::Deserialize;

use crate::Error;

#[derive(Debug, thiserror::Error)]
#[error("unknown station \"{0}\"")]
pub struct UnknownStation(pub String);

#[derive(Debug, Clone, Deserialize)]
struct StationEntry {
    #[serde(flatten)]
    metadata: StationMetadata,
    #[serde(default)]
    equipment: Vec<RegistryRecord>,
}

#[derive(Debug, Deserialize)]
struct Document {
    stations: Vec<StationEntry>,
}

/// Registry loaded from a JSON document, indexed by station marker
#[derive(Debug, Default)]
pub struct JsonRegistry {
    stations: HashMap<String, StationEntry>,
}

impl JsonRegistry {
    /// Parses a registry document
    pub fn from_json(content: &str) -> Result<Self, Error> {
        let document: Document = serde_json::from_str(content)?;
        let mut stations = HashMap::with_capacity(document.stations.len());
        for entry in document.stations {
            let marker = entry.metadata.marker.trim().to_uppercase();
            if stations.contains_key(&marker) {
                warn!("station \"{}\" described twice: using first description", marker);
                continue;
            }
            stations.insert(marker, entry);
        }
        Ok(Self { stations })
    }
    /// Loads a registry document
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_json(&content)?;
        debug!(
            "\"{}\": {} station(s)",
            path.display(),
            registry.stations.len()
        );
        Ok(registry)
    }
    fn entry(&self, id: &str) -> Result<&StationEntry, UnknownStation> {
        self.stations
            .get(&id.trim().to_uppercase())
            .ok_or(UnknownStation(id.to_string()))
    }
}

impl Registry for JsonRegistry {
    type Error = UnknownStation;
    fn station(&self, id: &str) -> Result<StationMetadata, Self::Error> {
        Ok(self.entry(id)?.metadata.clone())
    }
    fn equipment(&self, id: &str) -> Result<Vec<RegistryRecord>, Self::Error> {
        Ok(self.entry(id)?.equipment.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss_metadata::prelude::{Domes, Error as MetadataError, IntegrityError};
    use std::path::PathBuf;

    fn stations_json() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("test_resources")
            .join("registry")
            .join("stations.json")
    }

    #[test]
    fn document_loading() {
        let registry = JsonRegistry::from_path(&stations_json()).unwrap();
        let reyk = registry.station("reyk").unwrap();
        assert_eq!(reyk.marker, "REYK");
        assert_eq!(reyk.domes, Some("10202M006".parse::<Domes>().unwrap()));
        assert_eq!(reyk.marker_number(), "10202M006");
        let operator = reyk.operator.unwrap();
        assert_eq!(operator.agency, "Icelandic Met Office");
        assert!(!registry.equipment("REYK").unwrap().is_empty());
        assert!(registry.station("XXXX").is_err());
    }

    #[test]
    fn registry_timelines() {
        let registry = JsonRegistry::from_path(&stations_json()).unwrap();
        let timeline = gnss_metadata::timeline(&registry, "REYK").unwrap();
        assert_eq!(timeline.len(), 3);
        match gnss_metadata::timeline(&registry, "HOFN") {
            Err(MetadataError::Integrity(IntegrityError::OverlappingEvents { .. })) => {},
            other => panic!("expecting integrity error, got {:?}", other),
        }
    }

    #[test]
    fn minimal_document() {
        let registry = JsonRegistry::from_json(
            r#"{"stations": [{"marker": "TEST"}, {"marker": "test"}]}"#,
        )
        .unwrap();
        let station = registry.station("TEST").unwrap();
        assert!(station.domes.is_none());
        assert!(station.position.is_none());
        assert!(registry.equipment("TEST").unwrap().is_empty());
        assert!(JsonRegistry::from_json("{}").is_err());
    }
}
