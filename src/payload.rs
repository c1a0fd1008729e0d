use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

use crate::util::{parse_host_port, DEFAULT_PORT};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to read payload {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("payload {path} does not match the expected schema: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("service {service:?}, group {group:?}: invalid target {target:?}: {reason}")]
    InvalidTarget {
        service: String,
        group: String,
        target: String,
        reason: String,
    },
}

/// One service being measured. `G` is the per-group payload: the raw target
/// list on input, the collected samples in the report.
///
/// Fields are declared in sorted order so the report reads the same as its
/// sorted-key JSON.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceEntry<G> {
    pub domains: Vec<String>,
    pub ips: IpGroups<G>,
    pub title: String,
    /// Unknown fields are carried through to the report untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named groups in the order they appear in the payload. A repeated name
/// keeps its first position and its last value.
#[derive(Debug, Clone, PartialEq)]
pub struct IpGroups<G>(pub Vec<(String, G)>);

impl<G> IpGroups<G> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &G)> {
        self.0.iter().map(|(name, g)| (name.as_str(), g))
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&G> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<G: Serialize> Serialize for IpGroups<G> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, g) in &self.0 {
            map.serialize_entry(name, g)?;
        }
        map.end()
    }
}

impl<'de, G: Deserialize<'de>> Deserialize<'de> for IpGroups<G> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor<G>(PhantomData<G>);

        impl<'de, G: Deserialize<'de>> Visitor<'de> for GroupsVisitor<G> {
            type Value = IpGroups<G>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping group names to target lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut groups: Vec<(String, G)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, g)) = access.next_entry::<String, G>()? {
                    match groups.iter_mut().find(|(n, _)| *n == name) {
                        Some(slot) => slot.1 = g,
                        None => groups.push((name, g)),
                    }
                }
                Ok(IpGroups(groups))
            }
        }

        deserializer.deserialize_map(GroupsVisitor(PhantomData))
    }
}

/// A payload entry resolved to where the probe connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub raw: String,
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let (host, port) = parse_host_port(raw, DEFAULT_PORT)?;
        Ok(Self {
            raw: raw.to_string(),
            host,
            port,
        })
    }
}

pub type RawServiceEntry = ServiceEntry<Vec<String>>;
pub type ServicePlan = ServiceEntry<Vec<Target>>;

/// Parse and validate payload text.
pub fn parse_payload(path: &Path, content: &str) -> Result<Vec<ServicePlan>, PayloadError> {
    let raw: Vec<RawServiceEntry> =
        serde_json::from_str(content).map_err(|source| PayloadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    raw.into_iter().map(resolve_targets).collect()
}

fn resolve_targets(entry: RawServiceEntry) -> Result<ServicePlan, PayloadError> {
    let ServiceEntry { domains, ips, title, extra } = entry;
    let mut groups = Vec::with_capacity(ips.len());
    for (group, targets) in ips.0 {
        let resolved = targets
            .iter()
            .map(|t| {
                Target::parse(t).map_err(|e| PayloadError::InvalidTarget {
                    service: title.clone(),
                    group: group.clone(),
                    target: t.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        groups.push((group, resolved));
    }

    Ok(ServiceEntry {
        domains,
        ips: IpGroups(groups),
        title,
        extra,
    })
}

/// Load the payload file. A missing file is not an error: there is simply
/// nothing to measure.
pub async fn load_payload(path: &Path) -> Result<Option<Vec<ServicePlan>>, PayloadError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| PayloadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_payload(path, &content).map(Some)
}
