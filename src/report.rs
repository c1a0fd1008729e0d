use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::Path;
use tokio::fs;

use crate::scheduler::ServiceReport;

/// Render the report as 4-space indented JSON with every object's keys
/// sorted. Non-ASCII text is written as-is.
pub fn render_report(report: &[ServiceReport]) -> Result<String> {
    let mut value = serde_json::to_value(report).context("failed to encode report")?;
    value.sort_all_objects();

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).context("failed to encode report")?;
    Ok(String::from_utf8(buf)?)
}

/// Write the report, replacing any previous one at `path`.
pub async fn save_report(report: &[ServiceReport], path: &Path) -> Result<()> {
    let text = render_report(report)?;
    fs::write(path, text)
        .await
        .with_context(|| format!("failed to write report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::IpResultSet;
    use crate::payload::{IpGroups, ServiceEntry};
    use crate::prober::{ProbeOutcome, ProbeResult};
    use serde_json::{Map, Value};

    fn sample() -> Vec<ServiceReport> {
        let results: IpResultSet = vec![
            ProbeResult {
                host: "17.0.0.2".into(),
                outcome: ProbeOutcome::Failure,
            },
            ProbeResult {
                host: "17.0.0.1".into(),
                outcome: ProbeOutcome::Success(21.5),
            },
        ]
        .into_iter()
        .collect();

        let mut extra = Map::new();
        extra.insert("comment".into(), Value::from("北京"));

        vec![ServiceEntry {
            domains: vec!["swcdn.example".into()],
            ips: IpGroups(vec![("zz".into(), results), ("aa".into(), IpResultSet::new())]),
            title: "Apple".into(),
            extra,
        }]
    }

    #[test]
    fn keys_are_sorted_and_indented() {
        let text = render_report(&sample()).unwrap();
        let expected = r#"[
    {
        "comment": "北京",
        "domains": [
            "swcdn.example"
        ],
        "ips": {
            "aa": {},
            "zz": {
                "17.0.0.1": [
                    21.5
                ],
                "17.0.0.2": [
                    false
                ]
            }
        },
        "title": "Apple"
    }
]"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_report_is_empty_array() {
        assert_eq!(render_report(&[]).unwrap(), "[]");
    }

    #[tokio::test]
    async fn save_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apple-cdn-speed.report");
        std::fs::write(&path, "stale contents that are longer than the new report").unwrap();

        save_report(&[], &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("report");
        assert!(save_report(&sample(), &path).await.is_err());
    }
}
