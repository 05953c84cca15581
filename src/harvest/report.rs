//! JSON artifact → CSV report flattening.
//!
//! Every `*.json` file in the working directory is treated as a compiled MIB,
//! including artifacts left over from earlier runs. Artifacts are read in file
//! name order and records in ascending key order, so the same directory always yields
//! the same report.

use async_trait::async_trait;
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::harvest::traits::{HarvestStage, ReportError};
use crate::harvest::workdir::files_with_extension;
use crate::model::{DefinitionRecord, ReportMode, ReportRow, SourceArtifact};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub output: PathBuf,
    pub mode: ReportMode,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportStats {
    pub artifacts: usize,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct ReportGenerator {
    workdir: PathBuf,
}

impl ReportGenerator {
    pub fn new(workdir: PathBuf) -> Self {
        Self { workdir }
    }

    /// Parses every JSON artifact in the working directory.
    pub fn load_artifacts(&self) -> Result<Vec<SourceArtifact>, ReportError> {
        let paths = files_with_extension(&self.workdir, "json").map_err(|source| {
            ReportError::Io {
                path: self.workdir.clone(),
                source,
            }
        })?;

        paths.iter().map(|path| load_artifact(path)).collect()
    }

    /// Writes the report. Rows are fully collected before the output file is
    /// created, so any error leaves no CSV behind.
    pub fn generate(&self, request: &ReportRequest) -> Result<ReportStats, ReportError> {
        let artifacts = self.load_artifacts()?;
        let rows = collect_rows(&artifacts, request.mode)?;

        let file = File::create(&request.output).map_err(|source| ReportError::Io {
            path: request.output.clone(),
            source,
        })?;
        write_csv(file, request.mode, &rows)?;

        Ok(ReportStats {
            artifacts: artifacts.len(),
            rows: rows.len(),
        })
    }
}

pub fn load_artifact(path: &Path) -> Result<SourceArtifact, ReportError> {
    let raw = std::fs::read(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_slice(&raw).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Object(entries) = document else {
        return Err(ReportError::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    Ok(SourceArtifact {
        stem: SourceArtifact::stem_of(path),
        entries,
    })
}

/// Flattens artifacts into rows for `mode`, artifact by artifact.
pub fn collect_rows(
    artifacts: &[SourceArtifact],
    mode: ReportMode,
) -> Result<Vec<ReportRow>, ReportError> {
    let mut rows = Vec::new();

    for artifact in artifacts {
        let before = rows.len();
        for (key, entry) in artifact.records() {
            if !mode.selects(entry) {
                continue;
            }
            let record = DefinitionRecord::deserialize_entry(entry).map_err(|source| {
                ReportError::MalformedRecord {
                    artifact: artifact.stem.clone(),
                    key: key.clone(),
                    source,
                }
            })?;
            rows.push(ReportRow::from_record(&artifact.stem, record, mode));
        }
        debug!(artifact = %artifact.stem, rows = rows.len() - before, "Flattened artifact");
    }

    Ok(rows)
}

pub fn write_csv<W: Write>(
    writer: W,
    mode: ReportMode,
    rows: &[ReportRow],
) -> Result<(), csv::Error> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    csv.write_record(mode.header())?;
    for row in rows {
        csv.write_record(row.fields())?;
    }
    csv.flush()?;
    Ok(())
}

#[async_trait]
impl HarvestStage for ReportGenerator {
    type Input = ReportRequest;
    type Output = ReportStats;
    type Error = ReportError;

    #[instrument(skip_all, fields(output = %request.output.display()))]
    async fn execute(&self, request: ReportRequest) -> Result<ReportStats, ReportError> {
        match request.mode {
            ReportMode::TrapsOnly => info!(
                "Parsing JSON files for MIB notifications only and generating file {}",
                request.output.display()
            ),
            ReportMode::AllRecords => info!(
                "Parsing JSON files for all OIDs and generating file {}",
                request.output.display()
            ),
        }

        let generator = self.clone();
        let stats = tokio::task::spawn_blocking(move || generator.generate(&request))
            .await
            .map_err(|e| ReportError::Task(e.to_string()))??;

        info!(
            artifacts = stats.artifacts,
            rows = stats.rows,
            "Report written"
        );
        Ok(stats)
    }

    fn stage_name(&self) -> &'static str {
        "report"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_artifact(dir: &Path, name: &str, body: &Value) {
        std::fs::write(dir.join(name), serde_json::to_vec_pretty(body).unwrap()).unwrap();
    }

    fn foo_artifact() -> Value {
        json!({
            "import": {"class": "imports", "SNMPv2-SMI": ["MODULE-IDENTITY"]},
            "alarmRaised": {
                "name": "alarmRaised",
                "oid": "1.3.6.1.4.1.9.9.1",
                "class": "notificationtype",
                "description": "An alarm"
            }
        })
    }

    fn run(dir: &TempDir, mode: ReportMode) -> (ReportStats, String) {
        let output = dir.path().join("out.csv");
        let stats = ReportGenerator::new(dir.path().into())
            .generate(&ReportRequest {
                output: output.clone(),
                mode,
            })
            .unwrap();
        (stats, std::fs::read_to_string(output).unwrap())
    }

    #[test]
    fn test_traps_only_single_artifact() {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "FOO.json", &foo_artifact());

        let (stats, csv) = run(&dir, ReportMode::TrapsOnly);

        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "MIBFILE,NAME,OID,DESCRIPTION",
                "FOO,alarmRaised,1.3.6.1.4.1.9.9.1,An alarm",
            ]
        );
        assert_eq!(stats, ReportStats { artifacts: 1, rows: 1 });
    }

    #[test]
    fn test_all_records_without_syntax() {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "FOO.json", &foo_artifact());

        let (_, csv) = run(&dir, ReportMode::AllRecords);

        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "MIBFILE,NAME,OID,TYPE,DESCRIPTION",
                "FOO,alarmRaised,1.3.6.1.4.1.9.9.1,N/A,An alarm",
            ]
        );
    }

    #[test]
    fn test_missing_optional_fields_become_placeholders() {
        let dir = TempDir::new().unwrap();
        write_artifact(
            dir.path(),
            "BAR-MIB.json",
            &json!({
                "barTable": {"name": "barTable", "oid": "1.3.6.1.4.1.99.1", "class": "objecttype"},
                "barCount": {
                    "name": "barCount",
                    "oid": "1.3.6.1.4.1.99.2",
                    "class": "objecttype",
                    "syntax": {"type": "Counter64", "class": "type"},
                    "description": "Number of bars, \"quoted\""
                },
                "meta": {"comments": [], "module": "BAR-MIB"}
            }),
        );

        let (stats, csv) = run(&dir, ReportMode::AllRecords);

        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(stats.rows, 2);
        assert_eq!(
            lines[1],
            r#"BAR-MIB,barCount,1.3.6.1.4.1.99.2,Counter64,"Number of bars, ""quoted""""#
        );
        assert_eq!(lines[2], "BAR-MIB,barTable,1.3.6.1.4.1.99.1,N/A,N/A");
    }

    #[test]
    fn test_traps_only_ignores_other_classes() {
        let dir = TempDir::new().unwrap();
        write_artifact(
            dir.path(),
            "MIX.json",
            &json!({
                "scalar": {"name": "scalar", "oid": "1.1", "class": "objecttype"},
                "group": {"name": "group", "oid": "1.2", "class": "notificationgroup"},
                "trap": {"name": "trap", "oid": "1.3", "class": "notificationtype"}
            }),
        );

        let (_, csv) = run(&dir, ReportMode::TrapsOnly);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines, vec!["MIBFILE,NAME,OID,DESCRIPTION", "MIX,trap,1.3,N/A"]);
    }

    #[test]
    fn test_import_never_reported() {
        let dir = TempDir::new().unwrap();
        write_artifact(
            dir.path(),
            "IMP.json",
            &json!({"import": {"name": "import", "oid": "0.0", "class": "notificationtype"}}),
        );

        for mode in [ReportMode::TrapsOnly, ReportMode::AllRecords] {
            let (stats, csv) = run(&dir, mode);
            assert_eq!(stats.rows, 0);
            assert_eq!(csv.lines().count(), 1);
        }
    }

    #[test]
    fn test_artifacts_and_keys_are_sorted() {
        let dir = TempDir::new().unwrap();
        write_artifact(
            dir.path(),
            "ZED.json",
            &json!({"b": {"name": "b", "oid": "9.2"}, "a": {"name": "a", "oid": "9.1"}}),
        );
        write_artifact(dir.path(), "ALPHA.json", &json!({"x": {"name": "x", "oid": "1.1"}}));

        let (stats, csv) = run(&dir, ReportMode::AllRecords);

        let names: Vec<_> = csv
            .lines()
            .skip(1)
            .map(|l| l.split(',').take(2).collect::<Vec<_>>().join(","))
            .collect();
        assert_eq!(names, vec!["ALPHA,x", "ZED,a", "ZED,b"]);
        assert_eq!(stats.artifacts, 2);
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "FOO.json", &foo_artifact());
        write_artifact(
            dir.path(),
            "BAR.json",
            &json!({"q": {"name": "q", "oid": "2.2", "class": "notificationtype"}}),
        );

        let (_, first) = run(&dir, ReportMode::TrapsOnly);
        let (_, second) = run(&dir, ReportMode::TrapsOnly);
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_json_aborts_without_output() {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "FOO.json", &foo_artifact());
        std::fs::write(dir.path().join("BROKEN.json"), b"{\"a\": ").unwrap();
        let output = dir.path().join("out.csv");

        let err = ReportGenerator::new(dir.path().into())
            .generate(&ReportRequest {
                output: output.clone(),
                mode: ReportMode::AllRecords,
            })
            .unwrap_err();

        assert!(matches!(err, ReportError::Json { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_selected_record_without_name_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "NONAME.json", &json!({"x": {"oid": "1.2.3"}}));

        let err = ReportGenerator::new(dir.path().into())
            .generate(&ReportRequest {
                output: dir.path().join("out.csv"),
                mode: ReportMode::AllRecords,
            })
            .unwrap_err();

        match err {
            ReportError::MalformedRecord { artifact, key, .. } => {
                assert_eq!(artifact, "NONAME");
                assert_eq!(key, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_object_artifact_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("LIST.json"), b"[1, 2]").unwrap();

        let err = ReportGenerator::new(dir.path().into())
            .load_artifacts()
            .unwrap_err();
        assert!(matches!(err, ReportError::NotAnObject { .. }));
    }

    #[tokio::test]
    async fn test_stage_execute() {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "FOO.json", &foo_artifact());
        let generator = ReportGenerator::new(dir.path().into());

        let stats = generator
            .execute(ReportRequest {
                output: dir.path().join("traps.csv"),
                mode: ReportMode::TrapsOnly,
            })
            .await
            .unwrap();

        assert_eq!(stats.rows, 1);
        assert!(dir.path().join("traps.csv").exists());
    }
}
