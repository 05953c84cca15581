use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Placeholder written when an optional column has no value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Reserved artifact key holding cross-module import metadata.
pub const IMPORT_KEY: &str = "import";

/// `class` tag the compiler gives to NOTIFICATION-TYPE definitions.
pub const NOTIFICATION_CLASS: &str = "notificationtype";

/// One compiled MIB object as emitted by the compiler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefinitionRecord {
    pub name: String,
    pub oid: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub syntax: Option<Syntax>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Syntax {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl DefinitionRecord {
    /// Reads a record from one artifact entry. Fails when `name` or `oid` is
    /// missing or a field has the wrong JSON type.
    pub fn deserialize_entry(entry: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(entry)
    }

    /// Syntax classification, if the compiler recorded one.
    pub fn syntax_type(&self) -> Option<&str> {
        self.syntax.as_ref().and_then(|s| s.kind.as_deref())
    }
}

/// A compiled JSON document, one per MIB module.
#[derive(Debug, Clone)]
pub struct SourceArtifact {
    /// File name without the `.json` extension
    pub stem: String,
    /// Top-level record map
    pub entries: Map<String, Value>,
}

impl SourceArtifact {
    /// Derives the report label for an artifact path.
    pub fn stem_of(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Entries eligible for reporting, i.e. everything but `import`, in
    /// ascending key order whatever order the map keeps.
    pub fn records(&self) -> impl Iterator<Item = (&String, &Value)> {
        let mut records: Vec<_> = self
            .entries
            .iter()
            .filter(|(key, _)| key.as_str() != IMPORT_KEY)
            .collect();
        records.sort_by(|a, b| a.0.cmp(b.0));
        records.into_iter()
    }
}

/// Which records end up in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Notification-type records only
    TrapsOnly,
    /// Every record carrying an OID
    AllRecords,
}

impl ReportMode {
    pub fn header(self) -> &'static [&'static str] {
        match self {
            ReportMode::TrapsOnly => &["MIBFILE", "NAME", "OID", "DESCRIPTION"],
            ReportMode::AllRecords => &["MIBFILE", "NAME", "OID", "TYPE", "DESCRIPTION"],
        }
    }

    /// Selection predicate applied to a raw artifact entry.
    pub fn selects(self, entry: &Value) -> bool {
        match self {
            ReportMode::TrapsOnly => {
                entry.get("class").and_then(Value::as_str) == Some(NOTIFICATION_CLASS)
            }
            ReportMode::AllRecords => entry.get("oid").is_some(),
        }
    }
}

/// One CSV line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub mib_file: String,
    pub name: String,
    pub oid: String,
    /// Only populated in [`ReportMode::AllRecords`]
    pub kind: Option<String>,
    pub description: String,
}

impl ReportRow {
    pub fn from_record(mib_file: &str, record: DefinitionRecord, mode: ReportMode) -> Self {
        let kind = match mode {
            ReportMode::TrapsOnly => None,
            ReportMode::AllRecords => Some(
                record
                    .syntax_type()
                    .unwrap_or(NOT_AVAILABLE)
                    .to_string(),
            ),
        };

        Self {
            mib_file: mib_file.to_string(),
            name: record.name,
            oid: record.oid,
            kind,
            description: record
                .description
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }

    /// Column values in header order.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = vec![self.mib_file.as_str(), self.name.as_str(), self.oid.as_str()];
        if let Some(kind) = &self.kind {
            fields.push(kind);
        }
        fields.push(&self.description);
        fields
    }
}
