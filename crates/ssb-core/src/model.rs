//! Result Record model.
//!
//! One [`CheckReport`] is produced per Check Unit invocation. Records are
//! assembled entirely inside the unit and are read-only afterwards: the
//! engine only collects and reorders them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

// ---------------------------------------------------------------------------
// Check identity
// ---------------------------------------------------------------------------

/// Identity of one of the ten baseline checks.
///
/// Serialized as its number (`1..=10`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CheckId {
    AccurateInformation = 1,
    ProtectRootUser = 2,
    HumanIdentities = 3,
    UserGroups = 4,
    CloudTrail = 5,
    PublicAccess = 6,
    Alarms = 7,
    UnusedNetwork = 8,
    TrustedAdvisor = 9,
    GuardDuty = 10,
}

impl CheckId {
    /// Every check, in id order.
    pub const ALL: [CheckId; 10] = [
        CheckId::AccurateInformation,
        CheckId::ProtectRootUser,
        CheckId::HumanIdentities,
        CheckId::UserGroups,
        CheckId::CloudTrail,
        CheckId::PublicAccess,
        CheckId::Alarms,
        CheckId::UnusedNetwork,
        CheckId::TrustedAdvisor,
        CheckId::GuardDuty,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Report title. Records are ordered by this string.
    pub fn title(self) -> &'static str {
        match self {
            CheckId::AccurateInformation => "01 Accurate Information",
            CheckId::ProtectRootUser => "02 Protect Root User",
            CheckId::HumanIdentities => "03 Create Users for Human Identities",
            CheckId::UserGroups => "04 Use User Groups",
            CheckId::CloudTrail => "05 Turn CloudTrail On",
            CheckId::PublicAccess => "06 Prevent Public Access to Private S3 Buckets",
            CheckId::Alarms => "07 Configure Alarms",
            CheckId::UnusedNetwork => "08 Delete unused VPCs, Subnets & Security Groups",
            CheckId::TrustedAdvisor => "09 Enable AWS Trusted Advisor",
            CheckId::GuardDuty => "10 Enable GuardDuty",
        }
    }
}

impl TryFrom<u8> for CheckId {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self> {
        CheckId::ALL
            .into_iter()
            .find(|id| id.number() == value)
            .ok_or_else(|| CoreError::UnknownCheck(value.to_string()))
    }
}

impl From<CheckId> for u8 {
    fn from(id: CheckId) -> u8 {
        id.number()
    }
}

impl FromStr for CheckId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| CoreError::UnknownCheck(s.to_string()))?;
        CheckId::try_from(n)
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "check{:02}", self.number())
    }
}

// ---------------------------------------------------------------------------
// Severity and status codes
// ---------------------------------------------------------------------------

/// The five base severities every status code resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Info,
        Severity::Success,
        Severity::Warning,
        Severity::Danger,
        Severity::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Success => "Success",
            Severity::Warning => "Warning",
            Severity::Danger => "Danger",
            Severity::Error => "Error",
        }
    }

    pub fn is_error(self) -> bool {
        self == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic status a check assigns before catalog resolution.
///
/// The base codes share names with [`Severity`]; the remaining codes are
/// check-specific and resolve to a base severity through the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Info,
    Success,
    Warning,
    Danger,
    Error,
    #[serde(rename = "NO_USER")]
    NoUser,
    #[serde(rename = "NO_TRAIL")]
    NoTrail,
    #[serde(rename = "ALL_OFF")]
    AllOff,
    #[serde(rename = "NO_MULTI")]
    NoMulti,
    #[serde(rename = "NO_ALARM")]
    NoAlarm,
    Subscribe,
}

impl StatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Info => "Info",
            StatusCode::Success => "Success",
            StatusCode::Warning => "Warning",
            StatusCode::Danger => "Danger",
            StatusCode::Error => "Error",
            StatusCode::NoUser => "NO_USER",
            StatusCode::NoTrail => "NO_TRAIL",
            StatusCode::AllOff => "ALL_OFF",
            StatusCode::NoMulti => "NO_MULTI",
            StatusCode::NoAlarm => "NO_ALARM",
            StatusCode::Subscribe => "Subscribe",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// One fragment of an alert message, optionally linking to documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePart {
    pub text: String,
    #[serde(default)]
    pub link: String,
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: String::new(),
        }
    }

    pub fn linked(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: link.into(),
        }
    }
}

/// A severity-classified finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub level: Severity,
    pub code: StatusCode,
    pub message: Vec<MessagePart>,
}

impl Alert {
    /// Resolve `(topic, code)` through the catalog.
    pub fn resolve(topic: crate::catalog::AlertTopic, code: StatusCode) -> Result<Self> {
        crate::catalog::lookup(topic, code).map(|template| template.to_alert())
    }

    /// Append provider detail text (e.g. an error message). Empty text is ignored.
    pub fn with_detail(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.message.push(MessagePart::text(text));
        }
        self
    }

    /// Error alert synthesized outside the catalog, used when a unit fails outright.
    pub fn failure(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level: Severity::Error,
            code: StatusCode::Error,
            message: vec![MessagePart::text(detail)],
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Int(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<&String> for Cell {
    fn from(s: &String) -> Self {
        Cell::Text(s.clone())
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

/// Tabular evidence attached to a record.
///
/// Rows only ever grow. When `cols` is non-empty every row must have the
/// same width.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub cols: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(cols: &[&str]) -> Self {
        Self {
            cols: cols.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Table without column headers; rows of any width are accepted.
    pub fn headless() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if !self.cols.is_empty() && row.len() != self.cols.len() {
            return Err(CoreError::RowArity {
                expected: self.cols.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Result Record
// ---------------------------------------------------------------------------

/// The complete output of one Check Unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    id: CheckId,
    title: String,
    alerts: Vec<Alert>,
    tables: Vec<Table>,
}

impl CheckReport {
    pub fn new(id: CheckId, alerts: Vec<Alert>, tables: Vec<Table>) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            alerts,
            tables,
        }
    }

    /// Minimal record standing in for a unit that failed without returning one.
    pub fn failed(id: CheckId, detail: impl Into<String>) -> Self {
        Self::new(id, vec![Alert::failure(id.title(), detail)], Vec::new())
    }

    pub fn id(&self) -> CheckId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Total rows across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(Table::len).sum()
    }

    pub fn has_error(&self) -> bool {
        self.alerts.iter().any(|a| a.level.is_error())
    }

    /// First alert carrying `code`, if any.
    pub fn alert_with(&self, code: StatusCode) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_id_round_trip_through_number() {
        for id in CheckId::ALL {
            assert_eq!(CheckId::try_from(id.number()).unwrap(), id);
        }
        assert!(CheckId::try_from(0).is_err());
        assert!(CheckId::try_from(11).is_err());
    }

    #[test]
    fn test_check_id_parse() {
        assert_eq!(" 5 ".parse::<CheckId>().unwrap(), CheckId::CloudTrail);
        assert!("five".parse::<CheckId>().is_err());
        assert!("12".parse::<CheckId>().is_err());
    }

    #[test]
    fn test_titles_sort_in_id_order() {
        let mut titles: Vec<&str> = CheckId::ALL.iter().map(|id| id.title()).collect();
        let expected = titles.clone();
        titles.reverse();
        titles.sort();
        assert_eq!(titles, expected);
    }

    #[test]
    fn test_status_code_serde_names() {
        assert_eq!(
            serde_json::to_string(&StatusCode::NoTrail).unwrap(),
            "\"NO_TRAIL\""
        );
        assert_eq!(
            serde_json::to_string(&StatusCode::Subscribe).unwrap(),
            "\"Subscribe\""
        );
        assert_eq!(
            serde_json::to_string(&Severity::Danger).unwrap(),
            "\"Danger\""
        );
    }

    #[test]
    fn test_table_rejects_wrong_arity() {
        let mut table = Table::new(&["a", "b"]);
        table.push_row(vec!["x".into(), 1usize.into()]).unwrap();
        let err = table.push_row(vec!["only".into()]).unwrap_err();
        assert!(matches!(err, CoreError::RowArity { expected: 2, actual: 1 }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_headless_table_accepts_any_width() {
        let mut table = Table::headless();
        table.push_row(vec!["a".into()]).unwrap();
        table.push_row(vec!["a".into(), true.into()]).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_cell_untagged_serialization() {
        let row: Vec<Cell> = vec!["arn".into(), true.into(), 3usize.into()];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"["arn",true,3]"#);
        let back: Vec<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_failed_record_carries_error_alert() {
        let record = CheckReport::failed(CheckId::Alarms, "worker panicked");
        assert_eq!(record.title(), "07 Configure Alarms");
        assert!(record.has_error());
        assert_eq!(record.alerts()[0].message[0].text, "worker panicked");
        assert!(record.tables().is_empty());
    }

    #[test]
    fn test_with_detail_skips_empty_text() {
        let alert = Alert::failure("t", "first").with_detail("");
        assert_eq!(alert.message.len(), 1);
        let alert = alert.with_detail("second");
        assert_eq!(alert.message.len(), 2);
    }
}
