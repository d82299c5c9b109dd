use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const COLUMNS: [&str; 7] = [
    "height",
    "status",
    "path",
    "tries",
    "http_status",
    "error",
    "updated_at_utc",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Fail,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Fail => "fail",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status `{0}`")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ok" => Ok(Status::Ok),
            "fail" => Ok(Status::Fail),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// One recorded outcome for one height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRow {
    pub height:         u64,
    pub status:         Status,
    pub path:           String,
    pub tries:          u32,
    pub http_status:    String,
    pub error:          String,
    pub updated_at_utc: String,
}

impl CheckpointRow {
    pub fn ok(height: u64, path: impl Into<String>, tries: u32, http_status: impl Into<String>) -> Self {
        Self {
            height,
            status: Status::Ok,
            path: path.into(),
            tries,
            http_status: http_status.into(),
            error: String::new(),
            updated_at_utc: utc_now(),
        }
    }

    pub fn fail(
        height: u64,
        path: impl Into<String>,
        tries: u32,
        http_status: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            height,
            status: Status::Fail,
            path: path.into(),
            tries,
            http_status: http_status.into(),
            error: error.into(),
            updated_at_utc: utc_now(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Loosely typed row as found on disk; every column optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawRow {
    height:         String,
    status:         String,
    path:           String,
    tries:          String,
    http_status:    String,
    error:          String,
    updated_at_utc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum RowError {
    #[error("invalid height `{0}`")]
    Height(String),
    #[error(transparent)]
    Status(#[from] ParseStatusError),
    #[error("invalid tries `{0}`")]
    Tries(String),
}

impl TryFrom<RawRow> for CheckpointRow {
    type Error = RowError;

    fn try_from(raw: RawRow) -> Result<Self, Self::Error> {
        let height = raw
            .height
            .trim()
            .parse()
            .map_err(|_| RowError::Height(raw.height.clone()))?;
        let status = raw.status.parse()?;
        let tries = match raw.tries.trim() {
            "" => 0,
            t => t.parse().map_err(|_| RowError::Tries(raw.tries.clone()))?,
        };
        Ok(Self {
            height,
            status,
            path: raw.path.trim().to_string(),
            tries,
            http_status: raw.http_status.trim().to_string(),
            error: raw.error.trim().to_string(),
            updated_at_utc: raw.updated_at_utc.trim().to_string(),
        })
    }
}

pub fn utc_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
