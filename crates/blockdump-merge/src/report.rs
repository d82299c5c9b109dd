use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Parameters shared by both merge modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Abort on the first bad height and leave the output untouched.
    pub strict: bool,
    /// JSON-lines log of every bad height.
    pub errors: Option<PathBuf>,
}

impl MergeOptions {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn errors(mut self, path: impl Into<PathBuf>) -> Self {
        self.errors = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub ok:      u64,
    pub fail:    u64,
    pub out:     PathBuf,
    pub written: u64,
}

impl MergeReport {
    pub fn exit_code(&self) -> i32 {
        if self.fail == 0 { 0 } else { 1 }
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "done: ok={} fail={} out={}", self.ok, self.fail, self.out.display())
    }
}
