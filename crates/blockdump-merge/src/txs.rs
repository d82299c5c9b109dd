use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use blockdump_fs::BlockLayout;
use serde_json::Value;

use crate::error::{MergeError, Result};
use crate::report::{MergeOptions, MergeReport};
use crate::sink::{ErrorLog, JsonlWriter};

/// Concatenate per-block transaction files in `heights` order.
///
/// Lines within a block keep their order. A block whose file is missing or
/// holds an unparseable line contributes nothing and counts as failed.
pub fn merge_txs<I, F>(
    heights: I,
    layout: &BlockLayout,
    out: &Path,
    options: &MergeOptions,
    mut on_block: F,
) -> Result<MergeReport>
where
    I: IntoIterator<Item = u64>,
    F: FnMut(u64),
{
    let mut output = JsonlWriter::create(out)?;
    let mut errors = options.errors.as_deref().map(ErrorLog::create).transpose()?;
    let (mut ok, mut fail) = (0, 0);

    for height in heights {
        let path = layout.tx_path_for(height);
        match load(&path) {
            Ok(txs) => {
                for tx in &txs {
                    output.write(tx)?;
                }
                ok += 1;
            }
            Err(reason) => {
                fail += 1;
                tracing::warn!(height, path = %path.display(), "{reason}");
                if let Some(log) = errors.as_mut() {
                    log.record(height, &path, &reason);
                }
                if options.strict {
                    if let Some(log) = errors {
                        log.close();
                    }
                    return Err(MergeError::Strict { height, path, reason });
                }
            }
        }
        on_block(height);
    }

    if let Some(log) = errors {
        log.close();
    }
    let (out, written) = output.finish()?;
    Ok(MergeReport {
        ok,
        fail,
        out,
        written,
    })
}

fn load(path: &Path) -> std::result::Result<Vec<Value>, String> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => "missing tx file".to_string(),
        _ => e.to_string(),
    })?;

    let mut txs = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let tx = serde_json::from_str(line).map_err(|e| format!("line {}: {e}", idx + 1))?;
        txs.push(tx);
    }
    Ok(txs)
}
