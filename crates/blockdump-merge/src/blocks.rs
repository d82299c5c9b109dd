use std::path::Path;

use blockdump_fs::read_json_gz;
use blockdump_fs::record::{HEIGHT_FIELD, annotate};
use serde_json::Value;

use crate::error::{MergeError, Result};
use crate::report::{MergeOptions, MergeReport};
use crate::sink::{ErrorLog, JsonlWriter};
use crate::source::MergeItem;

/// Write every item's block as one line of `out`, in iteration order.
///
/// Objects without a height get one; anything else is wrapped. Bad heights
/// are counted and logged, or abort the merge in strict mode. `out` is only
/// replaced once every item has been visited.
pub fn merge_blocks<I, F>(items: I, out: &Path, options: &MergeOptions, mut on_item: F) -> Result<MergeReport>
where
    I: IntoIterator<Item = MergeItem>,
    F: FnMut(&MergeItem),
{
    let mut output = JsonlWriter::create(out)?;
    let mut errors = options.errors.as_deref().map(ErrorLog::create).transpose()?;
    let (mut ok, mut fail) = (0, 0);

    for item in items {
        match load(&item.path) {
            Ok(value) => {
                output.write(&annotate(item.height, value, HEIGHT_FIELD))?;
                ok += 1;
            }
            Err(reason) => {
                fail += 1;
                tracing::warn!(height = item.height, path = %item.path.display(), "{reason}");
                if let Some(log) = errors.as_mut() {
                    log.record(item.height, &item.path, &reason);
                }
                if options.strict {
                    if let Some(log) = errors {
                        log.close();
                    }
                    return Err(MergeError::Strict {
                        height: item.height,
                        path: item.path,
                        reason,
                    });
                }
            }
        }
        on_item(&item);
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

fn load(path: &Path) -> std::result::Result<Value, String> {
    if !path.exists() {
        return Err(format!("missing file {}", path.display()));
    }
    read_json_gz(path).map_err(|e| e.to_string())
}
