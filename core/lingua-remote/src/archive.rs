//! Export archive unpacking.

use crate::error::{RemoteError, RemoteResult};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Unpacks a zip archive into `path → UTF-8 contents`.
///
/// Directory entries are skipped; paths use `/` separators without a
/// leading slash. Files that are not valid UTF-8 are skipped with a warning.
pub fn unpack(bytes: &[u8]) -> RemoteResult<BTreeMap<String, String>> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| RemoteError::Archive(e.to_string()))?;
    let mut files = BTreeMap::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| RemoteError::Archive(e.to_string()))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().replace('\\', "/").trim_start_matches('/').to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| RemoteError::Archive(format!("{name}: {e}")))?;

        match String::from_utf8(data) {
            Ok(text) => {
                files.insert(name, text);
            }
            Err(_) => warn!("Skipping non-UTF-8 archive entry: {}", name),
        }
    }

    debug!("Unpacked export archive ({} files)", files.len());
    Ok(files)
}
