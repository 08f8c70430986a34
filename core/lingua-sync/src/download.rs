//! Extraction of one namespace's entries from an export archive.
//!
//! Archive paths look like `<remote-locale>/<remote path>/<file>`, e.g.
//! `de-DE/core/gui/shop.yml`. The remote path selects the namespace and the
//! rest is the file relative to the namespace directory, which fixes the
//! key prefix exactly as on disk.

use lingua_remote::LocaleMapper;
use lingua_store::{codec, layout};
use lingua_types::{EntryOrigin, Translation};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Entries found for one namespace, plus per-file problems.
#[derive(Debug, Default)]
pub struct RemoteEntries {
    pub entries: Vec<Translation>,
    pub errors: Vec<String>,
    /// Source-language files present in the archive and ignored.
    pub skipped_source_files: usize,
}

/// Pulls the entries of `namespace` out of an unpacked archive.
///
/// Source-language files are never returned: remote copies of the source
/// are not authoritative.
pub fn extract_namespace_entries(
    files: &BTreeMap<String, String>,
    namespace: &str,
    remote_path: &str,
    source_language: &str,
    mapper: &LocaleMapper,
) -> RemoteEntries {
    let remote_prefix = format!("{}/", remote_path.trim_matches('/'));
    let mut out = RemoteEntries::default();

    for (path, contents) in files {
        let Some((remote_locale, rest)) = path.split_once('/') else {
            continue;
        };
        let Some(relative) = rest.strip_prefix(&remote_prefix) else {
            continue;
        };
        if !layout::has_translation_extension(relative) {
            continue;
        }
        let language = mapper.to_local(remote_locale);
        if language.is_empty() {
            continue;
        }
        if language.eq_ignore_ascii_case(source_language) {
            debug!("Ignoring remote copy of source file {}", path);
            out.skipped_source_files += 1;
            continue;
        }

        let prefix = match layout::key_prefix_for_file(relative) {
            Ok(prefix) => prefix,
            Err(err) => {
                warn!("Skipping archive file {}: {}", path, err);
                out.errors.push(format!("{path}: {err}"));
                continue;
            }
        };
        match codec::parse_entries(path, contents, namespace, &language, &prefix) {
            Ok(entries) => {
                debug!("Parsed {} entries from {}", entries.len(), path);
                out.entries.extend(
                    entries
                        .into_iter()
                        .map(|entry| entry.with_origin(EntryOrigin::Remote)),
                );
            }
            Err(err) => {
                warn!("Skipping archive file {}: {}", path, err);
                out.errors.push(format!("{path}: {err}"));
            }
        }
    }
    out
}
