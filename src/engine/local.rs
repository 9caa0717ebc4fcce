//! `file:` and `data:` handling
//!
//! Neither touches the network or the cache; the responses carry a body and
//! nothing else.

use std::fs;

use crate::network::{Response, Target};
use crate::utils::Result;

/// Describe a local path.
///
/// A directory yields its entries one per line, sorted, with a trailing `/`
/// on subdirectories. A file yields its name and size, never its contents.
pub fn fetch_file(target: &Target) -> Result<Response> {
    let path = target.file_path()?;
    let metadata = fs::metadata(&path)?;

    if metadata.is_dir() {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() {
                name.push('/');
            }
            entries.push(name);
        }
        entries.sort();
        log::debug!("listed {} entries in {}", entries.len(), path.display());
        return Ok(Response::local(entries.join("\n")));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Response::local(format!(
        "Name: {}\tSize: {} Bytes\n",
        name,
        metadata.len()
    )))
}

/// Return the content of a data URL verbatim
pub fn fetch_data(target: &Target) -> Result<Response> {
    Ok(Response::local(target.data_content()?))
}
