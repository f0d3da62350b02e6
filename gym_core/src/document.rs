//! JSON document persistence with file locking.
//!
//! Whole documents are read under a shared lock and written atomically
//! through a locked temp file in the same directory.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Load a JSON document, returning the default when it does not exist.
///
/// A document that cannot be parsed is moved aside to `<name>.corrupt`
/// and the default is returned.
pub fn load<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::debug!("No document at {:?}, using default", path);
        return Ok(T::default());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    if contents.trim().is_empty() {
        return Ok(T::default());
    }

    match serde_json::from_str::<T>(&contents) {
        Ok(document) => {
            tracing::debug!("Loaded document from {:?}", path);
            Ok(document)
        }
        Err(e) => {
            let aside = path.with_extension("corrupt");
            tracing::warn!(
                "Failed to parse {:?}: {}. Moved to {:?}, starting empty.",
                path,
                e,
                aside
            );
            std::fs::rename(path, &aside)?;
            Ok(T::default())
        }
    }
}

/// Save a JSON document atomically
///
/// 1. Write to a temp file in the target directory
/// 2. Sync to disk
/// 3. Rename over the original
pub fn save<T>(path: &Path, document: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    replace_with(path, |file| {
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, document)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    })?;

    tracing::debug!("Saved document to {:?}", path);
    Ok(())
}

/// Replace `path` with raw bytes, using the same temp-file rename as [`save`]
pub fn write_blob(path: &Path, bytes: &[u8]) -> Result<()> {
    replace_with(path, |mut file| {
        file.write_all(bytes)?;
        Ok(())
    })
}

fn replace_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&File) -> Result<()>,
{
    let parent = path
        .parent()
        .ok_or_else(|| Error::Other(format!("document path {:?} has no parent", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    write(temp.as_file())?;

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Load, modify and save a document, returning the closure's result
pub fn update<T, R, F>(path: &Path, f: F) -> Result<R>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce(&mut T) -> Result<R>,
{
    let mut document = load::<T>(path)?;
    let result = f(&mut document)?;
    save(path, &document)?;
    Ok(result)
}

/// Remove a document if present
pub fn remove(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
