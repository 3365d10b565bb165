use std::fs;
use std::io;
use std::path::Path;

use log::debug;

/// Makes sure that the given directory exists and is empty.
pub fn clear_directory(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();

    if path.exists() {
        for entry in fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_dir() {
                fs::remove_dir_all(&entry_path)?;
            } else {
                fs::remove_file(&entry_path)?;
            }
        }
    } else {
        fs::create_dir_all(path)?;
    }

    debug!("Cleared output directory {}", path.display());
    Ok(())
}
