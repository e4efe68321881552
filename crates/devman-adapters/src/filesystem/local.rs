//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use devman_core::{
    application::{
        ApplicationError,
        ports::{Filesystem, PathKind},
    },
    error::{DevmanError, DevmanResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn probe(&self, path: &Path) -> DevmanResult<PathKind> {
        match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(PathKind::Directory),
            Ok(meta) if meta.is_file() => Ok(PathKind::File),
            // A symlink is judged by its target, a dangling one is "other".
            Ok(meta) if meta.file_type().is_symlink() => match std::fs::metadata(path) {
                Ok(target) if target.is_dir() => Ok(PathKind::Directory),
                Ok(target) if target.is_file() => Ok(PathKind::File),
                _ => Ok(PathKind::Other),
            },
            Ok(_) => Ok(PathKind::Other),
            // A file where a parent directory should be leaves nothing at `path`.
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                Ok(PathKind::Missing)
            }
            Err(e) => Err(map_io_error(path, e, "inspect")),
        }
    }

    fn read(&self, path: &Path) -> DevmanResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn create_dir_all(&self, path: &Path) -> DevmanResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> DevmanResult<()> {
        std::fs::write(path, contents).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn remove_file(&self, path: &Path) -> DevmanResult<()> {
        std::fs::remove_file(path).map_err(|e| map_io_error(path, e, "remove file"))
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> DevmanError {
    ApplicationError::Filesystem {
        path: path.to_path_buf(),
        reason: format!("Failed to {operation}: {e}"),
    }
    .into()
}
