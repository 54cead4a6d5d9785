//! Source files handed to the analysis engine.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::charset::Charset;

/// Errors raised when the engine reads an input file.
#[derive(Debug, Error)]
pub enum InputFileError {
    /// The file could not be opened or read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
    /// The file bytes are not valid for the declared charset
    #[error("{path} is not valid {charset}")]
    Decode {
        /// Path of the file
        path: PathBuf,
        /// Charset the file was declared with
        charset: Charset,
    },
}

/// One source file of an analysis request.
///
/// `T` is the caller's correlation object. The engine never looks at it;
/// it is carried through so issues can be matched back to the caller's
/// own view of the file.
///
/// Contents are never cached: every [`contents`](Self::contents) or
/// [`open`](Self::open) call goes back to disk.
#[derive(Clone, Debug)]
pub struct ClientInputFile<T> {
    path: PathBuf,
    is_test: bool,
    charset: Charset,
    client_object: T,
}

impl<T> ClientInputFile<T> {
    /// Create a new input file.
    pub fn new(
        path: impl Into<PathBuf>,
        is_test: bool,
        charset: Charset,
        client_object: T,
    ) -> Self {
        Self {
            path: path.into(),
            is_test,
            charset,
            client_object,
        }
    }

    /// Create an input file whose path is resolved against `base_dir` when
    /// it is relative.
    pub fn resolve(
        base_dir: &Path,
        path: impl AsRef<Path>,
        is_test: bool,
        charset: Charset,
        client_object: T,
    ) -> Self {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        };
        Self::new(path, is_test, charset, client_object)
    }

    /// The path as a string.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD, so the result
    /// may not name the file on disk. Use [`as_path`](Self::as_path) to open it.
    pub fn path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// The path.
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Whether this is a test source.
    pub fn is_test(&self) -> bool {
        self.is_test
    }

    /// The declared charset.
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// The caller's correlation object.
    pub fn client_object(&self) -> &T {
        &self.client_object
    }

    /// Read the whole file and decode it with the declared charset.
    pub fn contents(&self) -> Result<String, InputFileError> {
        let bytes = std::fs::read(&self.path).map_err(|source| self.io_error(source))?;
        self.charset
            .decode(&bytes)
            .ok_or_else(|| InputFileError::Decode {
                path: self.path.clone(),
                charset: self.charset,
            })
    }

    /// Open a fresh byte stream over the file.
    ///
    /// The handle is closed when the returned reader is dropped.
    pub fn open(&self) -> Result<BufReader<File>, InputFileError> {
        let file = File::open(&self.path).map_err(|source| self.io_error(source))?;
        Ok(BufReader::new(file))
    }

    fn io_error(&self, source: io::Error) -> InputFileError {
        InputFileError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
