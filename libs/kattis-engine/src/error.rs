use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop discovery as a whole
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Cannot read test directory {}: {source}", .path.display())]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single case could not be executed
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Cannot open input file {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot start '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Operating system refused to start '{program}': {source}")]
    ResourceExhausted {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed while waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecutionError {
    /// Sort a spawn failure into "this program is broken" and "the machine is out of processes"
    pub fn from_spawn(program: &str, source: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let exhausted = matches!(source.kind(), ErrorKind::OutOfMemory | ErrorKind::WouldBlock)
            || matches!(source.raw_os_error(), Some(code) if is_exhaustion_errno(code));

        if exhausted {
            ExecutionError::ResourceExhausted {
                program: program.to_string(),
                source,
            }
        } else {
            ExecutionError::Launch {
                program: program.to_string(),
                source,
            }
        }
    }
}

// EAGAIN, ENOMEM, ENFILE, EMFILE
#[cfg(unix)]
fn is_exhaustion_errno(code: i32) -> bool {
    matches!(code, 11 | 12 | 23 | 24)
}

#[cfg(not(unix))]
fn is_exhaustion_errno(_code: i32) -> bool {
    false
}

/// A diagnostic artifact could not be written
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot re-read input file {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create results directory {}: {source}", .path.display())]
    ResultsDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write diagnostic {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free diagnostic file name for {input} after {attempts} attempts")]
    NameExhausted { input: String, attempts: u32 },
}
