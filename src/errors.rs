use std::io;

#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    #[error("could not open stream {name}: {source}")]
    ResourceOpen { name: String, source: io::Error },

    #[error("golden mismatch on {port} at tick {tick}: expected {expected} got {actual}")]
    GoldenMismatch {
        port: String,
        tick: u64,
        expected: u64,
        actual: u64,
    },

    #[error("host I/O error")]
    IoError(#[from] io::Error),
}

impl HarnessError {
    /// Process exit status the drivers report for this error.
    pub fn exit_code(self: &Self) -> i32 {
        1
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
