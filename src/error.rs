use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FsError>;

/// Failure kinds of the engine. The classic small-integer codes live at the
/// boundary (`api` module), mapped per operation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FsError {
    #[error("file not found")]
    NotFound,
    #[error("file already exists")]
    AlreadyExists,
    #[error("no free inodes")]
    OutOfInodes,
    #[error("out of space")]
    OutOfSpace,
    #[error("invalid file name")]
    InvalidName,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("no filesystem is mounted")]
    NotMounted,
    #[error("not a valid filesystem image: {0}")]
    InvalidImage(&'static str),
    #[error("block index out of range")]
    InvalidBlockId,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("metadata codec error: {0}")]
    Codec(#[from] bincode::Error),
}
