use std::collections::TryReserveError;

use thiserror::Error;

use crate::list::PayloadKind;

#[derive(Debug, Error)]
pub enum TreePackError {
    #[error("Invalid dimensions {width}x{height}: width and height must be positive")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Entry {index} holds a {kind} payload; only images can be sorted for packing")]
    UnsortablePayload { index: usize, kind: PayloadKind },
    #[error("Canvas cannot grow past {size}x{size} (max size {max_size}) and the batch still does not fit")]
    SizingFailure { size: u32, max_size: u32 },
    #[error("Out of memory while growing the packing tree: {0}")]
    ResourceExhaustion(#[from] TryReserveError),
    #[error("Encoding error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, TreePackError>;
