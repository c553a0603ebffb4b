// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

use crate::host::WaitTerminationReason;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConversionError {
    /// The destination cannot hold the whole conversion. Nothing useful was
    /// written.
    #[error("destination buffer too small for conversion")]
    InsufficientBuffer,
    #[error("unsupported code page {0}")]
    UnsupportedCodePage(u32),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InputBufferError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("read terminated: {0}")]
    ReadTerminated(WaitTerminationReason),
}
