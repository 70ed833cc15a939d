use std::{alloc::LayoutError, fmt, io};

use thiserror::Error;

/// Failure of the heap-growth primitive.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("sbrk refused to extend the program break by {size} bytes: {source}")]
  Os {
    size: usize,
    #[source]
    source: io::Error,
  },
  #[error("heap source already handed out its limit of {limit} chunks")]
  Exhausted { limit: usize },
  #[error("invalid chunk layout: {0}")]
  Layout(#[from] LayoutError),
  #[error("system allocator returned null for a {size}-byte chunk")]
  Null { size: usize },
  #[error("heap source returned {addr:#x}, which is not aligned to {align}")]
  Misaligned { addr: usize, align: usize },
}

/// Failure of an allocator operation.
#[derive(Debug, Error)]
pub enum AllocError {
  #[error("request for {requested} bytes exceeds the {max}-byte maximum payload")]
  TooLarge { requested: usize, max: usize },
  #[error("out of memory")]
  OutOfMemory(#[from] SourceError),
  #[error("double free detected for block at {addr:#x}")]
  DoubleFree { addr: usize },
}

impl AllocError {
  pub fn status(&self) -> ErrorStatus {
    match self {
      Self::TooLarge { .. } => ErrorStatus::SingleRequestTooLarge,
      Self::OutOfMemory(_) => ErrorStatus::OutOfMemory,
      Self::DoubleFree { .. } => ErrorStatus::DoubleFreeDetected,
    }
  }
}

/// Outcome of the most recent allocator call, as left in the status channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorStatus {
  #[default]
  NoError,
  SingleRequestTooLarge,
  OutOfMemory,
  DoubleFreeDetected,
}

impl ErrorStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NoError => "No error",
      Self::SingleRequestTooLarge => "Single request too large",
      Self::OutOfMemory => "Out of memory",
      Self::DoubleFreeDetected => "Double free detected",
    }
  }

  #[inline]
  pub fn is_ok(&self) -> bool {
    *self == Self::NoError
  }
}

impl fmt::Display for ErrorStatus {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl<T> From<&Result<T, AllocError>> for ErrorStatus {
  fn from(result: &Result<T, AllocError>) -> Self {
    match result {
      Ok(_) => Self::NoError,
      Err(error) => error.status(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_mapping() {
    let too_large = AllocError::TooLarge {
      requested: 4096,
      max: 2032,
    };
    assert_eq!(too_large.status(), ErrorStatus::SingleRequestTooLarge);
    assert_eq!(
      too_large.to_string(),
      "request for 4096 bytes exceeds the 2032-byte maximum payload"
    );

    let oom = AllocError::from(SourceError::Exhausted { limit: 1 });
    assert_eq!(oom.status(), ErrorStatus::OutOfMemory);
    assert!(std::error::Error::source(&oom).is_some());

    let ok: Result<(), AllocError> = Ok(());
    assert_eq!(ErrorStatus::from(&ok), ErrorStatus::NoError);
    assert!(ErrorStatus::default().is_ok());
    assert_eq!(ErrorStatus::DoubleFreeDetected.to_string(), "Double free detected");
  }
}
