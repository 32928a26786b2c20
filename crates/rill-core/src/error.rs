//! Error taxonomy for a single poll cycle

use std::io;

use crate::row::ConvertError;

/// Error draining one split.
///
/// Every variant carries the id of the split being read when it happened.
/// All of these are fatal for the poll cycle: the split is abandoned, the
/// error propagates to the driving loop, and no retry happens here.
#[derive(Debug)]
pub enum ReadError {
    /// The record-stream adapter could not open the split
    Open { split: String, source: io::Error },
    /// The stream failed mid-iteration
    Record { split: String, source: io::Error },
    /// A raw record did not convert to the target schema
    Convert { split: String, source: ConvertError },
    /// The stream failed to close after draining
    Close { split: String, source: io::Error },
}

impl ReadError {
    /// Id of the split that was being read
    pub fn split_id(&self) -> &str {
        match self {
            Self::Open { split, .. }
            | Self::Record { split, .. }
            | Self::Convert { split, .. }
            | Self::Close { split, .. } => split,
        }
    }
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { split, source } => write!(f, "open split {split}: {source}"),
            Self::Record { split, source } => write!(f, "read split {split}: {source}"),
            Self::Convert { split, source } => write!(f, "convert record in split {split}: {source}"),
            Self::Close { split, source } => write!(f, "close split {split}: {source}"),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. }
            | Self::Record { source, .. }
            | Self::Close { source, .. } => Some(source),
            Self::Convert { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::FieldType;

    #[test]
    fn split_id_on_every_variant() {
        let open = ReadError::Open {
            split: "s1".into(),
            source: io::Error::other("boom"),
        };
        let convert = ReadError::Convert {
            split: "s2".into(),
            source: ConvertError::TypeMismatch {
                field: "id".into(),
                expected: FieldType::Int,
                found: "string".into(),
            },
        };
        assert_eq!(open.split_id(), "s1");
        assert_eq!(convert.split_id(), "s2");
    }

    #[test]
    fn display_names_the_stage() {
        let err = ReadError::Record {
            split: "part-3".into(),
            source: io::Error::other("truncated"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("read split part-3"));
        assert!(msg.contains("truncated"));
    }

    #[test]
    fn source_is_chained() {
        use std::error::Error;
        let err = ReadError::Close {
            split: "s".into(),
            source: io::Error::other("late"),
        };
        assert!(err.source().is_some());
    }
}
