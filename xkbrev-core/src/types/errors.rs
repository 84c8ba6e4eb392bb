use thiserror::Error;

#[derive(Error, Debug)]
pub enum XkbError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("Parse error in {file} at line {line}: {message}")]
    Parse { file: String, line: usize, message: String },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

impl XkbError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        XkbError::NotFound { kind, name: name.into() }
    }

    pub fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        XkbError::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Process exit status used by the command-line tool
    pub fn exit_code(&self) -> i32 {
        match self {
            XkbError::Input(_) => 2,
            XkbError::NotFound { .. } => 3,
            XkbError::Parse { .. } => 4,
            XkbError::UnsupportedFormat(_) => 5,
            XkbError::Io(_) => 6,
        }
    }
}

pub type Result<T> = std::result::Result<T, XkbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = XkbError::not_found("symbols", "us(qwfp)");
        assert_eq!(err.to_string(), "symbols not found: us(qwfp)");

        let err = XkbError::parse("symbols/us", 12, "Expected ';'");
        assert_eq!(err.to_string(), "Parse error in symbols/us at line 12: Expected ';'");

        // The cause is reported through `source`, not repeated in the message
        let err = XkbError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.to_string(), "IO error");
        assert_eq!(std::error::Error::source(&err).map(|e| e.to_string()), Some("gone".to_string()));
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            XkbError::Input("x".into()),
            XkbError::not_found("layout", "xx"),
            XkbError::parse("f", 1, "m"),
            XkbError::UnsupportedFormat("csv".into()),
            XkbError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
