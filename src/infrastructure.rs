pub mod core;

use crate::domain::DataAccessError;

impl From<serde_json::Error> for DataAccessError {
    fn from(value: serde_json::Error) -> Self {
        match value.classify() {
            serde_json::error::Category::Io => Self::ReadError(Box::new(value)),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => Self::FormatError(Box::new(value)),
        }
    }
}
