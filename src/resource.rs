//! Outcome type handed to presentation code

/// Either the requested data or a user-facing error message
///
/// Repositories catch every failure at their boundary, log it and turn it
/// into one of these, so callers never deal with transport or storage errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    Success(T),
    Error(String),
}

impl<T> Resource<T> {
    /// Creates an Error outcome
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Resource::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Resource::Success(data) => Some(data),
            Resource::Error(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Resource::Success(data) => Some(data),
            Resource::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Resource::Success(_) => None,
            Resource::Error(message) => Some(message),
        }
    }

    pub fn map<U, F>(self, f: F) -> Resource<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Resource::Success(data) => Resource::Success(f(data)),
            Resource::Error(message) => Resource::Error(message),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Resource::Success(data) => Ok(data),
            Resource::Error(message) => Err(message),
        }
    }
}

impl<T> From<Result<T, String>> for Resource<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(data) => Resource::Success(data),
            Err(message) => Resource::Error(message),
        }
    }
}
