// Error types for the hookwire HTTP layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::RouteNotFound(_) => 404,
            Error::MethodNotAllowed(_) => 405,
            Error::Io(_) => 500,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::RouteNotFound("/x".into()).status_code(), 404);
        assert_eq!(Error::MethodNotAllowed("DELETE /x".into()).status_code(), 405);
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        assert_eq!(Error::Io(io).status_code(), 500);
    }

    #[test]
    fn test_error_classes() {
        assert!(Error::RouteNotFound("/x".into()).is_client_error());
        assert!(!Error::MethodNotAllowed("DELETE /x".into()).is_server_error());
    }
}
