use thiserror::Error as ThisError;

/// Coarse classification attached to every error at the point of failure.
/// Retry decisions are made on this tag, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind
{   MissingCredential
  , Network
  , Unauthorized
  , Vendor
  , MalformedResponse
  , ValidationFailed
  , InvalidConfiguration
  , Io
}

/// Why a well-formed answer was still rejected
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ValidationFailure
{   #[error("result is empty")]
    Empty
  , #[error("result restates the response schema instead of answering")]
    SchemaEcho
  , #[error("result length {len} exceeds limit {limit}")]
    RunawayLength
    {   len: usize
      , limit: usize
    }
}

/// Custom error type for xlate operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error
{   /// No credential configured for the selected vendor
    #[error("Missing API Key for {0}. Add it in settings before translating.")]
    MissingCredential(crate::Provider)
  , /// Transport failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String)
  , /// Vendor rejected the credential (401/403)
    #[error("{provider} rejected the credential: {body}")]
    Unauthorized
    {   provider: crate::Provider
      , body: String
    }
  , /// Non-2xx answer from the vendor, raw body kept for diagnosis
    #[error("{provider} returned HTTP {status}: {body}")]
    VendorError
    {   provider: crate::Provider
      , status: u16
      , body: String
    }
  , /// No usable text could be located in the reply
    #[error("Malformed response: {detail} (keys present: [{}])", .keys.join(", "))]
    MalformedResponse
    {   detail: String
      , keys: Vec<String>
    }
  , /// Reply parsed but the answer is unacceptable
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationFailure)
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Local file access failed
    #[error("I/O error: {0}")]
    Io(String)
}

impl Error
{   /// Build a malformed-response error that carries no key listing
    pub fn malformed(detail: impl Into<String>) -> Self
    {   Error::MalformedResponse
        {   detail: detail.into()
          , keys: vec![]
        }
    }

    /// The classification tag of this error
    pub fn kind(&self) -> ErrorKind
    {   match self
        {   Error::MissingCredential(_) => ErrorKind::MissingCredential
          , Error::Network(_) => ErrorKind::Network
          , Error::Unauthorized { .. } => ErrorKind::Unauthorized
          , Error::VendorError { .. } => ErrorKind::Vendor
          , Error::MalformedResponse { .. } => ErrorKind::MalformedResponse
          , Error::ValidationFailed(_) => ErrorKind::ValidationFailed
          , Error::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration
          , Error::Io(_) => ErrorKind::Io
        }
    }

    /// Only transport and vendor-side failures are worth another attempt.
    /// A malformed shape or a bad answer is assumed to repeat.
    pub fn is_retryable(&self) -> bool
    {   matches!(self.kind(), ErrorKind::Network | ErrorKind::Vendor)
    }
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   Error::Network(e.without_url().to_string())
    }
}

impl From<std::io::Error> for Error
{   fn from(e: std::io::Error) -> Self
    {   Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error
{   fn from(e: serde_json::Error) -> Self
    {   Error::InvalidConfiguration(e.to_string())
    }
}
