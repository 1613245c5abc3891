pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Outcome of a structured analysis call. Either the value decoded completely or the caller
/// gets one of these.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
	#[error("Generation endpoint returned status {status}: {body}")]
	TransportFailure { status: u16, body: String },
	#[error("Model output is not a usable payload: {message}")]
	MalformedPayload { message: String },
	#[error("Model output decoded to an empty result.")]
	EmptyResult,
	#[error("Analysis failed after {attempts} attempts: {last}")]
	ExhaustedRetries { attempts: u32, last: Box<AnalysisError> },
	#[error("Generation request failed: {message}")]
	Request { message: String },
	#[error("Analysis was cancelled.")]
	Cancelled,
	#[error("Analysis deadline exceeded.")]
	DeadlineExceeded,
	#[error("Invalid generation provider config: {message}")]
	InvalidConfig { message: String },
}
impl AnalysisError {
	/// Whether another attempt could plausibly succeed.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::TransportFailure { status, .. } =>
				matches!(*status, 408 | 429) || (500..600).contains(status),
			Self::Request { .. } | Self::MalformedPayload { .. } | Self::EmptyResult => true,
			Self::ExhaustedRetries { .. }
			| Self::Cancelled
			| Self::DeadlineExceeded
			| Self::InvalidConfig { .. } => false,
		}
	}
}
impl From<Error> for AnalysisError {
	fn from(err: Error) -> Self {
		Self::InvalidConfig { message: err.to_string() }
	}
}
impl From<reqwest::Error> for AnalysisError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_builder() {
			Self::InvalidConfig { message: err.to_string() }
		} else {
			Self::Request { message: err.to_string() }
		}
	}
}
