use wardrobe_providers::AnalysisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error(transparent)]
	Analysis(#[from] AnalysisError),
}
impl From<wardrobe_providers::Error> for Error {
	fn from(err: wardrobe_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
