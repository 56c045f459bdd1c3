pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error(transparent)]
	TimeFormat(#[from] time::error::Format),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("Upstream returned {status}: {message}")]
	Api { status: u16, message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
