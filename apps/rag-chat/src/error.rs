pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Connection error: {0}")]
	Connection(#[from] reqwest::Error),
	#[error("Backend error ({status}): {message}")]
	Backend { status: u16, message: String },
	#[error("Invalid response format: {message}")]
	InvalidResponse { message: String },
}
