pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Knowledge base retrieval failed: {message}")]
	Retrieval { message: String },
	#[error("Answer generation failed: {message}")]
	Generation { message: String },
}
