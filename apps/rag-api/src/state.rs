use std::sync::Arc;

use rag_config::Config;
use rag_service::RagService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RagService>,
}
impl AppState {
	pub fn new(config: Config) -> Self {
		Self::from_service(RagService::new(config))
	}

	pub fn from_service(service: RagService) -> Self {
		Self { service: Arc::new(service) }
	}
}
