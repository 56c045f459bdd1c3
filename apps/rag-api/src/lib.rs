pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = rag_cli::VERSION,
	rename_all = "kebab",
	styles = rag_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = rag_config::load(&args.config)?;

	init_tracing(&config);

	let http_addr = bind_addr(&config.service)?;

	tracing::info!(
		region = %config.aws.region,
		knowledge_base_id = %config.knowledge_base.knowledge_base_id,
		model_id = %config.llm.model_id,
		"Configuration loaded."
	);

	let state = AppState::new(config);
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(listener, app).await?;

	Ok(())
}

fn bind_addr(service: &rag_config::Service) -> color_eyre::Result<SocketAddr> {
	let addr: SocketAddr = service.http_bind.parse()?;

	if service.bind_localhost_only && !addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"http_bind must be a loopback address when bind_localhost_only is true."
		));
	}

	Ok(addr)
}

fn init_tracing(config: &rag_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
	use super::*;

	fn service(http_bind: &str, bind_localhost_only: bool) -> rag_config::Service {
		rag_config::Service {
			http_bind: http_bind.to_string(),
			log_level: "info".to_string(),
			bind_localhost_only,
		}
	}

	#[test]
	fn localhost_only_rejects_public_bind() {
		let err = bind_addr(&service("0.0.0.0:8000", true)).expect_err("expected error");

		assert!(err.to_string().contains("loopback"), "unexpected error: {err}");
	}

	#[test]
	fn public_bind_is_allowed_when_not_restricted() {
		let addr = bind_addr(&service("0.0.0.0:8000", false)).expect("bind address");

		assert_eq!(addr.port(), 8_000);
	}

	#[test]
	fn malformed_bind_is_an_error() {
		assert!(bind_addr(&service("localhost", false)).is_err());
	}
}
