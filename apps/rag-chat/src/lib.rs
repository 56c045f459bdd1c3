pub mod client;
pub mod command;
pub mod session;

mod error;

pub use error::{Error, Result};

use std::{
	io::{self, Write},
	path::PathBuf,
	time::Duration,
};

use clap::Parser;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::{
	client::BackendClient,
	command::{Command, HELP},
	session::ChatSession,
};

#[derive(Debug, Parser)]
#[command(
	version = rag_cli::VERSION,
	rename_all = "kebab",
	styles = rag_cli::styles(),
)]
pub struct Args {
	/// Base URL of the RAG backend.
	#[arg(long, env = "BACKEND_URL", default_value = "http://localhost:8000")]
	pub backend_url: String,
	/// Wait for whole answers instead of streaming them word by word.
	#[arg(long)]
	pub no_stream: bool,
	#[arg(long, value_name = "SECONDS", default_value_t = 120)]
	pub timeout_secs: u64,
	#[arg(long, default_value = "warn")]
	pub log_level: String,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	init_tracing(&args.log_level);

	let mut client = BackendClient::new(&args.backend_url, Duration::from_secs(args.timeout_secs))?;
	let mut session = ChatSession::new(!args.no_stream);
	let mut lines = BufReader::new(tokio::io::stdin()).lines();

	println!("RAG Chat Assistant");
	println!("Ask questions and get answers from your knowledge base. Type /help for commands.");
	println!("Backend: {} (streaming {})", client.base_url(), on_off(session.streaming));

	loop {
		print!("\nyou> ");
		io::stdout().flush()?;

		let Some(line) = lines.next_line().await? else {
			println!();

			break;
		};

		match command::parse(&line) {
			Command::Send(text) => ask(&client, &mut session, text).await?,
			Command::Clear => {
				session.clear();
				println!("Chat history cleared.");
			},
			Command::Stats => {
				let stats = session.stats();

				println!("Total messages: {}", stats.total);
				println!("User messages: {}", stats.user);
				println!("Assistant messages: {}", stats.assistant);
			},
			Command::Export(path) => println!("{}", export(&session, path).await),
			Command::Stream(value) => {
				session.streaming = value.unwrap_or(!session.streaming);
				println!("Streaming {}.", on_off(session.streaming));
			},
			Command::Ping => ping(&client).await,
			Command::Backend(url) => {
				client.set_base_url(&url);
				println!("Current backend: {}", client.base_url());
			},
			Command::Help => println!("{HELP}"),
			Command::Quit => break,
			Command::Empty => {},
			Command::Usage(usage) => println!("Usage: {usage}"),
			Command::Unknown(name) => println!("Unknown command /{name}. Type /help for commands."),
		}
	}

	Ok(())
}

async fn ask(client: &BackendClient, session: &mut ChatSession, text: String) -> io::Result<()> {
	session.push_user(text);

	print!("assistant> ");
	io::stdout().flush()?;

	let result = if session.streaming {
		client
			.stream(session.messages(), |chunk| {
				print!("{chunk}");

				let _ = io::stdout().flush();
			})
			.await
	} else {
		client.query(session.messages()).await.inspect(|answer| print!("{answer}"))
	};

	println!();

	match result {
		Ok(answer) => session.push_assistant(answer),
		Err(err) => {
			tracing::warn!(error = %err, "Backend request failed.");
			session.discard_unanswered();
			println!("{err}");
		},
	}

	Ok(())
}

/// Writes the transcript and returns the line to show. A failed write leaves the session intact.
async fn export(session: &ChatSession, path: Option<PathBuf>) -> String {
	if session.messages().is_empty() {
		return "Nothing to export yet.".to_string();
	}

	match write_export(session, path).await {
		Ok(path) => format!("Conversation exported to {}.", path.display()),
		Err(err) => {
			tracing::warn!(error = %err, "Export failed.");

			format!("Export failed: {err}")
		},
	}
}

async fn write_export(session: &ChatSession, path: Option<PathBuf>) -> color_eyre::Result<PathBuf> {
	let now = OffsetDateTime::now_utc();
	let path = match path {
		Some(path) => path,
		None => session::export_file_name(now)?.into(),
	};
	let payload = serde_json::to_string_pretty(&session.export(now)?)?;

	tokio::fs::write(&path, payload).await?;

	Ok(path)
}

async fn ping(client: &BackendClient) {
	match client.ping().await {
		Ok(status) if status.is_success() => println!("Backend is reachable!"),
		Ok(status) => println!("Backend returned status: {status}"),
		Err(err) => println!("Cannot reach backend: {err}"),
	}
}

fn on_off(enabled: bool) -> &'static str {
	if enabled { "on" } else { "off" }
}

// Logs go to stderr so they never interleave with streamed answers on stdout.
fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}
