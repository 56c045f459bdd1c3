use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  /clear             Clear the chat history.
  /stats             Show message counts.
  /export [path]     Write the conversation as JSON.
  /stream [on|off]   Toggle or set streaming responses.
  /ping              Test the backend connection.
  /backend <url>     Switch to another backend.
  /help              Show this help.
  /quit              Leave the chat.
Anything else is sent as a question.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	Send(String),
	Clear,
	Stats,
	Export(Option<PathBuf>),
	Stream(Option<bool>),
	Ping,
	Backend(String),
	Help,
	Quit,
	Empty,
	Usage(&'static str),
	Unknown(String),
}

pub fn parse(line: &str) -> Command {
	let line = line.trim();

	if line.is_empty() {
		return Command::Empty;
	}

	let Some(rest) = line.strip_prefix('/') else {
		return Command::Send(line.to_string());
	};
	let (name, arg) = match rest.split_once(char::is_whitespace) {
		Some((name, arg)) => (name, Some(arg.trim()).filter(|arg| !arg.is_empty())),
		None => (rest, None),
	};

	match name {
		"clear" => Command::Clear,
		"stats" => Command::Stats,
		"export" => Command::Export(arg.map(PathBuf::from)),
		"stream" => match arg {
			None => Command::Stream(None),
			Some("on" | "true") => Command::Stream(Some(true)),
			Some("off" | "false") => Command::Stream(Some(false)),
			Some(_) => Command::Usage("/stream [on|off]"),
		},
		"ping" => Command::Ping,
		"backend" => match arg {
			Some(url) => Command::Backend(url.to_string()),
			None => Command::Usage("/backend <url>"),
		},
		"help" | "?" => Command::Help,
		"quit" | "exit" => Command::Quit,
		other => Command::Unknown(other.to_string()),
	}
}
