use std::time::Duration;

use futures_util::stream::BoxStream;
use tokio_stream::StreamExt;

/// Word chunks of a finished answer, paced for display.
pub type AnswerStream = BoxStream<'static, String>;

/// Each whitespace-separated word followed by a single space.
pub fn word_chunks(answer: &str) -> Vec<String> {
	answer.split_whitespace().map(|word| format!("{word} ")).collect()
}

/// Replays `answer` word by word. The first chunk is immediate, later ones wait `delay`.
pub fn answer_stream(answer: &str, delay: Duration) -> AnswerStream {
	let chunks = tokio_stream::iter(word_chunks(answer));

	if delay.is_zero() { Box::pin(chunks) } else { Box::pin(chunks.throttle(delay)) }
}
