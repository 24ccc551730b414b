//! Character-by-character reveal of a single thinking step

use futures::stream::{self, Stream};
use std::time::Duration;

struct Reveal {
    remaining: std::vec::IntoIter<char>,
    prefix: String,
    started: bool,
}

/// Lazily produce every prefix of `text`, from `""` up to the full text.
///
/// Each prefix is followed by a `char_delay` suspension before the next one
/// is produced (or the stream ends), so `n` characters take `n + 1` ticks.
/// An empty text yields only `""`.
pub fn typewriter(text: &str, char_delay: Duration) -> impl Stream<Item = String> + Send + 'static {
    let reveal = Reveal {
        remaining: text.chars().collect::<Vec<_>>().into_iter(),
        prefix: String::with_capacity(text.len()),
        started: false,
    };

    stream::unfold(reveal, move |mut reveal| async move {
        if !reveal.started {
            reveal.started = true;
            let prefix = reveal.prefix.clone();
            return Some((prefix, reveal));
        }

        tokio::time::sleep(char_delay).await;

        let next = reveal.remaining.next()?;
        reveal.prefix.push(next);
        let prefix = reveal.prefix.clone();
        Some((prefix, reveal))
    })
}
