//! Paced, cancellable reveal of a finished reply.
//!
//! A [`Reveal`] hands out one character at a time, sleeping between
//! characters. [`play`] drives it into a [`RevealSink`] until it runs dry or
//! the cancellation token fires; either way the sink ends up showing the
//! complete text.

use super::render::{Span, SpanStyle};
use std::io;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cursor marker shown after the revealed prefix.
pub const CURSOR_MARKER: &str = "▌";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub ch: char,
    pub style: SpanStyle,
}

/// Time-sliced producer of reply chunks.
#[derive(Debug, Clone)]
pub struct Reveal {
    chunks: Vec<Chunk>,
    pos: usize,
    delay: Duration,
}

impl Reveal {
    pub fn new(spans: &[Span], delay: Duration) -> Self {
        let chunks = spans
            .iter()
            .flat_map(|span| {
                span.text.chars().map(move |ch| Chunk {
                    ch,
                    style: span.style,
                })
            })
            .collect();
        Self {
            chunks,
            pos: 0,
            delay,
        }
    }

    /// Reveal unstyled text.
    pub fn plain(text: &str, delay: Duration) -> Self {
        Self::new(
            &[Span {
                text: text.to_string(),
                style: SpanStyle::Plain,
            }],
            delay,
        )
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.chunks.len()
    }

    /// Next chunk, after the pacing delay. The first chunk comes immediately.
    pub async fn next_chunk(&mut self) -> Option<Chunk> {
        let chunk = *self.chunks.get(self.pos)?;
        if self.pos > 0 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.pos += 1;
        Some(chunk)
    }

    /// Everything not yet handed out, without waiting.
    pub fn drain(&mut self) -> &[Chunk] {
        let rest = &self.chunks[self.pos.min(self.chunks.len())..];
        self.pos = self.chunks.len();
        rest
    }
}

/// Display side of a reveal.
pub trait RevealSink {
    /// Called once before the first chunk.
    fn start(&mut self) -> io::Result<()>;
    /// Show one more chunk; the cursor marker follows the revealed text.
    fn chunk(&mut self, chunk: Chunk) -> io::Result<()>;
    /// Show `rest` (empty unless the reveal was skipped) and remove the marker.
    fn finish(&mut self, rest: &[Chunk]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    Skipped,
}

enum Step {
    Chunk(Chunk),
    Done,
    Cancelled,
}

/// Drive `reveal` into `sink`, honouring `cancel`.
pub async fn play<S: RevealSink + ?Sized>(
    mut reveal: Reveal,
    sink: &mut S,
    cancel: &CancellationToken,
) -> io::Result<RevealOutcome> {
    sink.start()?;

    let outcome = loop {
        let step = tokio::select! {
            biased;
            () = cancel.cancelled() => Step::Cancelled,
            next = reveal.next_chunk() => match next {
                Some(chunk) => Step::Chunk(chunk),
                None => Step::Done,
            },
        };

        match step {
            Step::Chunk(chunk) => sink.chunk(chunk)?,
            Step::Done => break RevealOutcome::Completed,
            Step::Cancelled => break RevealOutcome::Skipped,
        }
    };

    sink.finish(reveal.drain())?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[derive(Default)]
    struct Recording {
        started: bool,
        chunks: Vec<char>,
        rest: Vec<char>,
        finished: bool,
    }

    impl Recording {
        fn shown(&self) -> String {
            self.chunks.iter().chain(self.rest.iter()).collect()
        }
    }

    impl RevealSink for Recording {
        fn start(&mut self) -> io::Result<()> {
            self.started = true;
            Ok(())
        }

        fn chunk(&mut self, chunk: Chunk) -> io::Result<()> {
            self.chunks.push(chunk.ch);
            Ok(())
        }

        fn finish(&mut self, rest: &[Chunk]) -> io::Result<()> {
            self.rest = rest.iter().map(|c| c.ch).collect();
            self.finished = true;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn yields_one_chunk_per_character_with_pauses() {
        let mut reveal = Reveal::plain("héllo", Duration::from_millis(10));
        assert_eq!(reveal.len(), 5);

        let start = Instant::now();
        let mut seen = String::new();
        while let Some(chunk) = reveal.next_chunk().await {
            seen.push(chunk.ch);
        }
        assert_eq!(seen, "héllo");
        // no pause before the first character
        assert_eq!(start.elapsed(), Duration::from_millis(40));
        assert!(reveal.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn play_completes_with_full_text() {
        let mut sink = Recording::default();
        let cancel = CancellationToken::new();
        let outcome = play(
            Reveal::plain("abc", Duration::from_millis(10)),
            &mut sink,
            &cancel,
        )
        .await
        .unwrap();

        assert_eq!(outcome, RevealOutcome::Completed);
        assert!(sink.started && sink.finished);
        assert_eq!(sink.chunks, vec!['a', 'b', 'c']);
        assert!(sink.rest.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_reveal_finishes_with_full_text() {
        let mut sink = Recording::default();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(25)).await;
            trigger.cancel();
        });

        let outcome = play(
            Reveal::plain("abcdefghij", Duration::from_millis(10)),
            &mut sink,
            &cancel,
        )
        .await
        .unwrap();

        assert_eq!(outcome, RevealOutcome::Skipped);
        assert!(sink.chunks.len() < 10);
        assert!(!sink.rest.is_empty());
        assert_eq!(sink.shown(), "abcdefghij");
    }

    #[tokio::test]
    async fn pre_cancelled_reveal_shows_everything_at_once() {
        let mut sink = Recording::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = play(
            Reveal::plain("xyz", Duration::from_secs(60)),
            &mut sink,
            &cancel,
        )
        .await
        .unwrap();

        assert_eq!(outcome, RevealOutcome::Skipped);
        assert!(sink.chunks.is_empty());
        assert_eq!(sink.shown(), "xyz");
    }

    #[tokio::test]
    async fn empty_reply_completes_immediately() {
        let mut sink = Recording::default();
        let outcome = play(
            Reveal::plain("", Duration::from_millis(10)),
            &mut sink,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, RevealOutcome::Completed);
        assert!(sink.finished);
        assert_eq!(sink.shown(), "");
    }

    #[test]
    fn styles_follow_spans() {
        let spans = [
            Span {
                text: "ab".into(),
                style: SpanStyle::Strong,
            },
            Span {
                text: "c".into(),
                style: SpanStyle::Plain,
            },
        ];
        let mut reveal = Reveal::new(&spans, Duration::ZERO);
        let rest = reveal.drain();
        assert_eq!(rest[1].style, SpanStyle::Strong);
        assert_eq!(rest[2].style, SpanStyle::Plain);
        assert!(reveal.is_done());
    }
}
