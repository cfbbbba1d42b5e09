//! Status stream consumer.
//!
//! Renders progress events as they arrive:
//!
//! ```text
//! Output:
//! <raw log bytes>
//! Doing: <vertex name>
//! ```
//!
//! With colors enabled the labels are styled: `Output:` blue, `Doing:` and
//! `Done!` green.

use std::io::Write;

use crossterm::style::{Color, Stylize};
use noob_core::event::{StatusEvent, StatusReceiver};

/// Label printed before each log chunk.
pub const OUTPUT_LABEL: &str = "Output:";

/// Label printed before each vertex name.
pub const DOING_LABEL: &str = "Doing:";

/// Line printed once the engine reports success.
pub const DONE_LINE: &str = "Done!";

/// Writes status events to an output sink.
pub struct StatusPrinter<W> {
    out: W,
    color: bool,
}

impl<W: Write> StatusPrinter<W> {
    /// Plain-text printer.
    pub fn new(out: W) -> Self {
        Self { out, color: false }
    }

    /// Enable or disable ANSI colors on the labels.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Render a single event.
    pub fn render(&mut self, event: &StatusEvent) -> std::io::Result<()> {
        match event {
            StatusEvent::LogChunk { data, .. } => {
                writeln!(self.out, "{}", self.label(OUTPUT_LABEL, Color::Blue))?;
                writeln!(self.out, "{}", String::from_utf8_lossy(data))?;
            }
            StatusEvent::VertexUpdate { name, .. } => {
                writeln!(self.out, "{} {}", self.label(DOING_LABEL, Color::Green), name)?;
            }
        }
        self.out.flush()
    }

    /// Write the success line.
    pub fn finish(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "{}", self.label(DONE_LINE, Color::Green))?;
        self.out.flush()
    }

    /// Drain `events` until the producer closes the channel.
    ///
    /// Render failures are logged and skipped so the producer never stalls
    /// on a full channel. Returns the printer.
    pub async fn run(mut self, mut events: StatusReceiver) -> Self {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.render(&event) {
                tracing::warn!(error = %e, "Failed to render status event");
            }
        }
        tracing::debug!("Status stream closed");
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn label(&self, text: &'static str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noob_core::event::status_channel;

    fn rendered(events: &[StatusEvent]) -> String {
        let mut printer = StatusPrinter::new(Vec::new());
        for event in events {
            printer.render(event).unwrap();
        }
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[test]
    fn test_render_log_chunk() {
        let out = rendered(&[StatusEvent::log("sha256:1", "hello")]);
        assert_eq!(out, "Output:\nhello\n");
    }

    #[test]
    fn test_render_vertex() {
        let out = rendered(&[StatusEvent::vertex("echo hi")]);
        assert_eq!(out, "Doing: echo hi\n");
    }

    #[test]
    fn test_render_invalid_utf8_is_lossy() {
        let out = rendered(&[StatusEvent::log("v", vec![0x66, 0xff, 0x6f])]);
        assert_eq!(out, "Output:\nf\u{fffd}o\n");
    }

    #[test]
    fn test_finish_writes_done_line() {
        let mut printer = StatusPrinter::new(Vec::new());
        printer.render(&StatusEvent::vertex("echo hi")).unwrap();
        printer.finish().unwrap();
        let out = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(out, "Doing: echo hi\nDone!\n");
    }

    #[test]
    fn test_render_colored_labels() {
        let mut printer = StatusPrinter::new(Vec::new()).with_color(true);
        printer.render(&StatusEvent::log("v", "hello")).unwrap();
        printer.render(&StatusEvent::vertex("echo hi")).unwrap();
        printer.finish().unwrap();
        let out = String::from_utf8(printer.into_inner()).unwrap();

        assert!(out.contains("Output:"));
        assert!(out.contains("\nhello\n"));
        assert!(out.contains(" echo hi\n"));
        assert!(out.contains("Done!"));
        if std::env::var_os("NO_COLOR").is_none() {
            assert!(out.contains('\x1b'));
        }
    }

    #[tokio::test]
    async fn test_run_renders_in_receipt_order() {
        let (tx, rx) = status_channel(1);
        let consumer = tokio::spawn(StatusPrinter::new(Vec::new()).run(rx));

        tx.send(StatusEvent::log("v", "one")).await.unwrap();
        tx.send(StatusEvent::vertex("step")).await.unwrap();
        tx.send(StatusEvent::log("v", "two")).await.unwrap();
        drop(tx);

        let out = String::from_utf8(consumer.await.unwrap().into_inner()).unwrap();
        assert_eq!(out, "Output:\none\nDoing: step\nOutput:\ntwo\n");
    }

    #[tokio::test]
    async fn test_run_exits_on_immediate_close() {
        let (tx, rx) = status_channel(4);
        drop(tx);
        let out = StatusPrinter::new(Vec::new()).run(rx).await.into_inner();
        assert!(out.is_empty());
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_keeps_draining_after_render_error() {
        let (tx, rx) = status_channel(1);
        let consumer = tokio::spawn(StatusPrinter::new(FailingWriter).run(rx));

        for i in 0..5 {
            tx.send(StatusEvent::vertex(format!("step {}", i))).await.unwrap();
        }
        drop(tx);

        assert!(consumer.await.is_ok());
    }
}
