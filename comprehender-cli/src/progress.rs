//! Log output that shares the terminal with the progress spinner.

use indicatif::ProgressBar;
use std::io;
use tracing_subscriber::fmt::MakeWriter;

/// Wraps a log writer so every write happens with `bar` cleared from the
/// terminal and redrawn afterwards.
pub struct SuspendingWriter<M> {
    bar: ProgressBar,
    make: M,
}

impl<M> SuspendingWriter<M> {
    pub fn new(bar: ProgressBar, make: M) -> Self {
        Self { bar, make }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for SuspendingWriter<M> {
    type Writer = Suspended<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        Suspended {
            bar: self.bar.clone(),
            inner: self.make.make_writer(),
        }
    }
}

pub struct Suspended<W> {
    bar: ProgressBar,
    inner: W,
}

impl<W: io::Write> io::Write for Suspended<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        let inner = &mut self.inner;
        self.bar.suspend(|| inner.flush())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::{layer::SubscriberExt, Registry};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_lines_pass_through_while_spinner_runs() {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        bar.set_message("Annotating sources...");
        bar.tick();

        let captured = Captured::default();
        let sink = captured.clone();
        let writer = SuspendingWriter::new(bar.clone(), move || sink.clone());

        let subscriber = Registry::default().with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        );
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Processed 2/4 files");
            tracing::info!("Processed 4/4 files");
        });
        bar.finish_and_clear();

        let text = captured.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Processed 2/4 files"));
        assert!(lines[1].ends_with("Processed 4/4 files"));
    }

    #[test]
    fn test_flush_reaches_inner_writer() {
        let captured = Captured::default();
        let sink = captured.clone();
        let writer = SuspendingWriter::new(ProgressBar::hidden(), move || sink.clone());

        let mut out = writer.make_writer();
        out.write_all(b"done\n").unwrap();
        out.flush().unwrap();

        assert_eq!(captured.text(), "done\n");
    }
}
