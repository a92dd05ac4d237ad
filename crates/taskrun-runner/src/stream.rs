//! Line-oriented reading of child pipes

use std::io::{self, BufRead, BufReader, Read};
use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Feed every line of `reader` to `visit` until EOF or `visit` breaks.
///
/// Lines are split on `\n` with a trailing `\r` removed. A line that is not
/// valid UTF-8 is reported as an `InvalidData` error and reading continues
/// with the next line. Any other I/O error is reported once, after which the
/// rest of the stream is discarded so the writer never blocks on a full pipe.
pub(crate) fn for_each_line<R, F>(reader: R, mut visit: F)
where
    R: Read,
    F: FnMut(io::Result<String>) -> ControlFlow<()>,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return,
            Ok(_) => {
                trim_line_ending(&mut buf);
                let line = String::from_utf8(std::mem::take(&mut buf))
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.utf8_error()));
                if visit(line).is_break() {
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                if visit(Err(e)).is_continue() {
                    let _ = io::copy(&mut reader, &mut io::sink());
                }
                return;
            }
        }
    }
}

fn trim_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

/// Lines of a pipe read on a background thread.
///
/// The reader keeps the pipe drained while the caller is busy with another
/// stream; lines queue up in an unbounded channel until [`BackgroundLines::iter`]
/// consumes them.
pub(crate) struct BackgroundLines {
    rx: Receiver<io::Result<String>>,
    handle: JoinHandle<()>,
}

impl BackgroundLines {
    pub(crate) fn spawn<R>(reader: R, name: &str) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for_each_line(reader, |line| match tx.send(line) {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(_) => ControlFlow::Break(()),
                });
            })?;

        Ok(Self { rx, handle })
    }

    /// Blocking iterator ending when the reader thread reaches EOF.
    pub(crate) fn iter(&self) -> mpsc::Iter<'_, io::Result<String>> {
        self.rx.iter()
    }

    /// Wait for the reader thread. Only call once `iter` is exhausted.
    pub(crate) fn join(self) {
        drop(self.rx);
        let _ = self.handle.join();
    }
}
