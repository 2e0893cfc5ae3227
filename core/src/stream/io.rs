//! stream/io.rs
//! Normalised byte sources and sinks for the pump.
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::Result;

/// Where compressed or plain bytes come from.
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Where produced bytes go. `Memory` captures them for the returned snapshot.
pub enum OutputSink {
    Writer(Box<dyn Write + Send>),
    File(PathBuf),
    Memory,
}

/// Normalise an input source into a boxed reader.
pub fn open_input(src: InputSource) -> Result<Box<dyn Read + Send>> {
    let reader: Box<dyn Read + Send> = match src {
        InputSource::Reader(r) => r,
        InputSource::File(p) => Box::new(File::open(p)?),
        InputSource::Memory(b) => Box::new(Cursor::new(b)),
    };
    Ok(reader)
}

/// Normalise an output sink into a boxed writer.
///
/// For `OutputSink::Memory` the second element is a handle on the captured bytes.
pub fn open_output(sink: OutputSink) -> Result<(Box<dyn Write + Send>, Option<SharedBuffer>)> {
    match sink {
        OutputSink::Writer(w) => Ok((w, None)),
        OutputSink::File(p) => Ok((Box::new(File::create(p)?), None)),
        OutputSink::Memory => {
            let buf = SharedBuffer::default();
            Ok((Box::new(buf.clone()), Some(buf)))
        }
    }
}

/// Cloneable in-memory sink; every clone appends to the same buffer.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // A writer that panicked mid-append leaves plain bytes behind; keep them.
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Move the captured bytes out, leaving the buffer empty.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.lock())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
