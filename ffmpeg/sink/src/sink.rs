/*!
    Packet sink implementation.
*/

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use ffmpeg_types::{Packet, Result};

/**
    Append-only packet sink.

    Writes the bytes of each packet to the underlying writer with no framing
    of its own. Order is preserved: it is the encoder's decode order.
*/
pub struct Sink<W: Write = BufWriter<File>> {
    writer: W,
    path: Option<PathBuf>,
    packets_written: u64,
    bytes_written: u64,
}

impl Sink {
    /**
        Create a sink that writes to a file, truncating any existing file.
    */
    pub fn file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        debug!(path = %path.display(), "opened output file");

        Ok(Self {
            writer: BufWriter::new(file),
            path: Some(path.to_path_buf()),
            packets_written: 0,
            bytes_written: 0,
        })
    }
}

impl<W: Write> Sink<W> {
    /**
        Create a sink over any writer.
    */
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            path: None,
            packets_written: 0,
            bytes_written: 0,
        }
    }

    /**
        Path of the output file, if this sink writes to one.
    */
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /**
        Append a packet's bytes.
    */
    pub fn write(&mut self, packet: &Packet) -> Result<()> {
        self.writer.write_all(&packet.data)?;
        self.packets_written += 1;
        self.bytes_written += packet.len() as u64;
        trace!(
            size = packet.len(),
            total = self.bytes_written,
            "wrote packet"
        );
        Ok(())
    }

    /**
        Flush buffered bytes and return the underlying writer.

        Dropping the sink without calling this may lose the tail of the
        output, and any flush error goes unreported.
    */
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        debug!(
            packets = self.packets_written,
            bytes = self.bytes_written,
            "closed output"
        );
        Ok(self.writer)
    }
}

impl<W: Write> std::fmt::Debug for Sink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("path", &self.path)
            .field("packets_written", &self.packets_written)
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use ffmpeg_types::{Error, Pts, Rational};

    use super::*;

    fn packet(data: &[u8], pts: i64) -> Packet {
        Packet {
            data: data.to_vec(),
            pts: Some(Pts(pts)),
            dts: Some(Pts(pts)),
            time_base: Rational::new(1, 25),
            is_keyframe: pts == 0,
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "disk gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn appends_in_receive_order() {
        let mut sink = Sink::new(Vec::new());
        sink.write(&packet(&[0, 0, 0, 1, 0x67], 0)).unwrap();
        sink.write(&packet(&[], 1)).unwrap();
        sink.write(&packet(&[0, 0, 0, 1, 0x41], 2)).unwrap();

        assert_eq!(sink.packets_written(), 3);
        assert_eq!(sink.bytes_written(), 10);
        let bytes = sink.finish().unwrap();
        assert_eq!(bytes, [0, 0, 0, 1, 0x67, 0, 0, 0, 1, 0x41]);
    }

    #[test]
    fn write_failure_is_sink_error() {
        let mut sink = Sink::new(BrokenWriter);
        let err = sink.write(&packet(&[1, 2, 3], 0)).unwrap_err();
        assert!(matches!(err, Error::Sink(_)), "{err}");
        assert_eq!(sink.packets_written(), 0);
    }

    #[test]
    fn file_sink_truncates_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.h264");
        std::fs::write(&path, b"stale contents that must disappear").unwrap();

        let mut sink = Sink::file(&path).unwrap();
        assert_eq!(sink.path(), Some(path.as_path()));
        sink.write(&packet(b"abc", 0)).unwrap();
        sink.finish().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }

    #[test]
    fn missing_directory_is_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Sink::file(dir.path().join("missing").join("out.h264")).unwrap_err();
        assert!(matches!(err, Error::Sink(_)), "{err}");
    }
}
