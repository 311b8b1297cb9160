use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;

/// Threshold in bytes above which a captured listing is memory-mapped.
pub const DEFAULT_MMAP_THRESHOLD_BYTES: u64 = 16 * 1024 * 1024; // 16 MiB

pub type LineIter = Box<dyn Iterator<Item = io::Result<String>> + Send + 'static>;

pub fn should_use_mmap(file_size_bytes: u64, threshold_bytes: u64) -> bool {
    file_size_bytes >= threshold_bytes
}

/// Iterate lines from a file path using a buffered reader.
pub fn iter_lines_bufread<P: AsRef<Path>>(path: P) -> Result<LineIter> {
    let file = File::open(&path).with_context(|| format!("open {}", path.as_ref().display()))?;
    Ok(Box::new(ReaderLines::new(BufReader::new(file))))
}

/// Iterate lines from a memory-mapped file.
pub fn iter_lines_mmap<P: AsRef<Path>>(path: P) -> Result<LineIter> {
    let file = File::open(&path).with_context(|| format!("open {}", path.as_ref().display()))?;
    let mmap =
        unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", path.as_ref().display()))?;
    Ok(Box::new(ByteLines::new(mmap)))
}

/// Choose mmap or bufread depending on file size.
pub fn iter_lines_auto<P: AsRef<Path>>(path: P, threshold_bytes: u64) -> Result<LineIter> {
    let meta =
        std::fs::metadata(&path).with_context(|| format!("stat {}", path.as_ref().display()))?;
    if meta.is_file() && should_use_mmap(meta.len(), threshold_bytes) {
        iter_lines_mmap(path)
    } else {
        iter_lines_bufread(path)
    }
}

/// Lines of an owned byte buffer, e.g. the captured stdout of a process.
pub fn iter_lines_bytes(bytes: Vec<u8>) -> LineIter {
    Box::new(ByteLines::new(bytes))
}

/// Splits a byte buffer on `\n`. A trailing newline does not produce an extra
/// empty line.
pub struct ByteLines<B> {
    data: B,
    pos: usize,
}

impl<B: AsRef<[u8]>> ByteLines<B> {
    pub fn new(data: B) -> Self {
        Self { data, pos: 0 }
    }
}

impl<B: AsRef<[u8]>> Iterator for ByteLines<B> {
    type Item = io::Result<String>;
    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data.as_ref();
        if self.pos >= data.len() {
            return None;
        }
        let start = self.pos;
        if let Some(off) = memchr::memchr(b'\n', &data[self.pos..]) {
            let end = self.pos + off;
            self.pos = end + 1;
            Some(Ok(line_from_bytes(&data[start..end])))
        } else {
            self.pos = data.len();
            Some(Ok(line_from_bytes(&data[start..])))
        }
    }
}

/// Splits a buffered reader on `\n` with the same decoding as [`ByteLines`].
pub struct ReaderLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> ReaderLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for ReaderLines<R> {
    type Item = io::Result<String>;
    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let line = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf);
                Some(Ok(line_from_bytes(line)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

fn line_from_bytes(bytes: &[u8]) -> String {
    // CRLF from the Windows tooling
    let slice = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(slice).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn collect(iter: LineIter) -> Vec<String> {
        iter.collect::<io::Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn byte_lines_match_bufread_semantics() {
        let lines = collect(iter_lines_bytes(b"Node:a\r\nx\r\n\r\nNode:b\n\n".to_vec()));
        assert_eq!(lines, ["Node:a", "x", "", "Node:b", ""]);
    }

    #[test]
    fn last_line_without_newline_is_kept() {
        let lines = collect(iter_lines_bytes(b"a\nb".to_vec()));
        assert_eq!(lines, ["a", "b"]);
        assert!(collect(iter_lines_bytes(Vec::new())).is_empty());
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let lines = collect(iter_lines_bytes(vec![b'a', 0xff, b'\n']));
        assert_eq!(lines, ["a\u{fffd}"]);
    }

    #[test]
    fn mmap_and_bufread_agree() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "Node:a\r\ntag\r\n\r\nNode:b\n\n").unwrap();
        f.flush().unwrap();
        let via_mmap = collect(iter_lines_auto(f.path(), 1).unwrap());
        let via_read = collect(iter_lines_auto(f.path(), u64::MAX).unwrap());
        assert_eq!(via_mmap, via_read);
        assert_eq!(via_mmap, ["Node:a", "tag", "", "Node:b", ""]);
    }

    #[test]
    fn mmap_and_bufread_agree_on_invalid_utf8() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"Node:a\ncaf\xe9\n\n").unwrap();
        f.flush().unwrap();
        let via_mmap = collect(iter_lines_auto(f.path(), 1).unwrap());
        let via_read = collect(iter_lines_auto(f.path(), u64::MAX).unwrap());
        assert_eq!(via_mmap, via_read);
        assert_eq!(via_read, ["Node:a", "caf\u{fffd}", ""]);
    }

    #[test]
    fn trailing_carriage_return_without_newline_is_trimmed_on_both_paths() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"Node:a\r\nlast\r").unwrap();
        f.flush().unwrap();
        let via_mmap = collect(iter_lines_auto(f.path(), 1).unwrap());
        let via_read = collect(iter_lines_auto(f.path(), u64::MAX).unwrap());
        assert_eq!(via_mmap, via_read);
        assert_eq!(via_read, ["Node:a", "last"]);
    }

    #[test]
    fn reader_lines_match_byte_lines() {
        let data = b"a\r\n\nb".to_vec();
        let from_reader: Vec<String> = ReaderLines::new(&data[..])
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(from_reader, collect(iter_lines_bytes(data)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = iter_lines_auto("/definitely/not/here.txt", 0).err().unwrap();
        assert!(format!("{err:#}").contains("/definitely/not/here.txt"));
    }
}
