//! Streaming chunk reader with inter-window overlap.
//!
//! Presents the input as a sequence of windows in which the tail of each
//! window is redelivered at the head of the next, so a header that
//! straddles two read units is always visible inside a single window.
//! A positional read primitive serves footer search and extraction; both
//! paths share one handle, and every read seeks explicitly, so positional
//! reads never disturb the streaming cursor or the retained tail.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::CarveError;

/// One window emitted by [`ChunkReader::read_chunk`].
#[derive(Debug)]
pub struct Chunk {
    /// Retained tail of the previous window followed by freshly read bytes.
    pub data: Vec<u8>,
    /// Absolute offset of `data[0]` in the input.
    pub offset: u64,
    /// Bytes newly read from the input for this window.
    pub fresh: usize,
    /// Trailing bytes that reappear at the head of the next window;
    /// 0 on the final window.
    pub retained: usize,
}

#[derive(Debug)]
pub struct ChunkReader {
    file: File,
    path: PathBuf,
    total_len: u64,
    /// Absolute offset of the next fresh byte.
    position: u64,
    chunk_size: usize,
    overlap_size: usize,
    overlap_tail: Vec<u8>,
    bytes_read: u64,
    chunks_read: u64,
}

impl ChunkReader {
    /// Bind to a file and determine its length.
    pub fn open(path: &Path, chunk_size: usize, overlap_size: usize) -> Result<Self, CarveError> {
        let file = File::open(path).map_err(|source| CarveError::IoOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let total_len = file
            .metadata()
            .map_err(|source| CarveError::IoOpen {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        tracing::debug!(
            path = %path.display(),
            total_len,
            chunk_size,
            overlap_size,
            "input opened"
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            total_len,
            position: 0,
            chunk_size,
            overlap_size,
            overlap_tail: Vec::new(),
            bytes_read: 0,
            chunks_read: 0,
        })
    }

    /// Next window, or `None` at end of input.
    ///
    /// The window starts at the absolute offset of the retained tail and
    /// reads up to `chunk_size` fresh bytes after it. While more input
    /// remains, the last `min(overlap_size, window_len)` bytes are kept
    /// for redelivery.
    pub fn read_chunk(&mut self) -> Result<Option<Chunk>, CarveError> {
        let remaining = self.total_len - self.position;
        if remaining == 0 {
            return Ok(None);
        }

        let to_read = (self.chunk_size as u64).min(remaining) as usize;
        let mut data = std::mem::take(&mut self.overlap_tail);
        let offset = self.position - data.len() as u64;
        let start = data.len();
        data.resize(start + to_read, 0);

        self.file
            .seek(SeekFrom::Start(self.position))
            .and_then(|_| self.file.read_exact(&mut data[start..]))
            .map_err(|source| CarveError::IoRead {
                offset: self.position,
                source,
            })?;

        self.position += to_read as u64;
        self.bytes_read += to_read as u64;
        self.chunks_read += 1;

        let retained = if self.position < self.total_len {
            self.overlap_size.min(data.len())
        } else {
            0
        };
        self.overlap_tail = data[data.len() - retained..].to_vec();

        Ok(Some(Chunk {
            data,
            offset,
            fresh: to_read,
            retained,
        }))
    }

    /// Read up to `max_bytes` starting at `offset`, bounded by the input
    /// length. Returns an empty buffer when `offset` is at or past the end.
    pub fn read_at(&mut self, offset: u64, max_bytes: usize) -> Result<Vec<u8>, CarveError> {
        if offset >= self.total_len {
            return Ok(Vec::new());
        }

        let take = (max_bytes as u64).min(self.total_len - offset) as usize;
        let mut buf = vec![0u8; take];

        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.read_exact(&mut buf))
            .map_err(|source| CarveError::IoRead { offset, source })?;

        Ok(buf)
    }

    /// Reposition the streaming cursor, discarding the retained tail.
    pub fn seek(&mut self, offset: u64) {
        self.position = offset.min(self.total_len);
        self.overlap_tail.clear();
    }

    /// Streaming progress in percent.
    pub fn progress(&self) -> f64 {
        if self.total_len == 0 {
            return 0.0;
        }
        (self.position as f64 / self.total_len as f64) * 100.0
    }

    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.total_len
    }

    /// Total fresh bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Windows produced so far.
    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }
}
