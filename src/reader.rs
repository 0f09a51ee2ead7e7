//! Generic Buffered Reader, for seamless gzip support
use std::{
    fs::File,
    io::{BufRead, BufReader, Read, Write},
    path::Path,
};

#[cfg(feature = "flate2")]
use flate2::{read::GzDecoder, write::GzEncoder, Compression as GzCompression};

/// True if this file is gzip compressed, by its extension
pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

#[derive(Debug)]
pub enum BufferedReader {
    /// Readable RINEX
    PlainFile(BufReader<File>),
    /// gzip compressed RINEX
    #[cfg(feature = "flate2")]
    GzFile(BufReader<GzDecoder<File>>),
}

impl BufferedReader {
    /// Opens a local file, decompressing it on the fly if needed.
    /// Without the flate2 feature, gzip files are an [std::io::ErrorKind::Unsupported] error.
    pub fn new(path: &Path) -> std::io::Result<Self> {
        let f = File::open(path)?;
        if is_gzip(path) {
            #[cfg(feature = "flate2")]
            {
                Ok(Self::GzFile(BufReader::new(GzDecoder::new(f))))
            }
            #[cfg(not(feature = "flate2"))]
            {
                Err(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "gzip compressed files require the flate2 feature",
                ))
            }
        } else {
            Ok(Self::PlainFile(BufReader::new(f)))
        }
    }
}

impl Read for BufferedReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, std::io::Error> {
        match self {
            Self::PlainFile(h) => h.read(buf),
            #[cfg(feature = "flate2")]
            Self::GzFile(h) => h.read(buf),
        }
    }
}

impl BufRead for BufferedReader {
    fn fill_buf(&mut self) -> Result<&[u8], std::io::Error> {
        match self {
            Self::PlainFile(h) => h.fill_buf(),
            #[cfg(feature = "flate2")]
            Self::GzFile(h) => h.fill_buf(),
        }
    }
    fn consume(&mut self, s: usize) {
        match self {
            Self::PlainFile(h) => h.consume(s),
            #[cfg(feature = "flate2")]
            Self::GzFile(h) => h.consume(s),
        }
    }
}

/// Reads the header section only, up to and including END OF HEADER.
/// Line terminators are preserved.
pub fn read_header(path: &Path) -> std::io::Result<String> {
    let mut reader = BufferedReader::new(path)?;
    let mut header = String::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        header.push_str(&line);
        if line.len() > 60 && line.trim_end().ends_with(crate::header::END_OF_HEADER) {
            break;
        }
    }
    Ok(header)
}

/// Reads entire file content, decompressing it if needed
pub fn read_to_string(path: &Path) -> std::io::Result<String> {
    let mut reader = BufferedReader::new(path)?;
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    Ok(content)
}

/// Writes content into given (new) file, gzip encoding it when `gzip` is set,
/// and syncs it to disk.
pub(crate) fn write_synced(file: File, content: &str, gzip: bool) -> std::io::Result<()> {
    if gzip {
        #[cfg(feature = "flate2")]
        {
            let mut encoder = GzEncoder::new(file, GzCompression::new(5));
            encoder.write_all(content.as_bytes())?;
            let file = encoder.finish()?;
            return file.sync_all();
        }
        #[cfg(not(feature = "flate2"))]
        {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "gzip compressed files require the flate2 feature",
            ));
        }
    }
    let mut file = file;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}
