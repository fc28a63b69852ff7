//! Destinations for confirmed working proxies

use crate::proxy::models::ProxyType;
use crate::Result;
use anyhow::Context;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Line-oriented per-family output collection.
///
/// Implementations serialize writes per family so concurrent checkers of the
/// same family never interleave within a line.
pub trait OutputSink: Send + Sync {
    /// Replace the family's collection with a single header row
    fn write_header(&self, proxy_type: ProxyType, header: &str) -> Result<()>;

    /// Append one line to the family's collection
    fn append(&self, proxy_type: ProxyType, line: &str) -> Result<()>;
}

/// Writes `http.txt` and `socks5.txt` under an output directory
#[derive(Debug)]
pub struct FileOutput {
    dir: PathBuf,
    http_lock: Mutex<()>,
    socks5_lock: Mutex<()>,
}

impl FileOutput {
    /// Use `dir` for output, creating it if needed. Existing files are kept.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {:?}", dir))?;

        Ok(Self {
            dir,
            http_lock: Mutex::new(()),
            socks5_lock: Mutex::new(()),
        })
    }

    pub fn path(&self, proxy_type: ProxyType) -> PathBuf {
        self.dir.join(proxy_type.list_file_name())
    }

    /// Empty both output files
    pub fn truncate(&self) -> Result<()> {
        for proxy_type in ProxyType::ALL {
            let _guard = self.lock(proxy_type).lock();
            let path = self.path(proxy_type);
            fs::write(&path, b"").with_context(|| format!("failed to clear {:?}", path))?;
        }
        Ok(())
    }

    fn lock(&self, proxy_type: ProxyType) -> &Mutex<()> {
        match proxy_type {
            ProxyType::Http => &self.http_lock,
            ProxyType::Socks5 => &self.socks5_lock,
        }
    }
}

impl OutputSink for FileOutput {
    fn write_header(&self, proxy_type: ProxyType, header: &str) -> Result<()> {
        let _guard = self.lock(proxy_type).lock();
        let path = self.path(proxy_type);
        fs::write(&path, format!("{}\n", header))
            .with_context(|| format!("failed to write header to {:?}", path))?;
        Ok(())
    }

    fn append(&self, proxy_type: ProxyType, line: &str) -> Result<()> {
        let _guard = self.lock(proxy_type).lock();
        let path = self.path(proxy_type);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {:?}", path))?;
        writeln!(file, "{}", line).with_context(|| format!("failed to append to {:?}", path))?;
        file.flush()?;
        Ok(())
    }
}

/// Keeps output lines in memory, for embedding callers and tests
#[derive(Debug, Default)]
pub struct MemoryOutput {
    http: Mutex<Vec<String>>,
    socks5: Mutex<Vec<String>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the lines written for one family so far
    pub fn lines(&self, proxy_type: ProxyType) -> Vec<String> {
        self.family(proxy_type).lock().clone()
    }

    fn family(&self, proxy_type: ProxyType) -> &Mutex<Vec<String>> {
        match proxy_type {
            ProxyType::Http => &self.http,
            ProxyType::Socks5 => &self.socks5,
        }
    }
}

impl OutputSink for MemoryOutput {
    fn write_header(&self, proxy_type: ProxyType, header: &str) -> Result<()> {
        let mut lines = self.family(proxy_type).lock();
        lines.clear();
        lines.push(header.to_string());
        Ok(())
    }

    fn append(&self, proxy_type: ProxyType, line: &str) -> Result<()> {
        self.family(proxy_type).lock().push(line.to_string());
        Ok(())
    }
}
