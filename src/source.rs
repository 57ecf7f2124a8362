use log::debug;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
    #[error("failed to read {path:?}: {message}")]
    Io { path: PathBuf, message: String },
}

/// Where chapter source text comes from.
pub trait ChapterSource: Send + Sync {
    fn fetch(&self, chapter: u32) -> Result<String, FetchError>;

    /// Human-readable location of a chapter, for logs.
    fn locate(&self, chapter: u32) -> String;
}

pub fn chapter_file_name(chapter: u32) -> String {
    format!("chapter{chapter}.txt")
}

/// `GET <base-url>/chapterN.txt`.
pub struct HttpSource {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ChapterSource for HttpSource {
    fn fetch(&self, chapter: u32) -> Result<String, FetchError> {
        let url = self.locate(chapter);
        debug!("GET {url}");
        match self.agent.get(&url).call() {
            Ok(response) => response.into_string().map_err(|e| FetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            }),
            Err(ureq::Error::Status(status, _)) => Err(FetchError::Status { status, url }),
            Err(ureq::Error::Transport(err)) => Err(FetchError::Transport {
                url,
                message: err.to_string(),
            }),
        }
    }

    fn locate(&self, chapter: u32) -> String {
        format!("{}/{}", self.base_url, chapter_file_name(chapter))
    }
}

/// Chapter files in a local directory, laid out like the web endpoint.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ChapterSource for DirectorySource {
    fn fetch(&self, chapter: u32) -> Result<String, FetchError> {
        let path = self.root.join(chapter_file_name(chapter));
        fs::read_to_string(&path).map_err(|e| FetchError::Io {
            path,
            message: e.to_string(),
        })
    }

    fn locate(&self, chapter: u32) -> String {
        self.root
            .join(chapter_file_name(chapter))
            .display()
            .to_string()
    }
}

/// Picks the source for a configured base location: `file://` URLs and bare
/// paths read from disk, anything else goes over HTTP.
pub fn source_for(base: &str) -> Box<dyn ChapterSource> {
    if let Some(path) = base.strip_prefix("file://") {
        Box::new(DirectorySource::new(path))
    } else if base.starts_with("http://") || base.starts_with("https://") {
        Box::new(HttpSource::new(base))
    } else {
        Box::new(DirectorySource::new(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn http_urls_follow_chapter_layout() {
        let source = HttpSource::new("https://example.org/divide/ch/");
        assert_eq!(source.base_url(), "https://example.org/divide/ch");
        assert_eq!(source.locate(12), "https://example.org/divide/ch/chapter12.txt");
    }

    #[test]
    fn directory_source_reads_and_reports_missing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("chapter2.txt"), "# Two").unwrap();
        let source = DirectorySource::new(dir.path());

        assert_eq!(source.fetch(2).unwrap(), "# Two");
        assert!(matches!(source.fetch(3), Err(FetchError::Io { .. })));
    }

    #[test]
    fn file_urls_resolve_to_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("chapter1.txt"), "one").unwrap();
        let base = format!("file://{}", dir.path().display());

        assert_eq!(source_for(&base).fetch(1).unwrap(), "one");
    }
}
