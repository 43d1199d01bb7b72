//! Content store that writes one HTML file per link

use std::path::PathBuf;
use url::Url;

/// Writes downloaded pages into a directory
///
/// The file name is the last path segment of the link plus `.html`, so
/// `https://en.wikipedia.org/wiki/Car` becomes `Car.html`. Existing files
/// are overwritten.
#[derive(Debug, Clone)]
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path the content of `link` is written to
    pub fn path_for(&self, link: &str) -> PathBuf {
        self.directory.join(format!("{}.html", file_stem(link)))
    }

    /// Saves `content` for `link`, creating the directory if needed
    pub async fn save(&self, link: &str, content: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.path_for(link);
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }
}

/// Derives a file stem from the last path segment of a link
fn file_stem(link: &str) -> String {
    let segment = match Url::parse(link) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .unwrap_or_default(),
        Err(_) => link
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string(),
    };

    // Path separators cannot appear in a URL segment, but `.`/`..` and
    // backslashes would still escape the directory on some platforms.
    let segment = segment.replace('\\', "_");
    match segment.as_str() {
        "" | "." | ".." => "index".to_string(),
        _ => segment,
    }
}
