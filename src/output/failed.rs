use crate::output::OutputResult;
use std::path::Path;

/// Writes the URLs that produced no record, one per line
///
/// With nothing to report, a list left over from an earlier run is removed.
pub fn write_failed_urls(path: &Path, urls: &[String]) -> OutputResult<()> {
    if urls.is_empty() {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut content = urls.join("\n");
    content.push('\n');
    std::fs::write(path, content)?;
    tracing::info!("Wrote {} failed URLs to {}", urls.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_failed_urls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("miel_failed_urls.txt");
        let urls = vec!["https://x.example/a".to_string(), "https://x.example/b".to_string()];

        write_failed_urls(&path, &urls).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "https://x.example/a\nhttps://x.example/b\n"
        );
    }

    #[test]
    fn test_no_failures_removes_stale_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("miel_failed_urls.txt");
        std::fs::write(&path, "https://x.example/old\n").unwrap();

        write_failed_urls(&path, &[]).unwrap();
        assert!(!path.exists());
    }
}
