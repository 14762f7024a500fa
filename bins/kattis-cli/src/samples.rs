// Sample archive download and extraction
use anyhow::{Context, Result};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fetch the samples archive; `Ok(None)` when the server answered with an error status
pub async fn download(url: &str) -> Result<Option<Vec<u8>>> {
    info!(url = %url, "Downloading samples");

    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        warn!(url = %url, status = %status, "Sample download rejected");
        return Ok(None);
    }

    let bytes = response
        .bytes()
        .await
        .context("Failed to read sample archive body")?;
    debug!(bytes = bytes.len(), "Sample archive downloaded");
    Ok(Some(bytes.to_vec()))
}

/// Unpack a zip archive into `dest`, returning the files written
///
/// Entries whose path would land outside `dest` are skipped.
pub async fn extract(archive: Vec<u8>, dest: &Path) -> Result<Vec<PathBuf>> {
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive))
            .context("Failed to read sample archive")?;
        let mut written = Vec::new();

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            let Some(relative) = entry.enclosed_name() else {
                warn!(entry = %entry.name(), "Skipping archive entry outside target directory");
                continue;
            };
            let outpath = dest.join(relative);

            if entry.is_dir() {
                std::fs::create_dir_all(&outpath)?;
                continue;
            }
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile = std::fs::File::create(&outpath)
                .with_context(|| format!("Failed to create {}", outpath.display()))?;
            std::io::copy(&mut entry, &mut outfile)?;
            written.push(outpath);
        }

        Ok::<_, anyhow::Error>(written)
    })
    .await?
}
