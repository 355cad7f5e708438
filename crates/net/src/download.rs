//! Streaming file downloads

use crate::client::NetClient;
use cmbuild_errors::{Error, NetworkError};
use futures::StreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Stream `url` into `dest`, truncating any existing file.
///
/// The file is only created once the server has answered with a success
/// status, and is removed again if the body stream breaks off.
///
/// # Errors
///
/// Returns [`NetworkError::HttpError`] for a non-success status, a network
/// error if the transfer fails, or an I/O error if `dest` cannot be written.
pub async fn download_to_file(client: &NetClient, url: &str, dest: &Path) -> Result<u64, Error> {
    let response = client.get(url).await?;

    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::HttpError {
            status: status.as_u16(),
            message: status.to_string(),
        }
        .into());
    }

    let mut file = File::create(dest)
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;

    match write_body(response, &mut file, dest).await {
        Ok(written) => Ok(written),
        Err(e) => {
            drop(file);
            let _ = tokio::fs::remove_file(dest).await;
            Err(e)
        }
    }
}

async fn write_body(response: reqwest::Response, file: &mut File, dest: &Path) -> Result<u64, Error> {
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;
    Ok(written)
}
