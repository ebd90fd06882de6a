use reqwest::header::LOCATION;
use reqwest::{Client, StatusCode, Url};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use super::ReleaseError;

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// A client that leaves redirects to [`download_image`].
pub fn download_client() -> Result<Client, ReleaseError> {
    Ok(Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Download `url` into `destination`, following redirects by hand.
///
/// Any status >= 400 fails before the destination is touched. A failure
/// while writing the body removes the partial file.
#[instrument(skip(client, destination), fields(destination = %destination.display()))]
pub async fn download_image(
    client: &Client,
    url: &str,
    destination: &Path,
) -> Result<(), ReleaseError> {
    let mut target = Url::parse(url).map_err(|e| ReleaseError::InvalidUrl(format!("{}: {}", url, e)))?;

    for hop in 0..=MAX_REDIRECTS {
        let response = client.get(target.clone()).send().await?;
        let status = response.status();

        if is_redirect(status) {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            if let Some(location) = location {
                target = target
                    .join(&location)
                    .map_err(|e| ReleaseError::InvalidUrl(format!("{}: {}", location, e)))?;
                debug!(hop, status = status.as_u16(), next = %target, "following redirect");
                continue;
            }
        }

        if status.as_u16() >= 400 {
            return Err(ReleaseError::DownloadStatus(status));
        }

        return write_body(response, destination).await;
    }

    Err(ReleaseError::TooManyRedirects(MAX_REDIRECTS))
}

async fn write_body(mut response: reqwest::Response, destination: &Path) -> Result<(), ReleaseError> {
    if let Some(dir) = destination.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }

    let mut file = fs::File::create(destination).await?;
    let result = stream_body(&mut response, &mut file).await;
    if let Err(err) = &result {
        warn!(error = %err, "download failed, removing partial file");
        drop(file);
        let _ = fs::remove_file(destination).await;
    }
    result
}

async fn stream_body(response: &mut reqwest::Response, file: &mut fs::File) -> Result<(), ReleaseError> {
    let mut written = 0usize;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;
    debug!(bytes = written, "image written");
    Ok(())
}
