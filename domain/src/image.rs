//! Image reference validation: placement of image URLs in the prompt, file
//! type whitelisting and optional reachability probing.

use tracing::debug;
use url::Url;

use crate::{CheckError, ImageProbe, ProbeError};

/// Accepted image file extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Validate the image URLs referenced by `prompt`.
///
/// `urls` are the strict URLs extracted from the raw prompt. Reachability is
/// only probed when `proxy` is non-empty.
pub fn check_image_refs<P>(
    prompt: &str,
    urls: &[String],
    proxy: &str,
    probe: &P,
) -> Result<(), CheckError>
where
    P: ImageProbe + ?Sized,
{
    if urls.is_empty() {
        return Ok(());
    }

    let parts: Vec<&str> = prompt.split([' ', ',']).collect();
    check_position(&parts, urls.len())?;
    // A lone image reference needs either another image or some text.
    if parts.len() == 1 {
        return Err(CheckError::InvalidPromptParts);
    }

    let proxy = if proxy.is_empty() {
        None
    } else {
        Some(Url::parse(proxy).map_err(|_| CheckError::InvalidProxyUrl)?)
    };

    for url in urls {
        let url = strip_weight(url);
        if !has_image_extension(url) {
            return Err(CheckError::InvalidImageContentType(url.to_string()));
        }
        let Some(proxy) = proxy.as_ref() else {
            continue;
        };
        match probe.head_status(url, proxy) {
            Ok(200) => debug!(%url, "image reachable"),
            Ok(status) => {
                return Err(CheckError::InvalidImageUrl {
                    url: url.to_string(),
                    status,
                })
            }
            Err(ProbeError::InvalidProxy(reason)) => {
                debug!(%reason, "probe rejected proxy");
                return Err(CheckError::InvalidProxyUrl);
            }
            Err(ProbeError::Transport(reason)) => {
                debug!(%url, %reason, "image probe failed");
                return Err(CheckError::InternalError);
            }
        }
    }
    Ok(())
}

/// Image URLs must lead the prompt. URLs right after the first `--sref` are
/// also accounted for; later `--sref` runs are not revisited.
fn check_position(parts: &[&str], url_count: usize) -> Result<(), CheckError> {
    let mut remaining = url_count as i64;

    let mut i = 0;
    while i < parts.len() {
        let part = parts[i];
        if !part.is_empty() {
            if !part.starts_with("http") {
                break;
            }
            remaining -= 1;
        }
        i += 1;
    }

    if let Some(offset) = parts[i..].iter().position(|p| *p == "--sref") {
        let after = &parts[i + offset + 1..];
        let refs = after
            .iter()
            .filter(|p| !p.is_empty())
            .take_while(|p| p.starts_with("http"))
            .count();
        remaining -= refs as i64;
    }

    if remaining != 0 {
        return Err(CheckError::InvalidImagePromptPosition);
    }
    Ok(())
}

/// Drop a `::weight` suffix used by style references.
fn strip_weight(url: &str) -> &str {
    url.split("::").next().unwrap_or(url)
}

fn has_image_extension(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url.to_ascii_lowercase(),
    };
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
