//! services/api/src/adapters/cloudinary.rs
//!
//! Builds Cloudinary delivery URLs for stored image paths. This is a string
//! transform following Cloudinary's URL scheme; the asset host is never contacted.
//!
//! ```text
//! https://res.cloudinary.com/<cloud>/image/upload/[s--<sig>--/][v1/]<path>
//! ```

use base64::Engine;
use cardio_core::ports::{AssetUrlBuilder, PortError, PortResult};

use crate::config::CloudinaryConfig;

const DELIVERY_HOST: &str = "res.cloudinary.com";
const RESOURCE_TYPE: &str = "image";
const DELIVERY_TYPE: &str = "upload";
const SIGNATURE_LENGTH: usize = 8;

#[derive(Clone)]
pub struct CloudinaryUrlBuilder {
    cloud_name: String,
    api_secret: Option<String>,
    secure: bool,
    sign_urls: bool,
}

impl CloudinaryUrlBuilder {
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            cloud_name: config.cloud_name.clone(),
            api_secret: config.api_secret.clone(),
            secure: config.secure,
            sign_urls: config.sign_urls,
        }
    }

    fn signature(&self, source: &str) -> PortResult<String> {
        let secret = self.api_secret.as_deref().ok_or_else(|| {
            PortError::Unexpected("URL signing is enabled but no API secret is configured".into())
        })?;
        let digest = sha1_smol::Sha1::from(format!("{source}{secret}")).digest().bytes();
        let encoded = base64::engine::general_purpose::URL_SAFE.encode(digest);
        Ok(format!("s--{}--", &encoded[..SIGNATURE_LENGTH]))
    }
}

impl AssetUrlBuilder for CloudinaryUrlBuilder {
    fn delivery_url(&self, path: &str) -> PortResult<String> {
        if path.is_empty() {
            return Err(PortError::NotFound("Image path is empty".into()));
        }
        // Already a full URL: delivered as stored.
        if is_remote_url(path) {
            return Ok(path.to_string());
        }

        let source = percent_decode(&collapse_slashes(path));
        let version = (source.contains('/') && !has_version_prefix(&source)).then_some("v1");
        let escaped = smart_escape(&source);
        let signature = if self.sign_urls {
            Some(self.signature(&escaped)?)
        } else {
            None
        };

        let scheme = if self.secure { "https" } else { "http" };
        let mut url = format!(
            "{scheme}://{DELIVERY_HOST}/{}/{RESOURCE_TYPE}/{DELIVERY_TYPE}",
            self.cloud_name
        );
        for segment in [signature.as_deref(), version].into_iter().flatten() {
            url.push('/');
            url.push_str(segment);
        }
        url.push('/');
        url.push_str(&escaped);
        Ok(url)
    }
}

fn is_remote_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// `v` followed by at least one digit, e.g. `v1699999999/folder/img.png`.
fn has_version_prefix(path: &str) -> bool {
    path.strip_prefix('v')
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Percent-encodes every byte outside Cloudinary's safe set `[A-Za-z0-9_.\-/:]`.
/// Unlike `urlencoding::encode`, `/` and `:` pass through.
fn smart_escape(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for byte in source.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'-' | b'/' | b':') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Decodes `%XX` sequences so already-escaped paths are not escaped twice.
fn percent_decode(source: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(source.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(secure: bool, sign_urls: bool) -> CloudinaryUrlBuilder {
        CloudinaryUrlBuilder::new(&CloudinaryConfig {
            cloud_name: "demo".into(),
            api_secret: Some("abcd".into()),
            secure,
            sign_urls,
        })
    }

    #[test]
    fn test_plain_public_id() {
        assert_eq!(
            builder(true, false).delivery_url("sample.jpg").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/sample.jpg"
        );
        assert_eq!(
            builder(false, false).delivery_url("sample.jpg").unwrap(),
            "http://res.cloudinary.com/demo/image/upload/sample.jpg"
        );
    }

    #[test]
    fn test_folder_gets_default_version() {
        assert_eq!(
            builder(true, false).delivery_url("cardio/qr_1.png").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/v1/cardio/qr_1.png"
        );
        assert_eq!(
            builder(true, false)
                .delivery_url("v1699999999/cardio/qr_1.png")
                .unwrap(),
            "https://res.cloudinary.com/demo/image/upload/v1699999999/cardio/qr_1.png"
        );
    }

    #[test]
    fn test_remote_url_passes_through() {
        let url = "https://cdn.example.org/images/a b.png";
        assert_eq!(builder(true, true).delivery_url(url).unwrap(), url);
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            builder(true, false).delivery_url("my image~1.png").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/my%20image%7E1.png"
        );
        assert_eq!(
            builder(true, false).delivery_url("a%20b.png").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/a%20b.png"
        );
        assert_eq!(
            builder(true, false).delivery_url("cardio//x.png").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/v1/cardio/x.png"
        );
    }

    fn signing_builder(secret: &str) -> CloudinaryUrlBuilder {
        CloudinaryUrlBuilder::new(&CloudinaryConfig {
            cloud_name: "demo".into(),
            api_secret: Some(secret.into()),
            secure: true,
            sign_urls: true,
        })
    }

    #[test]
    fn test_signed_url() {
        assert_eq!(
            signing_builder("b").delivery_url("image.jpg").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/s----SjmNDA--/image.jpg"
        );
    }

    #[test]
    fn test_signature_covers_escaped_path() {
        assert_eq!(
            signing_builder("b").delivery_url("my image.png").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/s--qLDNOVvQ--/my%20image.png"
        );
        // Same asset given pre-escaped: same URL.
        assert_eq!(
            signing_builder("b").delivery_url("my%20image.png").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/s--qLDNOVvQ--/my%20image.png"
        );
        // The version segment is outside the signed part.
        assert_eq!(
            signing_builder("b").delivery_url("cardio/a.png").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/s--06r4-PW3--/v1/cardio/a.png"
        );
    }

    #[test]
    fn test_malformed_escape_is_kept() {
        assert_eq!(
            builder(true, false).delivery_url("100%zz.png").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/100%25zz.png"
        );
    }

    #[test]
    fn test_signing_without_secret_fails() {
        let builder = CloudinaryUrlBuilder::new(&CloudinaryConfig {
            cloud_name: "demo".into(),
            api_secret: None,
            secure: true,
            sign_urls: true,
        });
        assert!(matches!(
            builder.delivery_url("sample.jpg"),
            Err(PortError::Unexpected(_))
        ));
    }
}
