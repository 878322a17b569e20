use std::path::PathBuf;

use serde::Deserialize;

fn default_region() -> String {
    String::from("us-east-1")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// Configuration for the S3-compatible object storage backend.
#[derive(Clone, Deserialize)]
pub struct S3Config {
    /// Endpoint URL of the S3-compatible service
    /// (e.g. `https://s3.example.com` or a `MinIO` address).
    pub endpoint: String,

    /// Region passed to the SDK. Most S3-compatible services accept anything.
    #[serde(default = "default_region")]
    pub region: String,

    /// Access key id.
    pub access_key: String,

    /// Secret access key.
    pub secret_key: String,

    /// Optional prefix applied to every bucket name, for multi-tenant
    /// deployments sharing one endpoint (e.g. `"a1b2c3-"`).
    #[serde(default)]
    pub bucket_prefix: Option<String>,

    /// Optional CDN rewrite template for public URLs. Placeholders
    /// `{endpoint}`, `{prefix}`, `{bucket}` and `{path}` are substituted.
    #[serde(default)]
    pub cdn_rewrite: Option<String>,

    /// Local static asset tree mirrored into the static bucket.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Optional deployment-specific tree layered over `static_dir`;
    /// wins on filename collision.
    #[serde(default)]
    pub static_override_dir: Option<PathBuf>,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("bucket_prefix", &self.bucket_prefix)
            .field("cdn_rewrite", &self.cdn_rewrite)
            .field("static_dir", &self.static_dir)
            .field("static_override_dir", &self.static_override_dir)
            .finish()
    }
}

impl S3Config {
    /// Create a new `S3Config` for the given endpoint and credentials.
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: default_region(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            bucket_prefix: None,
            cdn_rewrite: None,
            static_dir: default_static_dir(),
            static_override_dir: None,
        }
    }

    /// Set the bucket name prefix.
    #[must_use]
    pub fn with_bucket_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.bucket_prefix = Some(prefix.into());
        self
    }

    /// Set the CDN rewrite template.
    #[must_use]
    pub fn with_cdn_rewrite(mut self, template: impl Into<String>) -> Self {
        self.cdn_rewrite = Some(template.into());
        self
    }

    /// Set the static asset tree root.
    #[must_use]
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    /// Set the static override tree root.
    #[must_use]
    pub fn with_static_override_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_override_dir = Some(dir.into());
        self
    }

    /// Return the configured prefix, or `""` when unset.
    pub(crate) fn prefix(&self) -> &str {
        self.bucket_prefix.as_deref().unwrap_or("")
    }

    /// Physical bucket name for a logical bucket (prefix applied).
    pub(crate) fn bucket_name(&self, bucket: &str) -> String {
        format!("{}{bucket}", self.prefix())
    }

    /// Public URL for an object, honoring the CDN rewrite template when set.
    pub(crate) fn format_url(&self, bucket: &str, path: &str) -> String {
        match &self.cdn_rewrite {
            Some(template) => template
                .replace("{endpoint}", &self.endpoint)
                .replace("{prefix}", self.prefix())
                .replace("{bucket}", bucket)
                .replace("{path}", path),
            None => format!("{}/{}{bucket}/{path}", self.endpoint, self.prefix()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_url_without_prefix() {
        let config = S3Config::new("https://s3.example.com", "ak", "sk");
        assert_eq!(
            config.format_url("attachments", "12.png"),
            "https://s3.example.com/attachments/12.png"
        );
    }

    #[test]
    fn direct_url_with_prefix() {
        let config =
            S3Config::new("https://s3.example.com", "ak", "sk").with_bucket_prefix("t1-");
        assert_eq!(
            config.format_url("attachments", "12.png"),
            "https://s3.example.com/t1-attachments/12.png"
        );
        assert_eq!(config.bucket_name("static"), "t1-static");
    }

    #[test]
    fn cdn_rewrite_substitutes_placeholders() {
        let config = S3Config::new("https://s3.example.com", "ak", "sk")
            .with_bucket_prefix("t1-")
            .with_cdn_rewrite("https://cdn.example.net/{prefix}{bucket}/{path}");
        assert_eq!(
            config.format_url("static", "css/site.css"),
            "https://cdn.example.net/t1-static/css/site.css"
        );
    }

    #[test]
    fn url_formatting_is_pure() {
        let config = S3Config::new("https://s3.example.com", "ak", "sk");
        let first = config.format_url("attachments", "9.webm");
        let second = config.format_url("attachments", "9.webm");
        assert_eq!(first, second);
    }

    #[test]
    fn debug_redacts_secret_key() {
        let config = S3Config::new("https://s3.example.com", "ak", "super-secret");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }
}
