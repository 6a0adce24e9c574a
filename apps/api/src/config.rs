use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_ORIGINS: &str = "http://localhost:5173";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where uploaded attachments are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobBackend {
    /// Plain files under a directory on local disk.
    Local { root: PathBuf },
    /// An S3 bucket (MinIO locally, AWS in production).
    S3(S3Settings),
}

#[derive(Debug, Clone, PartialEq)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub blob_backend: BlobBackend,
    pub max_upload_bytes: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let allowed_origins =
            parse_origins(&lookup("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ORIGINS.to_string()));

        let backend = lookup("BLOB_BACKEND").unwrap_or_else(|| "local".to_string());
        let blob_backend = match backend.trim().to_ascii_lowercase().as_str() {
            "local" => BlobBackend::Local {
                root: PathBuf::from(
                    lookup("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
                ),
            },
            "s3" => BlobBackend::S3(S3Settings {
                bucket: require("S3_BUCKET")?,
                endpoint: require("S3_ENDPOINT")?,
                region: lookup("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            other => bail!("BLOB_BACKEND must be 'local' or 's3', got '{other}'"),
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            port,
            allowed_origins,
            blob_backend,
            max_upload_bytes,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Splits a comma-separated origin list, dropping blanks and trailing slashes.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/portfolio")]).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(
            config.blob_backend,
            BlobBackend::Local {
                root: PathBuf::from("uploads")
            }
        );
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_missing_database_url_is_an_error() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_origin_list_is_split_and_trimmed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db"),
            (
                "ALLOWED_ORIGINS",
                " http://localhost:5173 , https://me.example.app/ ,,",
            ),
        ])
        .unwrap();

        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:5173", "https://me.example.app"]
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = config_from(&[("DATABASE_URL", "postgres://db"), ("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_s3_backend_requires_bucket_settings() {
        let err = config_from(&[("DATABASE_URL", "postgres://db"), ("BLOB_BACKEND", "s3")])
            .unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));

        let config = config_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("BLOB_BACKEND", "S3"),
            ("S3_BUCKET", "portfolio"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("AWS_ACCESS_KEY_ID", "minio"),
            ("AWS_SECRET_ACCESS_KEY", "minio123"),
        ])
        .unwrap();
        match config.blob_backend {
            BlobBackend::S3(s3) => {
                assert_eq!(s3.bucket, "portfolio");
                assert_eq!(s3.region, "us-east-1");
            }
            other => panic!("expected S3 backend, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let err = config_from(&[("DATABASE_URL", "postgres://db"), ("BLOB_BACKEND", "ftp")])
            .unwrap_err();
        assert!(err.to_string().contains("BLOB_BACKEND"));
    }
}
