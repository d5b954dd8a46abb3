use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{FinanzasError, Result};
use crate::ledger::Ledger;
use crate::settings::{shellexpand_path, Settings};

/// Where the ledger is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Local(PathBuf),
    /// A published CSV export. Read-only.
    Published(String),
}

impl Source {
    /// Resolve the source: explicit file, explicit URL, then settings.
    pub fn resolve(file: Option<&str>, url: Option<&str>, settings: &Settings) -> Self {
        if let Some(f) = file {
            return Self::Local(PathBuf::from(shellexpand_path(f)));
        }
        if let Some(u) = url {
            return Self::Published(export_url(u));
        }
        if let Some(u) = settings.source_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Self::Published(export_url(u));
        }
        Self::Local(PathBuf::from(shellexpand_path(&settings.data_file)))
    }

    pub fn load(&self) -> Result<Ledger> {
        match self {
            Self::Local(path) => Ledger::open(path),
            Self::Published(url) => fetch_published(url),
        }
    }

    /// Path that writes go to; remote sources cannot be written.
    pub fn writable_path(&self) -> Result<&Path> {
        match self {
            Self::Local(path) => Ok(path),
            Self::Published(url) => Err(FinanzasError::ReadOnlySource(url.clone())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Published(url) => f.write_str(url),
        }
    }
}

fn sheets_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(https://docs\.google\.com/spreadsheets/d/[A-Za-z0-9_-]+)(?:/[^#?]*)?(?:\?[^#]*)?(?:#gid=(\d+))?$")
            .unwrap()
    })
}

/// "Publish to web" links: `/spreadsheets/d/e/<pubid>/pubhtml` or `/pub?...`.
fn published_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(https://docs\.google\.com/spreadsheets/d/e/[A-Za-z0-9_-]+)(?:/[^#?]*)?(?:\?([^#]*))?(?:#gid=(\d+))?$")
            .unwrap()
    })
}

/// Turn a Google Sheets editor or publish link into its CSV export link.
/// Links that already export CSV, and non-Sheets URLs, pass through.
pub fn export_url(url: &str) -> String {
    let url = url.trim();
    if url.contains("output=csv") || url.contains("format=csv") {
        return url.to_string();
    }
    if let Some(caps) = published_re().captures(url) {
        let base = &caps[1];
        let gid = caps
            .get(2)
            .and_then(|q| q.as_str().split('&').find_map(|p| p.strip_prefix("gid=")))
            .or_else(|| caps.get(3).map(|m| m.as_str()));
        return match gid {
            Some(gid) => format!("{base}/pub?output=csv&gid={gid}&single=true"),
            None => format!("{base}/pub?output=csv"),
        };
    }
    match sheets_re().captures(url) {
        Some(caps) => {
            let base = &caps[1];
            let gid = caps.get(2).map_or("0", |m| m.as_str());
            format!("{base}/export?format=csv&gid={gid}")
        }
        None => url.to_string(),
    }
}

#[cfg(feature = "remote")]
fn fetch_published(url: &str) -> Result<Ledger> {
    log::info!("fetching {url}");
    let http = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    let resp = http.get(url).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FinanzasError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let body = resp.bytes()?;
    Ledger::from_reader(body.as_ref())
}

#[cfg(not(feature = "remote"))]
fn fetch_published(url: &str) -> Result<Ledger> {
    Err(FinanzasError::UnsupportedFormat(format!(
        "{url} (built without remote support)"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_url_from_edit_link() {
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/abc-123_X/edit#gid=42"),
            "https://docs.google.com/spreadsheets/d/abc-123_X/export?format=csv&gid=42"
        );
    }

    #[test]
    fn test_export_url_defaults_gid() {
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/abc/edit?usp=sharing"),
            "https://docs.google.com/spreadsheets/d/abc/export?format=csv&gid=0"
        );
    }

    #[test]
    fn test_export_url_passthrough() {
        let published = "https://docs.google.com/spreadsheets/d/e/2PACX-1/pub?output=csv";
        assert_eq!(export_url(published), published);
        assert_eq!(export_url("https://example.com/data.csv"), "https://example.com/data.csv");
    }

    #[test]
    fn test_export_url_from_publish_link() {
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/e/2PACX-1vAbC/pubhtml"),
            "https://docs.google.com/spreadsheets/d/e/2PACX-1vAbC/pub?output=csv"
        );
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/e/2PACX-1vAbC/pub?gid=7&single=true&output=tsv"),
            "https://docs.google.com/spreadsheets/d/e/2PACX-1vAbC/pub?output=csv&gid=7&single=true"
        );
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/e/2PACX-1vAbC/pubhtml#gid=3"),
            "https://docs.google.com/spreadsheets/d/e/2PACX-1vAbC/pub?output=csv&gid=3&single=true"
        );
    }

    #[test]
    fn test_resolve_prefers_file_then_url() {
        let mut settings = Settings::default();
        settings.source_url = Some("https://example.com/a.csv".to_string());

        let s = Source::resolve(Some("/tmp/x.csv"), Some("https://example.com/b.csv"), &settings);
        assert_eq!(s, Source::Local(PathBuf::from("/tmp/x.csv")));

        let s = Source::resolve(None, Some("https://example.com/b.csv"), &settings);
        assert_eq!(s, Source::Published("https://example.com/b.csv".to_string()));

        let s = Source::resolve(None, None, &settings);
        assert_eq!(s, Source::Published("https://example.com/a.csv".to_string()));

        settings.source_url = None;
        let s = Source::resolve(None, None, &settings);
        assert!(matches!(s, Source::Local(_)));
    }

    /// Answer a single HTTP request on a local port with `status` and `body`.
    #[cfg(feature = "remote")]
    fn serve_one(status: u16, body: &'static str) -> String {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let mut tmp = [0u8; 1024];
                let n = stream.read(&mut tmp).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&tmp[..n]);
            }
            let request = String::from_utf8_lossy(&buf).to_lowercase();
            assert!(request.starts_with("get /sheet.csv"));

            let resp = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(resp.as_bytes()).unwrap();
        });
        format!("http://{addr}/sheet.csv")
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_load_published_csv() {
        let url = serve_one(
            200,
            "Fecha,Tipo,Monto,Metodo\n2025-03-01,Gasto,\"1.200,00\",Visa Ctes\n",
        );
        let ledger = Source::Published(url).load().unwrap();
        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.entries()[0].movement.amount, 1200.0);
        assert_eq!(ledger.entries()[0].movement.method, "Visa Ctes");
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_load_published_not_found() {
        let url = serve_one(404, "not found");
        let err = Source::Published(url.clone()).load().unwrap_err();
        match err {
            FinanzasError::HttpStatus { status, url: failed } => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("expected HttpStatus, got {other}"),
        }
    }

    #[test]
    fn test_published_source_is_read_only() {
        let s = Source::Published("https://example.com/a.csv".to_string());
        assert!(matches!(s.writable_path(), Err(FinanzasError::ReadOnlySource(_))));
    }
}
