//! Turning a URL, pasted text, or a set of uploads into one text blob

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{redirect, Client};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::error::Error as StdError;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::{Host, Url};

use crate::error::{AppError, Result};
use mindloom_shared::UploadedFile;

pub const MIN_TEXT_CHARS: usize = 50;
pub const DIRECT_TEXT_TITLE: &str = "Direct Text Input";
const FILE_SEPARATOR: &str = "\n\n---\n\n";
pub const MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;
const MAX_REDIRECTS: usize = 5;
const PRIVATE_TARGET: &str = "URL must not point to a private or local address";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquiredContent {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Accepts only absolute http(s) URLs with a host
pub fn validate_url(raw: &str) -> Result<Url> {
    let invalid = || AppError::ValidationError("Please enter a valid URL".to_string());
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(invalid()),
    }
}

pub fn accept_text(text: &str) -> Result<AcquiredContent> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_TEXT_CHARS {
        return Err(AppError::ValidationError(format!(
            "Please enter at least {} characters",
            MIN_TEXT_CHARS
        )));
    }

    Ok(AcquiredContent {
        title: DIRECT_TEXT_TITLE.to_string(),
        content: trimmed.to_string(),
        url: None,
    })
}

pub fn combine_files(files: &[UploadedFile]) -> Result<AcquiredContent> {
    if files.is_empty() {
        return Err(AppError::ValidationError(
            "No files were processed".to_string(),
        ));
    }

    let names = files
        .iter()
        .map(|file| file.file_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let content = files
        .iter()
        .map(|file| file.content.as_str())
        .collect::<Vec<_>>()
        .join(FILE_SEPARATOR);

    Ok(AcquiredContent {
        title: format!("Uploaded Files: {}", names),
        content,
        url: None,
    })
}

/// Title and readable text of an HTML page
///
/// Headings become `## ` lines and list items `- ` lines so the local
/// analyzers pick up the page structure.
pub fn extract_html(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let mut title = None;
    if let Ok(sel) = Selector::parse("title") {
        if let Some(el) = document.select(&sel).next() {
            let text = collapse_whitespace(&el.text().collect::<String>());
            if !text.is_empty() {
                title = Some(text);
            }
        }
    }

    let mut blocks = Vec::new();
    if let Ok(sel) = Selector::parse("h1, h2, h3, h4, h5, h6, p, li, blockquote") {
        for el in document.select(&sel) {
            if has_block_ancestor(&el) {
                continue;
            }
            let text = collapse_whitespace(&el.text().collect::<String>());
            if text.is_empty() {
                continue;
            }
            let block = match el.value().name() {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => format!("## {}", text),
                "li" => format!("- {}", text),
                _ => text,
            };
            blocks.push(block);
        }
    }

    if title.is_none() {
        if let Ok(sel) = Selector::parse("h1") {
            title = document
                .select(&sel)
                .next()
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .filter(|t| !t.is_empty());
        }
    }

    (title, blocks.join("\n\n"))
}

/// Skips a `<p>` inside an `<li>` and similar so text is not emitted twice
fn has_block_ancestor(el: &ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| matches!(ancestor.value().name(), "p" | "li" | "blockquote"))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether an address is reachable on the public internet
///
/// Loopback, private, link-local, CGNAT, multicast and unspecified ranges
/// are not, nor are IPv4-mapped forms of them.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_multicast()
                || v4.is_documentation()
                || a == 0
                || (a == 100 && (b & 0xC0) == 64))
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (first & 0xFE00) == 0xFC00
                || (first & 0xFFC0) == 0xFE80)
        }
    }
}

/// IP-literal hosts that are not public; domain names are left to the resolver
fn is_blocked_literal(host: Host<&str>) -> bool {
    match host {
        Host::Ipv4(v4) => !is_public_ip(IpAddr::V4(v4)),
        Host::Ipv6(v6) => !is_public_ip(IpAddr::V6(v6)),
        Host::Domain(_) => false,
    }
}

/// System resolver that drops every non-public address, so redirects and
/// rebinding cannot reach internal hosts either
struct PublicOnlyResolver;

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(resolve_public(name))
    }
}

async fn resolve_public(name: Name) -> std::result::Result<Addrs, Box<dyn StdError + Send + Sync>> {
    let resolved = tokio::net::lookup_host((name.as_str(), 0)).await?;
    let public: Vec<SocketAddr> = resolved.filter(|addr| is_public_ip(addr.ip())).collect();
    if public.is_empty() {
        warn!("Refusing to connect to {}: no public address", name.as_str());
        return Err(PRIVATE_TARGET.into());
    }
    Ok(Box::new(public.into_iter()))
}

#[derive(Clone)]
pub struct ContentScraper {
    client: Client,
    allow_private_targets: bool,
    max_page_bytes: usize,
}

impl ContentScraper {
    /// `allow_private_targets` lifts the public-address restriction for
    /// local development
    pub fn new(timeout: Duration, allow_private_targets: bool) -> Result<Self> {
        let redirect_policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if !allow_private_targets && attempt.url().host().is_some_and(is_blocked_literal) {
                attempt.error(PRIVATE_TARGET)
            } else {
                attempt.follow()
            }
        });

        let mut builder = Client::builder()
            .timeout(timeout)
            .redirect(redirect_policy)
            .user_agent(concat!("MindLoom/", env!("CARGO_PKG_VERSION")));
        if !allow_private_targets {
            builder = builder.dns_resolver(Arc::new(PublicOnlyResolver));
        }

        let client = builder.build().map_err(|e| {
            AppError::InternalServerError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            allow_private_targets,
            max_page_bytes: MAX_PAGE_BYTES,
        })
    }

    pub fn with_max_page_bytes(mut self, max_page_bytes: usize) -> Self {
        self.max_page_bytes = max_page_bytes;
        self
    }

    async fn check_target(&self, url: &Url) -> Result<()> {
        if self.allow_private_targets {
            return Ok(());
        }

        let blocked = || AppError::ValidationError(PRIVATE_TARGET.to_string());
        match url.host() {
            Some(Host::Domain(domain)) => {
                let port = url.port_or_known_default().unwrap_or(80);
                let addrs: Vec<SocketAddr> = tokio::net::lookup_host((domain, port))
                    .await
                    .map_err(|e| {
                        AppError::ExternalServiceError(format!("Failed to resolve {}: {}", domain, e))
                    })?
                    .collect();
                if !addrs.iter().any(|addr| is_public_ip(addr.ip())) {
                    return Err(blocked());
                }
                Ok(())
            }
            Some(host) => {
                if is_blocked_literal(host) {
                    Err(blocked())
                } else {
                    Ok(())
                }
            }
            None => Err(AppError::ValidationError("Please enter a valid URL".to_string())),
        }
    }

    /// Reads at most `max_page_bytes` of the body
    async fn read_capped(&self, mut response: reqwest::Response) -> Result<String> {
        let too_large = || {
            AppError::PayloadTooLarge(format!(
                "Page is larger than {} bytes",
                self.max_page_bytes
            ))
        };

        if response
            .content_length()
            .is_some_and(|len| len > self.max_page_bytes as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_page_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    pub async fn scrape(&self, raw_url: &str) -> Result<AcquiredContent> {
        let url = validate_url(raw_url)?;
        self.check_target(&url).await?;
        info!("Scraping content from {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Failed to fetch URL: {}",
                status
            )));
        }

        let body = self.read_capped(response).await?;
        let (title, content) = extract_html(&body);
        debug!(chars = content.len(), "Extracted page text");

        if content.trim().is_empty() {
            return Err(AppError::ValidationError(
                "No readable content found at this URL".to_string(),
            ));
        }

        Ok(AcquiredContent {
            title: title
                .or_else(|| url.host_str().map(str::to_string))
                .unwrap_or_else(|| url.to_string()),
            content,
            url: Some(url.to_string()),
        })
    }
}
