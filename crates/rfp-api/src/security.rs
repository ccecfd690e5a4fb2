//! Security utilities for input validation and sanitization.
//!
//! This module provides:
//! - Control-character stripping and length caps for free text
//! - Attachment URL checks (SSRF protection for links stored on RFPs)

use std::net::IpAddr;

use url::{Host, Url};

use rfp_models::{AttachmentInput, CreateRfpRequest, SubmitResponseRequest, UpdateRfpRequest};

use crate::error::{ApiError, ApiResult};

/// Maximum URL length to prevent DoS attacks.
const MAX_URL_LENGTH: usize = 2048;

/// Maximum length of a long free-text field.
pub const MAX_TEXT_LENGTH: usize = 20_000;

/// Maximum browse search length.
pub const MAX_SEARCH_LENGTH: usize = 200;

const BLOCKED_HOSTS: [&str; 3] = ["localhost", "metadata", "metadata.google.internal"];

/// Strip control characters (newlines and tabs survive) and cap the length.
pub fn sanitize_text(input: &str, max_chars: usize) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(max_chars)
        .collect()
}

/// Single-line variant for search terms.
pub fn sanitize_search(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_SEARCH_LENGTH)
        .collect::<String>()
        .trim()
        .to_string()
}

fn clean_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        *v = sanitize_text(v, MAX_TEXT_LENGTH);
    }
}

fn clean(value: &mut String) {
    *value = sanitize_text(value, MAX_TEXT_LENGTH);
}

pub fn sanitize_create(request: &mut CreateRfpRequest) {
    clean(&mut request.title);
    clean(&mut request.description);
    clean(&mut request.company);
    clean(&mut request.category);
    clean_opt(&mut request.requirements);
    request.tags.iter_mut().for_each(clean);
}

pub fn sanitize_update(request: &mut UpdateRfpRequest) {
    clean_opt(&mut request.title);
    clean_opt(&mut request.description);
    clean_opt(&mut request.company);
    clean_opt(&mut request.category);
    clean_opt(&mut request.requirements);
    if let Some(tags) = request.tags.as_mut() {
        tags.iter_mut().for_each(clean);
    }
}

pub fn sanitize_submission(request: &mut SubmitResponseRequest) {
    clean(&mut request.proposal);
    clean_opt(&mut request.timeline);
    clean_opt(&mut request.experience);
}

/// Reject attachment links that point at loopback, private or metadata hosts.
pub fn check_attachments(attachments: &[AttachmentInput]) -> ApiResult<()> {
    for attachment in attachments {
        validate_attachment_url(attachment.url.trim()).map_err(ApiError::validation)?;
    }
    Ok(())
}

/// Validate a user-supplied link: http/https only, public host only.
pub fn validate_attachment_url(raw: &str) -> Result<(), String> {
    if raw.len() > MAX_URL_LENGTH {
        return Err(format!("URL exceeds maximum length of {} characters", MAX_URL_LENGTH));
    }

    let url = Url::parse(raw).map_err(|e| format!("Invalid URL format: {}", e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "Invalid protocol '{}'. Only HTTP and HTTPS are allowed.",
            url.scheme()
        ));
    }

    match url.host() {
        None => Err("URL has no host".to_string()),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            if BLOCKED_HOSTS.contains(&domain.as_str()) || domain.ends_with(".internal") {
                Err(format!("Host '{}' is not allowed", domain))
            } else {
                Ok(())
            }
        }
        Some(Host::Ipv4(ip)) => check_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => check_ip(IpAddr::V6(ip)),
    }
}

fn check_ip(ip: IpAddr) -> Result<(), String> {
    let internal = match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // unique local fc00::/7 and link local fe80::/10
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    };
    if internal {
        Err(format!("Address '{}' is not allowed", ip))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_urls_allowed() {
        assert!(validate_attachment_url("https://files.example.com/scope.pdf").is_ok());
        assert!(validate_attachment_url("http://93.184.216.34/doc").is_ok());
    }

    #[test]
    fn test_internal_hosts_blocked() {
        for url in [
            "http://127.0.0.1/a",
            "http://localhost/a",
            "http://10.1.2.3/a",
            "http://192.168.1.1/a",
            "http://169.254.169.254/latest/meta-data/",
            "http://metadata.google.internal/computeMetadata",
            "http://[::1]/a",
            "http://[fd00::1]/a",
        ] {
            assert!(validate_attachment_url(url).is_err(), "{} should be blocked", url);
        }
    }

    #[test]
    fn test_invalid_protocols() {
        assert!(validate_attachment_url("ftp://example.com/file").is_err());
        assert!(validate_attachment_url("javascript:alert(1)").is_err());
        assert!(validate_attachment_url(&format!("https://example.com/{}", "a".repeat(3000))).is_err());
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("a\u{0000}b\nc\td\u{001b}", 100), "ab\nc\td");
        assert_eq!(sanitize_text("abcdef", 3), "abc");
        assert_eq!(sanitize_search("  roof\nrepair \u{0007}"), "roofrepair");
    }

    #[test]
    fn test_check_attachments_maps_to_validation() {
        let attachments = vec![AttachmentInput {
            name: "creds".to_string(),
            url: "http://127.0.0.1:8080/secret".to_string(),
        }];
        let err = check_attachments(&attachments).unwrap_err();
        assert_eq!(err.code(), "validation_failed");
    }
}
