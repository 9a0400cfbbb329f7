use std::net::{Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use url::{Host, Url};

#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Not a valid catalog URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Anything other than http or https.
    #[error("Catalog URLs must use http or https, not {0}")]
    UnsupportedScheme(String),
    /// Private, link-local or unspecified address while private hosts are disallowed.
    #[error("Catalog host {0} is on a private network")]
    PrivateIp(String),
    #[error("Catalog host is localhost")]
    Localhost,
}

/// Checks a user-supplied catalog URL before the first request.
///
/// Only `http` and `https` are accepted. Unless `allow_private` is set,
/// loopback hosts and private, link-local or unspecified addresses are
/// refused as well. Self-hosted OPDS servers usually sit on a LAN, so callers
/// normally pass the configured `allow_private_hosts`.
///
/// # Errors
///
/// - [`UrlValidationError::InvalidUrl`] - The URL cannot be parsed
/// - [`UrlValidationError::UnsupportedScheme`] - Not `http` or `https`
/// - [`UrlValidationError::Localhost`] / [`UrlValidationError::PrivateIp`] -
///   Non-public host while `allow_private` is false
pub fn validate_url(url_str: &str, allow_private: bool) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlValidationError::UnsupportedScheme(url.scheme().to_string()));
    }

    if !allow_private {
        check_public_host(url.host())?;
    }
    Ok(url)
}

fn check_public_host(host: Option<Host<&str>>) -> Result<(), UrlValidationError> {
    match host {
        Some(Host::Domain(name)) if name.eq_ignore_ascii_case("localhost") => {
            Err(UrlValidationError::Localhost)
        }
        Some(Host::Ipv4(ip)) if ip.is_loopback() => Err(UrlValidationError::Localhost),
        Some(Host::Ipv6(ip)) if ip.is_loopback() => Err(UrlValidationError::Localhost),
        Some(Host::Ipv4(ip)) if is_private_v4(ip) => {
            Err(UrlValidationError::PrivateIp(ip.to_string()))
        }
        Some(Host::Ipv6(ip)) if is_private_v6(ip) => {
            Err(UrlValidationError::PrivateIp(ip.to_string()))
        }
        _ => Ok(()),
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    // fc00::/7 unique local, fe80::/10 link-local
    ip.is_unspecified() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_catalogs_accepted() {
        assert!(validate_url("https://standardebooks.org/feeds/opds", false).is_ok());
        assert!(validate_url("http://m.gutenberg.org/ebooks.opds/", false).is_ok());
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let url = validate_url("  https://example.com/opds \n", false).unwrap();
        assert_eq!(url.as_str(), "https://example.com/opds");
    }

    #[test]
    fn test_non_http_schemes_rejected_even_when_private_allowed() {
        assert!(matches!(
            validate_url("file:///etc/passwd", true),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_url("ftp://example.com/opds", true).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            validate_url("not a url", true),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_local_hosts_rejected_when_not_allowed() {
        assert!(matches!(
            validate_url("http://localhost:8080/opds", false),
            Err(UrlValidationError::Localhost)
        ));
        assert!(matches!(
            validate_url("http://[::1]/opds", false),
            Err(UrlValidationError::Localhost)
        ));
        assert!(validate_url("http://127.0.0.1/opds", false).is_err());
        assert!(matches!(
            validate_url("http://192.168.1.20:8080/opds", false),
            Err(UrlValidationError::PrivateIp(ip)) if ip == "192.168.1.20"
        ));
        assert!(validate_url("http://10.0.0.1/opds", false).is_err());
        assert!(validate_url("http://169.254.1.1/opds", false).is_err());
        assert!(validate_url("http://[fe80::1]/opds", false).is_err());
        assert!(validate_url("http://[fd12::1]/opds", false).is_err());
        assert!(validate_url("http://0.0.0.0/opds", false).is_err());
    }

    #[test]
    fn test_local_hosts_accepted_when_allowed() {
        // Typical home-server setup
        assert!(validate_url("http://192.168.1.20:8080/opds", true).is_ok());
        assert!(validate_url("http://localhost:8083/opds", true).is_ok());
    }
}
