//! Target application detection.
//!
//! The base address is derived fresh from the current page location on
//! every delivery attempt, never cached, since the host page can navigate
//! out from under the extension.

use url::Url;

use flowcourier_core::config::TargetConfig;

/// The detected target application address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetContext {
    /// Base URL of the target instance, no trailing slash.
    pub base_url: String,
}

/// Derives the target application's base address from a page URL.
///
/// Detection rules, in order:
/// 1. A host under a managed-cloud suffix: the base is the URL with
///    everything from `/workflow` or `/home` onward stripped.
/// 2. `localhost`, `127.0.0.1`, or a bare IPv4 literal (a self-hosted
///    instance): the base is `scheme://host[:port]`.
/// 3. Anything else: no target is reachable from this page.
#[derive(Debug, Clone)]
pub struct TargetDetector {
    cloud_suffixes: Vec<String>,
}

impl TargetDetector {
    /// Create a detector recognizing the given managed-cloud suffixes.
    pub fn new(cloud_suffixes: Vec<String>) -> Self {
        Self { cloud_suffixes }
    }

    /// Create a detector from the target section of the configuration.
    pub fn from_config(config: &TargetConfig) -> Self {
        Self::new(config.cloud_suffixes.clone())
    }

    /// Detect the target base address, if any.
    pub fn detect(&self, current_url: &str) -> Option<TargetContext> {
        let url = Url::parse(current_url).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str()?;

        let mut origin = format!("{}://{}", url.scheme(), host);
        if let Some(port) = url.port() {
            origin.push_str(&format!(":{port}"));
        }

        if self
            .cloud_suffixes
            .iter()
            .any(|suffix| host.ends_with(suffix.as_str()))
        {
            let path = url.path();
            let cut = ["/workflow", "/home"]
                .iter()
                .filter_map(|marker| path.find(marker))
                .min()
                .unwrap_or(path.len());

            let prefix = path[..cut].trim_end_matches('/');
            return Some(TargetContext {
                base_url: format!("{origin}{prefix}"),
            });
        }

        let is_loopback = host == "localhost" || host == "127.0.0.1";
        let is_bare_ipv4 = host.parse::<std::net::Ipv4Addr>().is_ok();
        if is_loopback || is_bare_ipv4 {
            return Some(TargetContext { base_url: origin });
        }

        None
    }
}
