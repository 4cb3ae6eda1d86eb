//! Product, version and platform detection from browser User-Agent strings

use crate::models::Product;
use once_cell::sync::Lazy;
use regex::Regex;

static UA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^Mozilla/5\.0 \((?P<platform>[^)]+)\).* (?P<browser>Firefox|Fennec)/(?P<version>\d+\.\d+(?:\.\d+)*(?:(?:a|b|rc)\d+)?(?:pre)?)",
    )
    .expect("user agent pattern is valid")
});

/// Fields derived from a user agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub product: Product,
    pub version: String,
    pub os: String,
}

/// Parse a User-Agent header. Returns `None` for browsers we do not collect
/// feedback from.
pub fn parse_user_agent(user_agent: &str) -> Option<UserAgentInfo> {
    let captures = UA_PATTERN.captures(user_agent.trim())?;

    let product = match &captures["browser"] {
        "Fennec" => Product::Mobile,
        _ => Product::Firefox,
    };

    Some(UserAgentInfo {
        product,
        version: captures["version"].to_string(),
        os: detect_os(&captures["platform"]).to_string(),
    })
}

fn detect_os(platform: &str) -> &'static str {
    // Order matters: Android and Maemo platforms also mention Linux.
    const PLATFORMS: &[(&str, &str)] = &[
        ("Android", "android"),
        ("Maemo", "maemo"),
        ("Windows", "win"),
        ("Mac OS X", "mac"),
        ("Macintosh", "mac"),
        ("Linux", "linux"),
        ("X11", "linux"),
    ];

    PLATFORMS
        .iter()
        .find(|(needle, _)| platform.contains(needle))
        .map(|(_, os)| *os)
        .unwrap_or("other")
}
