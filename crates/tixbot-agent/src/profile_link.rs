// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! VK profile link parsing.

use std::sync::LazyLock;

use regex::Regex;

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:www\.|m\.)?vk\.com/([A-Za-z0-9_.\-]*[A-Za-z0-9][A-Za-z0-9_.\-]*)/?(?:[?#].*)?$",
    )
    .expect("valid profile link pattern")
});

static HANDLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@?([A-Za-z0-9_.\-]*[A-Za-z0-9][A-Za-z0-9_.\-]*)$").expect("valid handle pattern")
});

/// Bare inputs ending in a common top-level domain are addresses, not handles.
static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(?:com|net|org|info|io|me|ru|su|by|ua|kz)$").expect("valid domain pattern")
});

/// Canonical `https://vk.com/<handle>` form of a link or bare handle.
///
/// Returns `None` when the input is neither.
pub fn canonical_profile_link(input: &str) -> Option<String> {
    let input = input.trim();
    let handle = match LINK.captures(input) {
        Some(link) => link.get(1)?.as_str(),
        None => {
            let handle = HANDLE.captures(input)?.get(1)?.as_str();
            if DOMAIN.is_match(handle) {
                return None;
            }
            handle
        }
    };
    Some(format!("https://vk.com/{handle}"))
}
