//! The `#/share/<token>` fragment protocol.

/// Fragment prefix marking a shared trip.
pub const SHARE_PREFIX: &str = "#/share/";

/// Identifiers longer than this are treated as snapshot blobs.
const MAX_IDENTIFIER_LEN: usize = 64;

/// Base64 of the zlib header every snapshot blob starts with.
const SNAPSHOT_SIGNATURE: &str = "eJ";

/// What a share fragment points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareToken {
    /// Id of a trip document held by the remote document service.
    Remote(String),
    /// A self-contained compressed trip (see [`crate::share::codec`]).
    Snapshot(String),
}

impl ShareToken {
    /// Classifies a raw token taken from a fragment.
    pub fn classify(token: &str) -> Self {
        if token.len() > MAX_IDENTIFIER_LEN || token.starts_with(SNAPSHOT_SIGNATURE) {
            ShareToken::Snapshot(token.to_string())
        } else {
            ShareToken::Remote(token.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ShareToken::Remote(token) | ShareToken::Snapshot(token) => token,
        }
    }
}

/// Extracts the share token from a fragment or a full URL.
///
/// The fragment (from the first `#`) must start with [`SHARE_PREFIX`].
/// Returns `None` when the input is not a share route.
pub fn parse_fragment(input: &str) -> Option<ShareToken> {
    let fragment = &input[input.find('#')?..];
    let raw = fragment
        .strip_prefix(SHARE_PREFIX)?
        .trim()
        .trim_end_matches('/');
    if raw.is_empty() {
        return None;
    }

    let token = urlencoding::decode(raw)
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(ShareToken::classify(&token))
}

/// Builds the fragment for a token.
pub fn share_fragment(token: &str) -> String {
    format!("{}{}", SHARE_PREFIX, urlencoding::encode(token))
}

/// Builds a full share URL from the app's base URL and a token.
pub fn share_url(base_url: &str, token: &str) -> String {
    let base = base_url.split('#').next().unwrap_or(base_url);
    format!("{}{}", base, share_fragment(token))
}
