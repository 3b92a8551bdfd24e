use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::Method;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_REFERER: &str = "https://saweria.co/";
pub const DEFAULT_ORIGIN: &str = "https://saweria.co";

pub const CUSTOM_REFERER: &str = "x-custom-referer";
pub const CUSTOM_ORIGIN: &str = "x-custom-origin";

/// Headers every outbound call carries so the provider sees a browser.
fn browser_identity() -> [(HeaderName, HeaderValue); 6] {
    [
        (header::USER_AGENT, HeaderValue::from_static(USER_AGENT)),
        (
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        ),
        (
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        ),
        (header::DNT, HeaderValue::from_static("1")),
        (header::CONNECTION, HeaderValue::from_static("keep-alive")),
        (
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        ),
    ]
}

/// Overlays the browser identity on top of the caller's headers.
///
/// Caller values survive unless they collide with the identity set.
/// GET asks for `identity` encoding, since compressed status responses
/// have failed to decode in the past.
pub fn apply_browser_headers(incoming: &HeaderMap, method: &Method) -> HeaderMap {
    let mut headers = incoming.clone();

    for (name, value) in browser_identity() {
        headers.insert(name, value);
    }

    let encoding = if *method == Method::GET {
        "identity"
    } else {
        "gzip, deflate, br"
    };
    headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static(encoding));

    headers
}

/// Referer/Origin pair for an outbound call, honouring the
/// `X-Custom-Referer` / `X-Custom-Origin` overrides on the inbound request.
pub fn referer_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let referer = inbound
        .get(CUSTOM_REFERER)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_REFERER));
    let origin = inbound
        .get(CUSTOM_ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ORIGIN));

    headers.insert(header::REFERER, referer);
    headers.insert(header::ORIGIN, origin);
    headers
}
