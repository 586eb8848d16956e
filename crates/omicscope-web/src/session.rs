//! Session cookie handling.

use axum::http::{header, HeaderValue};
use axum_extra::headers::Cookie;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "omicscope_session";

/// Session id carried by the request, if it is well formed.
pub fn session_id_from(cookie: Option<&Cookie>) -> Option<Uuid> {
    cookie?.get(SESSION_COOKIE)?.parse().ok()
}

pub fn set_session_cookie(id: Uuid) -> (header::HeaderName, HeaderValue) {
    let value = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    // a UUID and fixed attributes are always visible ASCII
    (header::SET_COOKIE, HeaderValue::from_str(&value).unwrap_or(HeaderValue::from_static("")))
}

pub fn clear_session_cookie() -> (header::HeaderName, HeaderValue) {
    (
        header::SET_COOKIE,
        HeaderValue::from_static("omicscope_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderMap;
    use axum_extra::headers::HeaderMapExt;

    use super::*;

    fn cookie(raw: &str) -> Option<Cookie> {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(raw).unwrap());
        headers.typed_get::<Cookie>()
    }

    #[test]
    fn test_session_id_from_cookie() {
        let id = Uuid::new_v4();
        let c = cookie(&format!("theme=dark; {SESSION_COOKIE}={id}"));
        assert_eq!(session_id_from(c.as_ref()), Some(id));
    }

    #[test]
    fn test_malformed_or_missing_cookie() {
        assert_eq!(session_id_from(None), None);
        let c = cookie(&format!("{SESSION_COOKIE}=not-a-uuid"));
        assert_eq!(session_id_from(c.as_ref()), None);
    }

    #[test]
    fn test_set_cookie_value() {
        let id = Uuid::nil();
        let (name, value) = set_session_cookie(id);
        assert_eq!(name, header::SET_COOKIE);
        assert_eq!(
            value.to_str().unwrap(),
            "omicscope_session=00000000-0000-0000-0000-000000000000; Path=/; HttpOnly; SameSite=Lax"
        );
    }
}
