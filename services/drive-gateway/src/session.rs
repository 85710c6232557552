//! Browser session cookie
//!
//! Each browser is identified by a random id in the `drive_session` cookie.
//! Requests without a well-formed cookie get a fresh id, and handlers attach
//! `set_cookie()` to their response so the browser keeps it.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, HeaderValue, SET_COOKIE};
use axum::http::request::Parts;
use axum::response::{IntoResponseParts, ResponseParts};

pub const SESSION_COOKIE: &str = "drive_session";

/// Session id extracted from (or minted for) the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// The request carried no usable cookie.
    pub is_new: bool,
}

impl Session {
    pub fn generate() -> Self {
        Self {
            id: uuid::Uuid::new_v4().as_simple().to_string(),
            is_new: true,
        }
    }

    /// Find the session cookie among `Cookie` header values.
    ///
    /// Values that don't look like an id this service minted are ignored.
    pub fn from_cookie_headers<'a>(headers: impl Iterator<Item = &'a HeaderValue>) -> Option<Self> {
        headers
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == SESSION_COOKIE && is_valid_id(value))
            .map(|(_, value)| Self {
                id: value.to_string(),
                is_new: false,
            })
    }

    /// `Set-Cookie` header value binding the browser to this session.
    pub fn set_cookie(&self) -> SetSessionCookie {
        SetSessionCookie(format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.id
        ))
    }
}

fn is_valid_id(value: &str) -> bool {
    value.len() == 32 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_cookie_headers(parts.headers.get_all(COOKIE).iter())
            .unwrap_or_else(Self::generate))
    }
}

/// Response part that sets the session cookie.
#[derive(Debug, Clone)]
pub struct SetSessionCookie(String);

impl IntoResponseParts for SetSessionCookie {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        // Ids are hex, so the value is always a valid header
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            res.headers_mut().append(SET_COOKIE, value);
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0123456789abcdef0123456789abcdef";

    fn parse(values: &[&str]) -> Option<Session> {
        let headers: Vec<HeaderValue> = values
            .iter()
            .map(|v| HeaderValue::from_str(v).unwrap())
            .collect();
        Session::from_cookie_headers(headers.iter())
    }

    #[test]
    fn generated_ids_are_unique_and_valid() {
        let a = Session::generate();
        let b = Session::generate();
        assert_ne!(a.id, b.id);
        assert!(is_valid_id(&a.id), "generated id must round-trip: {}", a.id);
        assert!(a.is_new);
    }

    #[test]
    fn finds_cookie_among_others() {
        let session = parse(&[&format!("theme=dark; {SESSION_COOKIE}={ID}; lang=en")]).unwrap();
        assert_eq!(session.id, ID);
        assert!(!session.is_new);
    }

    #[test]
    fn finds_cookie_in_second_header() {
        let session = parse(&["theme=dark", &format!("{SESSION_COOKIE}={ID}")]).unwrap();
        assert_eq!(session.id, ID);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(parse(&[&format!("{SESSION_COOKIE}=short")]).is_none());
        assert!(parse(&[&format!("{SESSION_COOKIE}={}", ID.to_uppercase())]).is_none());
        assert!(parse(&[&format!("{SESSION_COOKIE}=../../{}", &ID[6..])]).is_none());
        assert!(parse(&[&format!("other_session={ID}")]).is_none());
        assert!(parse(&[]).is_none());
    }

    #[test]
    fn set_cookie_is_http_only() {
        let session = Session {
            id: ID.into(),
            is_new: false,
        };
        let SetSessionCookie(value) = session.set_cookie();
        assert_eq!(
            value,
            format!("{SESSION_COOKIE}={ID}; Path=/; HttpOnly; SameSite=Lax")
        );
    }
}
