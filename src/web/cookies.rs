//! Cookie parsing, signing and formatting.
//!
//! The session cookie carries `<id>.<signature>`, where the signature is an
//! HMAC-SHA256 of the id under the session secret. A cookie whose signature
//! does not verify is treated as absent.

use axum::http::{header, HeaderMap};
use data_encoding::HEXLOWER_PERMISSIVE;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::session::{SessionId, SESSION_DURATION_MS};

type HmacSha256 = Hmac<Sha256>;

/// Name of the signed session cookie.
pub const SESSION_COOKIE: &str = "gate.sid";
/// Name of the display-only login timestamp cookie.
pub const LOGIN_TIME_COOKIE: &str = "loginTime";

const MAX_AGE_SECS: u64 = SESSION_DURATION_MS / 1000;

/// Value of the first cookie called `name`, across all `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Sign `id` for use as the session cookie value.
pub fn sign_session_id(id: &SessionId, secret: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(id.to_string().as_bytes());
    let signature = HEXLOWER_PERMISSIVE.encode(&mac.finalize().into_bytes());
    Some(format!("{id}.{signature}"))
}

/// Recover the session id from a signed cookie value.
pub fn verify_session_id(value: &str, secret: &[u8]) -> Option<SessionId> {
    let (id, signature) = value.split_once('.')?;
    let signature = HEXLOWER_PERMISSIVE.decode(signature.as_bytes()).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(id.as_bytes());
    mac.verify_slice(&signature).ok()?;

    id.parse().ok()
}

/// The verified session id carried by the request, if any.
pub fn session_id_from(headers: &HeaderMap, secret: &[u8]) -> Option<SessionId> {
    read_cookie(headers, SESSION_COOKIE).and_then(|value| verify_session_id(&value, secret))
}

/// `Set-Cookie` value establishing the session cookie.
pub fn session_cookie(signed: &str) -> String {
    format!("{SESSION_COOKIE}={signed}; Path=/; HttpOnly; SameSite=Lax; Max-Age={MAX_AGE_SECS}")
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// `Set-Cookie` value exposing the login time to page scripts.
///
/// Never read back by the server.
pub fn login_time_cookie(login_time: u64) -> String {
    format!("{LOGIN_TIME_COOKIE}={login_time}; Path=/; SameSite=Lax; Max-Age={MAX_AGE_SECS}")
}

/// `Set-Cookie` value removing the login time cookie.
pub fn clear_login_time_cookie() -> String {
    format!("{LOGIN_TIME_COOKIE}=; Path=/; SameSite=Lax; Max-Age=0")
}
