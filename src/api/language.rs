// Language switching: remembers the choice in a cookie and sends the user back.

use axum::{
    extract::Path,
    http::{header::REFERER, HeaderMap},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;

use super::ApiError;
use crate::locale::{locale_cookie, Locale};

pub(super) async fn switch(
    Path(locale): Path<String>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let locale: Locale = locale
        .parse()
        .map_err(|e: crate::locale::UnsupportedLocale| ApiError::BadRequest(e.to_string()))?;

    let back = headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("/")
        .to_string();

    tracing::debug!(%locale, "Language switched");
    Ok((jar.add(locale_cookie(locale)), Redirect::to(&back)))
}
