// Request locale resolution and localized user-facing messages.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use axum::{
    extract::{Query, Request, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap},
    middleware::Next,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

/// Name of the query parameter and cookie carrying the language choice.
pub const LOCALE_KEY: &str = "locale";

/// Languages the application is translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Ja,
    En,
}

impl Locale {
    pub const SUPPORTED: [Locale; 2] = [Locale::Ja, Locale::En];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Ja => "ja",
            Locale::En => "en",
        }
    }

    /// Translate a message key into this language.
    pub fn text(&self, message: Message) -> &'static str {
        match (self, message) {
            (Locale::Ja, Message::ApiKeyMissing) => {
                "Clash Royale APIキーが設定されていません。管理者に連絡してください。"
            }
            (Locale::En, Message::ApiKeyMissing) => {
                "The Clash Royale API key is not configured. Please contact the administrator."
            }
            (Locale::Ja, Message::PlayerNotFound) => {
                "プレイヤーが見つかりませんでした。プレイヤータグを確認してください。"
            }
            (Locale::En, Message::PlayerNotFound) => {
                "Player not found. Please check the player tag."
            }
            (Locale::Ja, Message::ApiKeyInvalid) => "Clash Royale APIキーが無効です。",
            (Locale::En, Message::ApiKeyInvalid) => "The Clash Royale API key is invalid.",
            (Locale::Ja, Message::AccessDenied) => {
                "Clash Royale APIへのアクセスが拒否されました。"
            }
            (Locale::En, Message::AccessDenied) => "Access to the Clash Royale API was denied.",
            (Locale::Ja, Message::UpstreamFailed) => {
                "Clash Royale APIからデータを取得できませんでした。"
            }
            (Locale::En, Message::UpstreamFailed) => {
                "Failed to retrieve data from the Clash Royale API."
            }
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedLocale(pub String);

impl fmt::Display for UnsupportedLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid locale: {}", self.0)
    }
}

impl std::error::Error for UnsupportedLocale {}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ja" => Ok(Locale::Ja),
            "en" => Ok(Locale::En),
            other => Err(UnsupportedLocale(other.to_string())),
        }
    }
}

/// Keys for the localized strings shown to API users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    ApiKeyMissing,
    PlayerNotFound,
    ApiKeyInvalid,
    AccessDenied,
    UpstreamFailed,
}

/// Locale defaults taken from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct LocaleSettings {
    pub default_locale: Locale,
    pub fallback_locale: Locale,
}

impl LocaleSettings {
    /// Pick the locale for a request.
    ///
    /// An explicit choice (query parameter, then cookie) wins even when it is
    /// unsupported, in which case the fallback locale applies. Without one the
    /// `Accept-Language` header is consulted, then the default locale.
    pub fn resolve(
        &self,
        query: Option<&str>,
        cookie: Option<&str>,
        headers: &HeaderMap,
    ) -> Locale {
        if let Some(explicit) = query.or(cookie) {
            return explicit.parse().unwrap_or(self.fallback_locale);
        }
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(preferred_language)
            .unwrap_or(self.default_locale)
    }
}

/// Choose the supported language with the highest quality value from an
/// `Accept-Language` header. Equal weights keep header order.
pub fn preferred_language(header: &str) -> Option<Locale> {
    let mut best: Option<(Locale, f32)> = None;
    for item in header.split(',') {
        let mut parts = item.split(';');
        let tag = parts.next().unwrap_or("").trim();
        let primary = tag.split('-').next().unwrap_or("");
        let Ok(locale) = primary.parse::<Locale>() else {
            continue;
        };
        let quality = parts
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);
        if quality <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, q)| quality > q) {
            best = Some((locale, quality));
        }
    }
    best.map(|(locale, _)| locale)
}

/// Middleware: resolve the request locale and make it available to handlers
/// as an `Extension<Locale>`. A `?locale=` choice is remembered in a cookie.
pub async fn resolve_locale(
    State(settings): State<LocaleSettings>,
    Query(params): Query<HashMap<String, String>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> impl IntoResponse {
    let query = params.get(LOCALE_KEY).map(String::as_str);
    let cookie = jar.get(LOCALE_KEY).map(|c| c.value().to_string());
    let locale = settings.resolve(query, cookie.as_deref(), req.headers());

    req.extensions_mut().insert(locale);
    let response = next.run(req).await;

    let jar = if query.is_some() {
        jar.add(locale_cookie(locale))
    } else {
        jar
    };
    (jar, response)
}

/// Cookie remembering the language choice across requests.
pub fn locale_cookie(locale: Locale) -> Cookie<'static> {
    Cookie::build((LOCALE_KEY, locale.as_str()))
        .path("/")
        .http_only(true)
        .build()
}
