// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use crate::locale::Locale;

pub const DEFAULT_CLASH_API_URL: &str = "https://api.clashroyale.com/v1";

/// Settings for the Clash Royale API client.
#[derive(Debug, Clone)]
pub struct ClashApiConfig {
    /// Bearer token issued by the Clash Royale developer portal.
    pub api_key: Option<String>,
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    /// Upper bound for a single outbound request.
    pub timeout: Duration,
}

impl Default for ClashApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_CLASH_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to bind the HTTP server to.
    pub port: u16,
    pub clash_api: ClashApiConfig,
    /// Include raw error text in error responses.
    pub debug: bool,
    /// Locale used when the request expresses no preference.
    pub default_locale: Locale,
    /// Locale used when the request asks for an unsupported one.
    pub fallback_locale: Locale,
    /// Directory containing pre-built frontend files to serve.
    /// When set, the backend serves static files from this path.
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            clash_api: ClashApiConfig::default(),
            debug: false,
            default_locale: Locale::Ja,
            fallback_locale: Locale::En,
            static_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// A `.env` file in the working directory is read first, if present.
    ///
    /// Environment variables:
    /// - `PORT` - HTTP server port (default: 8000)
    /// - `CLASH_ROYALE_API_KEY` - API token; player endpoints answer 503 without it
    /// - `CLASH_ROYALE_API_URL` - API base URL (default: `https://api.clashroyale.com/v1`)
    /// - `CLASH_ROYALE_TIMEOUT_SECS` - outbound request timeout (default: 10)
    /// - `APP_DEBUG` - Set to `true` to expose raw error details in responses
    /// - `APP_LOCALE` - default locale, `ja` or `en` (default: `ja`)
    /// - `APP_FALLBACK_LOCALE` - locale for unsupported requests (default: `en`)
    /// - `STATIC_DIR` - Path to frontend dist directory for static file serving
    ///
    /// CLI flags:
    /// - `--debug` - Same as `APP_DEBUG=true`
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Build a configuration from CLI arguments and a variable lookup.
    pub fn from_sources<F>(args: &[String], var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| var("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(defaults.port);

        let api_key = var("CLASH_ROYALE_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let base_url = var("CLASH_ROYALE_API_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.clash_api.base_url);

        let timeout = var("CLASH_ROYALE_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.clash_api.timeout);

        let debug = args.iter().any(|a| a == "--debug")
            || var("APP_DEBUG")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false);

        let default_locale = var("APP_LOCALE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_locale);

        let fallback_locale = var("APP_FALLBACK_LOCALE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.fallback_locale);

        let static_dir = var("STATIC_DIR").map(PathBuf::from);

        Config {
            port,
            clash_api: ClashApiConfig {
                api_key,
                base_url,
                timeout,
            },
            debug,
            default_locale,
            fallback_locale,
            static_dir,
        }
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
