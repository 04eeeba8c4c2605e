use std::env;

/// Number of news items shown on the home feed when `NEWS_COUNT_ON_HOME_PAGE` is unset.
pub const DEFAULT_NEWS_COUNT_ON_HOME_PAGE: usize = 10;

/// Lifetime of an issued session token when `SESSION_TTL_SECONDS` is unset (one day).
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 86_400;

/// Route that anonymous viewers are sent to before reaching a private page.
pub const LOGIN_URL: &str = "/auth/login/";

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// AppConfig
///
/// Holds the application's configuration. Loaded once at startup and shared
/// read-only through `AppState`; handlers pull it in via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` selects the in-memory repository (local only).
    pub db_url: Option<String>,
    // Runtime environment marker. Controls the `x-user-id` development bypass and log format.
    pub env: Env,
    // HS256 secret used to sign and validate session tokens.
    pub jwt_secret: String,
    // Page size of the news home feed.
    pub news_count_on_home_page: usize,
    // Seconds until an issued session token expires.
    pub session_ttl_seconds: u64,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Runtime context. `Local` enables development conveniences, `Production` disables them.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for test state setup. Uses the in-memory repository.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            news_count_on_home_page: DEFAULT_NEWS_COUNT_ON_HOME_PAGE,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production if `DATABASE_URL` or `JWT_SECRET` is missing, and in any
    /// environment if a numeric variable does not parse. The server must not start
    /// half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod")),
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        Self {
            env,
            db_url,
            jwt_secret,
            news_count_on_home_page: parse_var(
                "NEWS_COUNT_ON_HOME_PAGE",
                DEFAULT_NEWS_COUNT_ON_HOME_PAGE,
            ),
            session_ttl_seconds: parse_var("SESSION_TTL_SECONDS", DEFAULT_SESSION_TTL_SECONDS),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {name} must be a non-negative integer, got {raw:?}")),
        Err(_) => default,
    }
}
