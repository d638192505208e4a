/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the
/// orchestrator token, which stays empty until configured. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// SQLite database URL (default: `sqlite:retire.db`).
    pub database_url: String,
    /// Base URL of the automation orchestrator.
    pub aap_url: String,
    /// Bearer token for the orchestrator API. Empty means unconfigured;
    /// launches and monitoring will fail upstream until it is set.
    pub aap_token: String,
    /// Job template launched for every batch submission.
    pub aap_template_id: String,
    /// Operator credentials for HTTP Basic auth.
    pub auth_username: String,
    pub auth_password: String,
    /// DNS override defaults applied when a submission omits them.
    pub dns_server_default: String,
    pub dns_zone_default: String,
    /// Background poller cadence in seconds (default: `30`).
    pub poll_interval_secs: u64,
    /// How far back the poller looks for non-terminal jobs, in hours
    /// (default: `48`).
    pub poll_window_hours: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `HOST`                 | `0.0.0.0`                |
    /// | `PORT`                 | `8080`                   |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                     |
    /// | `DATABASE_URL`         | `sqlite:retire.db`       |
    /// | `AAP_URL`              | `https://localhost`      |
    /// | `AAP_TOKEN`            | (empty)                  |
    /// | `AAP_TEMPLATE_ID`      | `66`                     |
    /// | `AUTH_USERNAME`        | `admin`                  |
    /// | `AUTH_PASSWORD`        | `password`               |
    /// | `DNS_SERVER_DEFAULT`   | `dns1.example.internal`  |
    /// | `DNS_ZONE_DEFAULT`     | `example.internal`       |
    /// | `POLL_INTERVAL_SECS`   | `30`                     |
    /// | `POLL_WINDOW_HOURS`    | `48`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:retire.db".into());

        let aap_url = std::env::var("AAP_URL").unwrap_or_else(|_| "https://localhost".into());
        let aap_token = std::env::var("AAP_TOKEN").unwrap_or_default();
        let aap_template_id = std::env::var("AAP_TEMPLATE_ID").unwrap_or_else(|_| "66".into());

        let auth_username = std::env::var("AUTH_USERNAME").unwrap_or_else(|_| "admin".into());
        let auth_password = std::env::var("AUTH_PASSWORD").unwrap_or_else(|_| "password".into());

        let dns_server_default = std::env::var("DNS_SERVER_DEFAULT")
            .unwrap_or_else(|_| "dns1.example.internal".into());
        let dns_zone_default =
            std::env::var("DNS_ZONE_DEFAULT").unwrap_or_else(|_| "example.internal".into());

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let poll_window_hours: i64 = std::env::var("POLL_WINDOW_HOURS")
            .unwrap_or_else(|_| "48".into())
            .parse()
            .expect("POLL_WINDOW_HOURS must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            aap_url,
            aap_token,
            aap_template_id,
            auth_username,
            auth_password,
            dns_server_default,
            dns_zone_default,
            poll_interval_secs,
            poll_window_hours,
        }
    }
}
