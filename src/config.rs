use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cookie_secure: bool,
    pub upload_dir: PathBuf,
    pub public_upload_base: String,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 10);
        let jwt_ttl_hours = parse_or("JWT_TTL_HOURS", 24);
        let cookie_secure = parse_or("COOKIE_SECURE", false);
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));
        let public_upload_base =
            env::var("PUBLIC_UPLOAD_BASE").unwrap_or_else(|_| "/uploads".to_string());
        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty());

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            jwt_secret,
            jwt_ttl_hours,
            cookie_secure,
            upload_dir,
            public_upload_base,
            cors_origin,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::parse_or;

    #[test]
    fn parse_or_falls_back_on_missing_or_garbage() {
        assert_eq!(parse_or::<u16>("PHARMACY_TEST_UNSET_PORT", 3000), 3000);

        // SAFETY: the key is unique to this test.
        unsafe { std::env::set_var("PHARMACY_TEST_BAD_PORT", "not-a-port") };
        assert_eq!(parse_or::<u16>("PHARMACY_TEST_BAD_PORT", 8080), 8080);

        unsafe { std::env::set_var("PHARMACY_TEST_GOOD_PORT", " 9090 ") };
        assert_eq!(parse_or::<u16>("PHARMACY_TEST_GOOD_PORT", 8080), 9090);
    }
}
