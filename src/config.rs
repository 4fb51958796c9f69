use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenAiConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub genai: GenAiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "fitlife".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "fitlife-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let genai = GenAiConfig {
            api_key: std::env::var("GENAI_API_KEY")?,
            endpoint: std::env::var("GENAI_ENDPOINT").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta/models".into()
            }),
            model: std::env::var("GENAI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into()),
            timeout_seconds: std::env::var("GENAI_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            temperature: std::env::var("GENAI_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(0.7),
            max_tokens: std::env::var("GENAI_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(1024),
        };
        Ok(Self {
            database_url,
            jwt,
            genai,
        })
    }
}
