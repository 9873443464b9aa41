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
pub struct RecipeApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub results: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub sender_email: String,
    pub sender_name: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub recipes: RecipeApiConfig,
    pub email: EmailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "pantry".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "pantry-users".into()),
            ttl_minutes: parsed_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: parsed_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let recipes = RecipeApiConfig {
            base_url: std::env::var("RECIPE_API_URL")
                .unwrap_or_else(|_| "https://api.spoonacular.com".into()),
            api_key: std::env::var("RECIPE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            timeout_secs: parsed_or("RECIPE_API_TIMEOUT_SECS", 10),
            results: parsed_or("RECIPE_API_RESULTS", 10),
        };
        if recipes.api_key.is_none() {
            tracing::warn!("RECIPE_API_KEY not set; recipe suggestions are disabled");
        }
        let email = EmailConfig {
            api_url: std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.brevo.com/v3".into()),
            api_key: std::env::var("EMAIL_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            sender_email: std::env::var("EMAIL_SENDER")
                .unwrap_or_else(|_| "no-reply@pantry.local".into()),
            sender_name: std::env::var("EMAIL_SENDER_NAME")
                .unwrap_or_else(|_| "Pantry Security".into()),
            timeout_secs: parsed_or("EMAIL_TIMEOUT_SECS", 10),
        };
        if email.api_key.is_none() {
            tracing::warn!("EMAIL_API_KEY not set; password reset emails are disabled");
        }
        Ok(Self {
            database_url,
            jwt,
            recipes,
            email,
        })
    }
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
