#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    /// Length of the access window granted when a referral code is
    /// redeemed, independent of the code's own validity.
    pub referral_access_days: i64,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");

        // Optional services and tunables (with defaults)
        let redis_url = std::env::var("REDIS_URL").ok();
        let referral_access_days = std::env::var("REFERRAL_ACCESS_DAYS")
            .unwrap_or_else(|_| "30".to_string());

        Config {
            database_url,
            redis_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap(),
            port: 8000,
            referral_access_days: referral_access_days.parse::<i64>().unwrap_or(30),
        }
    }
}
