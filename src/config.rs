use std::env;

use crate::models::FeeSchedule;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub fees: FeeSchedule,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        // Flat marketplace fees in cents, charged on every order regardless of restaurant.
        let delivery_fee = env::var("DELIVERY_FEE_CENTS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(299);
        let service_fee = env::var("SERVICE_FEE_CENTS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(150);
        Ok(Self {
            database_url,
            host,
            port,
            fees: FeeSchedule {
                delivery_fee,
                service_fee,
            },
        })
    }
}
