use std::env;

use crate::auth::AuthSettings;

pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_client_id: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_issuer: env::var("JWT_ISSUER").expect("JWT_ISSUER must be set"),
            jwt_client_id: env::var("JWT_CLIENT_ID").expect("JWT_CLIENT_ID must be set"),
        }
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings::new(
            &self.jwt_secret,
            self.jwt_issuer.clone(),
            self.jwt_client_id.clone(),
        )
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
