use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in seconds.
    pub expiry_secs: i64,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Base URL prepended to object keys in stored media paths.
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub enum StorageBackendConfig {
    Local { upload_dir: String },
    S3(S3Config),
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins, or "*" for any.
    pub allowed_origins: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub storage: StorageBackendConfig,
    pub cors: CorsConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let app = AppConfig {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("invalid PORT: {e}")))?,
        };

        let database = DatabaseConfig {
            uri: env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            name: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "ripple".to_string()),
        };

        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET")
                .map_err(|_| AppError::Config("JWT_SECRET must be set".to_string()))?,
            expiry_secs: env::var("JWT_EXPIRY_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("invalid JWT_EXPIRY_SECS: {e}")))?,
        };

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .as_str()
        {
            "local" => StorageBackendConfig::Local {
                upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            },
            "s3" => StorageBackendConfig::S3(S3Config {
                bucket: env::var("S3_BUCKET")
                    .map_err(|_| AppError::Config("S3_BUCKET must be set".to_string()))?,
                region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.trim().is_empty()),
                access_key_id: env::var("AWS_ACCESS_KEY_ID").map_err(|_| {
                    AppError::Config("AWS_ACCESS_KEY_ID must be set".to_string())
                })?,
                secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").map_err(|_| {
                    AppError::Config("AWS_SECRET_ACCESS_KEY must be set".to_string())
                })?,
                public_base_url: env::var("S3_PUBLIC_BASE_URL")
                    .map_err(|_| AppError::Config("S3_PUBLIC_BASE_URL must be set".to_string()))?,
            }),
            other => {
                return Err(AppError::Config(format!(
                    "unsupported STORAGE_BACKEND: {other}"
                )))
            }
        };

        let cors = CorsConfig {
            allowed_origins: env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        };

        Ok(Config {
            app,
            database,
            jwt,
            storage,
            cors,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}
