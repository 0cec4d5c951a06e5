//! Configuration for the MindMate gateway
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// MindMate Gateway - HTTP facade over hosted table, auth, and inference services
#[derive(Parser, Debug, Clone)]
#[command(name = "mindmate-gateway")]
#[command(about = "HTTP gateway for the MindMate mental wellness platform")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Base URL of the hosted backend (table API under /rest/v1, auth under /auth/v1)
    #[arg(long, env = "SUPABASE_URL", default_value = "http://localhost:54321")]
    pub supabase_url: String,

    /// Service key used for both table and auth requests
    #[arg(long, env = "SUPABASE_SERVICE_KEY")]
    pub supabase_service_key: Option<String>,

    /// Base URL of the generative-language service
    #[arg(
        long,
        env = "GEMINI_API_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub gemini_api_url: String,

    /// API key for the generative-language service
    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    /// Model used for all inference kinds
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,

    /// Comma-separated list of origins allowed for cross-origin requests
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = "http://localhost:3000")]
    pub allowed_origins: String,

    /// Enable development mode (allows missing service credentials)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Timeout for calls to external collaborators, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,
}

impl Args {
    /// Effective service key (falls back to a placeholder in dev mode)
    pub fn service_key(&self) -> Result<String, String> {
        match self.supabase_service_key {
            Some(ref key) => Ok(key.clone()),
            None if self.dev_mode => Ok("dev-only-insecure-key".to_string()),
            None => Err("SUPABASE_SERVICE_KEY is required in production mode".to_string()),
        }
    }

    /// Effective inference API key (empty in dev mode when unset)
    pub fn inference_key(&self) -> Result<String, String> {
        match self.gemini_api_key {
            Some(ref key) => Ok(key.clone()),
            None if self.dev_mode => Ok(String::new()),
            None => Err("GEMINI_API_KEY is required in production mode".to_string()),
        }
    }

    /// Parsed CORS allow-list
    pub fn allowed_origin_list(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.supabase_service_key.is_none() {
                return Err("SUPABASE_SERVICE_KEY is required in production mode".to_string());
            }
            if self.gemini_api_key.is_none() {
                return Err("GEMINI_API_KEY is required in production mode".to_string());
            }
        }

        if self.allowed_origin_list().is_empty() {
            return Err("ALLOWED_ORIGINS must name at least one origin".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_args() -> Args {
        Args {
            node_id: Uuid::new_v4(),
            listen: "127.0.0.1:8000".parse().unwrap(),
            supabase_url: "http://localhost:54321".into(),
            supabase_service_key: None,
            gemini_api_url: "https://generativelanguage.googleapis.com".into(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".into(),
            allowed_origins: "http://localhost:3000".into(),
            dev_mode: true,
            log_level: "info".into(),
            request_timeout_ms: 30_000,
        }
    }

    #[test]
    fn test_origin_list_splits_and_trims() {
        let mut args = dev_args();
        args.allowed_origins = "http://localhost:3000, https://app.mindmate.example ,".into();
        assert_eq!(
            args.allowed_origin_list(),
            vec![
                "http://localhost:3000".to_string(),
                "https://app.mindmate.example".to_string()
            ]
        );
    }

    #[test]
    fn test_validate_requires_credentials_in_production() {
        let mut args = dev_args();
        args.dev_mode = false;
        assert!(args.validate().is_err());

        args.supabase_service_key = Some("service-key".into());
        args.gemini_api_key = Some("api-key".into());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_origin_list() {
        let mut args = dev_args();
        args.allowed_origins = " , ".into();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_dev_mode_key_fallbacks() {
        let args = dev_args();
        assert_eq!(args.service_key().unwrap(), "dev-only-insecure-key");
        assert_eq!(args.inference_key().unwrap(), "");
    }

    #[test]
    fn test_production_keys_error_instead_of_panicking() {
        let mut args = dev_args();
        args.dev_mode = false;
        assert!(args.service_key().is_err());
        assert!(args.inference_key().is_err());

        args.supabase_service_key = Some("service-key".into());
        args.gemini_api_key = Some("api-key".into());
        assert_eq!(args.service_key().unwrap(), "service-key");
        assert_eq!(args.inference_key().unwrap(), "api-key");
    }
}
