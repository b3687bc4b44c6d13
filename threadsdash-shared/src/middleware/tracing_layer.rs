use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// JSON when `THREADSDASH_ENV=production` or `THREADSDASH_LOG_FORMAT=json`.
    pub fn from_env() -> Self {
        let env = std::env::var("THREADSDASH_ENV").ok();
        let format = std::env::var("THREADSDASH_LOG_FORMAT").ok();
        Self::resolve(env.as_deref(), format.as_deref())
    }

    fn resolve(env: Option<&str>, format: Option<&str>) -> Self {
        match (format, env) {
            (Some("json"), _) => Self::Json,
            (Some("pretty"), _) => Self::Pretty,
            (_, Some("production")) => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Filter used when `RUST_LOG` is unset: the service and the shared crate at
/// debug, SQL noise from diesel at warn.
pub fn default_directives(service_name: &str) -> String {
    let crate_target = service_name.replace('-', "_");
    format!("info,{crate_target}=debug,threadsdash_shared=debug,tower_http=debug,diesel=warn")
}

pub fn init_tracing(service_name: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));
    let format = LogFormat::from_env();

    match format {
        LogFormat::Json => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
        }
    }

    tracing::info!(service = service_name, ?format, "tracing initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_target_uses_crate_name() {
        let directives = default_directives("threadsdash-queue");
        assert!(directives.contains("threadsdash_queue=debug"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn explicit_format_beats_environment() {
        assert_eq!(LogFormat::resolve(Some("production"), None), LogFormat::Json);
        assert_eq!(LogFormat::resolve(Some("production"), Some("pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::resolve(None, Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::resolve(Some("development"), None), LogFormat::Pretty);
    }
}
