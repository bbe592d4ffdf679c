// # dns01-webhook - cert-manager DNS-01 Webhook Daemon
//
// This is a thin integration layer. All challenge logic lives in dns01-core;
// this binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering solvers and the secret store
// 4. Serving the webhook API until SIGTERM/SIGINT
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `GROUP_NAME`: API group the webhook is served under (required)
// - `DNS01_LISTEN_ADDR`: Listen address (default `0.0.0.0:8080`)
// - `DNS01_TLS_CERT_FILE`: PEM certificate chain to serve HTTPS with
// - `DNS01_TLS_KEY_FILE`: PEM private key for the certificate
//   (set both for HTTPS, neither for plain HTTP)
// - `DNS01_SECRET_SOURCE`: Where credentials come from (`kube`, `file`)
// - `DNS01_SECRETS_DIR`: Root of mounted secrets (for `file`)
// - `LUADNS_API_URL`: LuaDNS API base URL
// - `LUADNS_EMAIL`: LuaDNS account email used for basic auth
// - `DNS01_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export GROUP_NAME=acme.example.com
// export DNS01_SECRET_SOURCE=file
// export DNS01_SECRETS_DIR=/etc/dns01/secrets
//
// dns01-webhook
// ```

mod payload;
mod server;

use anyhow::Result;
use dns01_core::{FileSecretStore, SecretStore, SolverRegistry};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebhookExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<WebhookExitCode> for ExitCode {
    fn from(code: WebhookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_LUADNS_API_URL: &str = "https://api.luadns.com/v1";

/// Application configuration
#[derive(Debug, Clone)]
struct Config {
    group_name: String,
    listen_addr: String,
    secret_source: String,
    secrets_dir: Option<String>,
    tls_cert_file: Option<String>,
    tls_key_file: Option<String>,
    luadns_api_url: String,
    luadns_email: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let group_name = lookup("GROUP_NAME").unwrap_or_default();
        if group_name.trim().is_empty() {
            anyhow::bail!(
                "GROUP_NAME must be specified. \
                Set it via: export GROUP_NAME=acme.example.com"
            );
        }

        Ok(Self {
            group_name,
            listen_addr: lookup("DNS01_LISTEN_ADDR")
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            secret_source: lookup("DNS01_SECRET_SOURCE").unwrap_or_else(|| "kube".to_string()),
            secrets_dir: lookup("DNS01_SECRETS_DIR"),
            tls_cert_file: lookup("DNS01_TLS_CERT_FILE").filter(|v| !v.is_empty()),
            tls_key_file: lookup("DNS01_TLS_KEY_FILE").filter(|v| !v.is_empty()),
            luadns_api_url: lookup("LUADNS_API_URL")
                .unwrap_or_else(|| DEFAULT_LUADNS_API_URL.to_string()),
            luadns_email: lookup("LUADNS_EMAIL").unwrap_or_default(),
            log_level: lookup("DNS01_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        self.tls()?;

        match self.secret_source.as_str() {
            "kube" => {}
            "file" => match self.secrets_dir.as_deref() {
                None | Some("") => anyhow::bail!(
                    "DNS01_SECRETS_DIR is required when DNS01_SECRET_SOURCE=file"
                ),
                Some(dir) if !std::path::Path::new(dir).is_dir() => {
                    anyhow::bail!("DNS01_SECRETS_DIR does not exist: {}", dir)
                }
                Some(_) => {}
            },
            other => anyhow::bail!(
                "DNS01_SECRET_SOURCE '{}' is not supported. \
                Supported sources: kube, file",
                other
            ),
        }

        if !self.luadns_api_url.starts_with("https://")
            && !self.luadns_api_url.starts_with("http://")
        {
            anyhow::bail!(
                "LUADNS_API_URL must use HTTP or HTTPS scheme. Got: {}",
                self.luadns_api_url
            );
        }

        self.log_level()?;
        Ok(())
    }

    fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().map_err(|e| {
            anyhow::anyhow!(
                "DNS01_LISTEN_ADDR '{}' is not a valid socket address: {}",
                self.listen_addr,
                e
            )
        })
    }

    /// TLS material to serve with, `None` for plain HTTP
    fn tls(&self) -> Result<Option<server::TlsFiles>> {
        match (self.tls_cert_file.as_deref(), self.tls_key_file.as_deref()) {
            (None, None) => Ok(None),
            (Some(cert), Some(key)) => {
                for (var, path) in [("DNS01_TLS_CERT_FILE", cert), ("DNS01_TLS_KEY_FILE", key)] {
                    if !std::path::Path::new(path).is_file() {
                        anyhow::bail!("{} does not exist: {}", var, path);
                    }
                }
                Ok(Some(server::TlsFiles {
                    cert_file: cert.into(),
                    key_file: key.into(),
                }))
            }
            _ => anyhow::bail!(
                "DNS01_TLS_CERT_FILE and DNS01_TLS_KEY_FILE must be set together"
            ),
        }
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DNS01_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return WebhookExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return WebhookExitCode::ConfigError.into();
    }

    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WebhookExitCode::ConfigError.into();
    }

    info!("Starting dns01-webhook for group {}", config.group_name);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WebhookExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Build the secret store selected by the configuration
fn build_secret_store(config: &Config) -> Result<Arc<dyn SecretStore>> {
    match config.secret_source.as_str() {
        "file" => {
            let store = FileSecretStore::new(config.secrets_dir.as_deref().unwrap_or_default());
            info!("Reading secrets from {}", store.root().display());
            Ok(Arc::new(store))
        }
        #[cfg(feature = "kube")]
        "kube" => {
            let store = dns01_secret_kube::KubeSecretStore::in_cluster()?;
            info!("Reading secrets from Kubernetes API at {}", store.api_server());
            Ok(Arc::new(store))
        }
        other => anyhow::bail!("Secret source {} is not available in this build", other),
    }
}

/// Register every solver compiled into this build
fn build_registry(config: &Config) -> Result<SolverRegistry> {
    let mut registry = SolverRegistry::new(config.group_name.clone())?;

    #[cfg(feature = "luadns")]
    {
        let factory = dns01_provider_luadns::LuaDnsFactory::new(
            config.luadns_api_url.clone(),
            config.luadns_email.clone(),
        )?;
        info!("Registering LuaDNS solver ({})", factory.base_url());
        dns01_provider_luadns::register(&mut registry, factory)?;
    }

    if registry.list_solvers().is_empty() {
        anyhow::bail!("No solvers are compiled into this build");
    }

    Ok(registry)
}

/// Run the daemon
async fn run_daemon(config: Config) -> WebhookExitCode {
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);

    // Signals are watched from the start so a SIGTERM during startup is not lost.
    // A handler that cannot be installed still stops the daemon, and the
    // outcome is collected afterwards to pick the exit code.
    let signals = tokio::spawn(async move {
        let outcome = wait_for_shutdown_signal().await;
        let _ = stop_tx.send(true);
        outcome
    });

    let registry = match startup(&config, &stop_rx) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Startup error: {}", e);
            let signal = signal_outcome(signals, &stop_rx).await;
            return startup_exit_code(signal.as_ref());
        }
    };

    let (listen, tls) = match (config.listen_addr(), config.tls()) {
        (Ok(addr), Ok(tls)) => (addr, tls),
        (Err(e), _) | (_, Err(e)) => {
            error!("{}", e);
            return WebhookExitCode::ConfigError;
        }
    };

    let mut shutdown = stop_rx.clone();
    let result = server::serve(listen, registry, tls.as_ref(), async move {
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            // A closed channel also means shutdown
            if shutdown.changed().await.is_err() {
                break;
            }
        }
    })
    .await;

    if let Err(e) = &result {
        error!("Daemon error: {}", e);
    }
    let signal = signal_outcome(signals, &stop_rx).await;
    let code = shutdown_exit_code(&result, signal.as_ref());
    if code == WebhookExitCode::CleanShutdown {
        info!("Shutting down daemon");
    }
    code
}

/// Collect what the signal watcher reported, if it has stopped the daemon
///
/// The watcher is aborted when the daemon stopped for another reason.
async fn signal_outcome(
    signals: JoinHandle<Result<&'static str>>,
    stop: &dns01_core::StopSignal,
) -> Option<Result<&'static str>> {
    if !*stop.borrow() {
        signals.abort();
        return None;
    }

    let outcome = match signals.await {
        Ok(outcome) => outcome,
        Err(e) => Err(anyhow::anyhow!("Signal watcher failed: {}", e)),
    };
    match &outcome {
        Ok(signal) => info!("Received shutdown signal: {}", signal),
        Err(e) => error!("Shutdown signal error: {}", e),
    }
    Some(outcome)
}

/// Exit code when startup did not complete
fn startup_exit_code(signal: Option<&Result<&'static str>>) -> WebhookExitCode {
    match signal {
        Some(Err(_)) => WebhookExitCode::RuntimeError,
        Some(Ok(_)) => {
            warn!("Startup interrupted by shutdown signal");
            WebhookExitCode::ConfigError
        }
        None => WebhookExitCode::ConfigError,
    }
}

/// Exit code once the server has stopped
fn shutdown_exit_code(
    served: &Result<()>,
    signal: Option<&Result<&'static str>>,
) -> WebhookExitCode {
    match (served, signal) {
        (Err(_), _) | (Ok(()), Some(Err(_))) => WebhookExitCode::RuntimeError,
        (Ok(()), _) => WebhookExitCode::CleanShutdown,
    }
}

fn startup(config: &Config, stop: &dns01_core::StopSignal) -> Result<SolverRegistry> {
    let secrets = build_secret_store(config)?;
    let mut registry = build_registry(config)?;
    registry.initialize(secrets, stop)?;

    info!(
        "Serving solvers [{}] under {}",
        registry.list_solvers().join(", "),
        registry.group_name()
    );
    Ok(registry)
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
