use std::process::ExitCode;

use tracing::{error, info};

use dashguard::auth::{AuthService, PasswordHasher, SessionContext};
use dashguard::db::CredentialStore;
use dashguard::{Config, Database, Portal};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    // Initialize logging
    if let Err(e) = dashguard::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        dashguard::logging::init_console_only(&config.logging.level);
    }

    info!("dashguard starting");

    // Storage failure at startup is the one fatal condition
    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!(path = %config.database.path, error = %e, "Failed to open database");
            eprintln!("Failed to open database: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = config.legacy_users_file() {
        let store = CredentialStore::new(db.pool());
        match dashguard::import_legacy_users(&store, path).await {
            Ok(report) => println!(
                "Imported {} legacy user(s) ({} already present, {} failed).",
                report.imported, report.skipped_existing, report.failed
            ),
            Err(e) => error!(error = %e, "Legacy user import aborted"),
        }
    }

    let hasher = match PasswordHasher::new(&config.hashing) {
        Ok(hasher) => hasher,
        Err(e) => {
            eprintln!("Invalid hashing configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let service = AuthService::new(db.pool().clone(), hasher);
    let portal = Portal::new(service, SessionContext::from_config(&config.auth));

    let result = dashguard::console::run_stdio(portal).await;
    db.close().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Console terminated");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
