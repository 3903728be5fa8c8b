use clap::Parser;
use swift_codes::api::{self, AppState};
use swift_codes::config::{self, AppConfig, Cli};
use swift_codes::core::{BankRepository, BankService, ImportEngine, ImportPipeline};
use swift_codes::domain::Deadline;
use swift_codes::utils::error::{BankError, ErrorCategory, Result};
use swift_codes::utils::{logger, validation::Validate};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(&config.logging.level);
    } else {
        logger::init_cli_logger(cli.verbose || config.logging.level == "debug");
    }

    tracing::info!("Starting swift-codes server");
    if cli.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }

    if let Err(e) = run(&cli, config).await {
        tracing::error!("❌ swift-codes failed: {} (Category: {:?})", e, e.category());
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: &Cli, config: AppConfig) -> Result<()> {
    let store = config.build_store()?;
    let repo = BankRepository::new(store);
    repo.ensure_indexes(Deadline::after(config.request_timeout()))
        .await?;

    if cli.skip_import || !config.import.enabled {
        tracing::info!("⏭️ Import skipped, serving existing data");
    } else {
        import(&config, &repo).await?;
    }

    let service = BankService::new(repo);
    let state = AppState::new(service, config.request_timeout());
    let app = if config.server.cors {
        api::router_with_cors(state)
    } else {
        api::router(state)
    };

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("🚀 Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn import(config: &AppConfig, repo: &BankRepository) -> Result<()> {
    let Some(source) = config.build_source()? else {
        tracing::warn!("⚠️ No import source configured, serving existing data");
        return Ok(());
    };

    let pipeline = ImportPipeline::new(source, repo.clone(), config.import_options());
    let summary = ImportEngine::new(pipeline).run().await?;

    tracing::info!(
        "📊 Imported {} headquarters and {} branches from {}",
        summary.headquarters,
        summary.branches,
        summary.source
    );
    if !summary.replaced_headquarters.is_empty() {
        tracing::warn!(
            "⚠️ Duplicate headquarters replaced: {}",
            summary.replaced_headquarters.join(", ")
        );
    }
    if !summary.replaced_branches.is_empty() {
        tracing::warn!(
            "⚠️ Duplicate branches replaced: {}",
            summary.replaced_branches.join(", ")
        );
    }
    if !summary.orphan_branches.is_empty() {
        tracing::warn!(
            "⚠️ Branches without a headquarter were dropped: {}",
            summary.orphan_branches.join(", ")
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("🛑 Shutdown signal received");
}

// 根據錯誤類別決定退出碼
fn exit_code(e: &BankError) -> i32 {
    match e.category() {
        ErrorCategory::Configuration => 2,
        ErrorCategory::Storage => 3,
        ErrorCategory::Client
        | ErrorCategory::NotFound
        | ErrorCategory::Conflict
        | ErrorCategory::Internal => 1,
    }
}
