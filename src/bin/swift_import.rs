use clap::Parser;
use swift_codes::adapters::FileSource;
use swift_codes::config::{self, AppConfig, ImportCli};
use swift_codes::core::{BankRepository, ImportEngine, ImportPipeline};
use swift_codes::domain::{BankSource, Deadline};
use swift_codes::utils::error::{BankError, Result};
use swift_codes::utils::{logger, validation::Validate};

#[tokio::main]
async fn main() {
    let args = ImportCli::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting swift-import");

    // 載入 TOML 配置
    let mut config = match config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config: {}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if args.strict {
        config.import.strict = true;
        tracing::info!("🔧 Strict mode enabled");
    }
    if let Some(csv) = &args.csv {
        config.import.csv_path = Some(csv.clone());
        tracing::info!("🔧 Reading CSV from {}", csv);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    display_config_summary(&config, &args);

    if let Err(e) = run(&config, args.dry_run).await {
        tracing::error!("❌ Import failed: {} (Category: {:?})", e, e.category());
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        eprintln!("💡 建議: {}", e.recovery_suggestion());
        std::process::exit(1);
    }
}

async fn run(config: &AppConfig, dry_run: bool) -> Result<()> {
    let source: Box<dyn BankSource> = match config.build_source()? {
        Some(source) => source,
        None => {
            return Err(BankError::ConfigError {
                message: "no import source: set import.csv_path, import.source_url or import.spreadsheet_id"
                    .to_string(),
            })
        }
    };

    let store = config.build_store()?;
    let repo = BankRepository::new(store);
    let pipeline = ImportPipeline::new(source, repo.clone(), config.import_options());
    let engine = ImportEngine::new(pipeline);

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - the store will not be modified");
        let outcome = engine.preview().await?;
        println!("🔍 Dry Run Analysis:");
        println!("  Headquarters: {}", outcome.headquarters.len());
        println!("  Branches: {}", outcome.branch_count());
        println!("  Duplicate headquarters: {}", outcome.replaced_headquarters.len());
        println!("  Duplicate branches: {}", outcome.replaced_branches.len());
        println!("  Orphan branches: {}", outcome.orphan_branches.len());
        return Ok(());
    }

    repo.ensure_indexes(Deadline::after(config.request_timeout()))
        .await?;
    let summary = engine.run().await?;

    println!("✅ Import completed successfully!");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn display_config_summary(config: &AppConfig, args: &ImportCli) {
    println!("📋 Configuration Summary:");
    match (
        &config.import.csv_path,
        &config.import.source_url,
        &config.import.spreadsheet_id,
    ) {
        (Some(path), _, _) => println!("  Source: {}", FileSource::new(path).describe()),
        (None, Some(url), _) => println!("  Source: {}", url),
        (None, None, Some(id)) => println!("  Source: spreadsheet {}", id),
        (None, None, None) => println!("  Source: (none)"),
    }
    println!("  Store: {} ({})", config.database.backend, config.database.path);
    println!("  Strict: {}", config.import.strict);
    println!("  Deadline: {}s", config.import.deadline_secs);

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
