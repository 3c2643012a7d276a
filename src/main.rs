use clap::Parser;
use counting_worker::telemetry::{AppInsightsTelemetry, LogTelemetry, TelemetrySink};
use counting_worker::utils::{logger, validation::Validate};
use counting_worker::{
    CliArgs, FileResultRepository, KafkaMessageSource, MessageProcessor, PgResultRepository,
    ResultRepository, StorageKind, Worker, WorkerConfig, WorkerError, WorkerSummary,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_logger(args.verbose, args.json_logs);

    tracing::info!("🚀 Starting counting-worker");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match WorkerConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    if let Err(e) = config.validate() {
        exit_with(e);
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - configuration is valid, not connecting");
        return Ok(());
    }

    let telemetry = match build_telemetry(&config) {
        Ok(telemetry) => telemetry,
        Err(e) => exit_with(e),
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown(shutdown.clone()));

    let source = match KafkaMessageSource::connect(&config.kafka_settings()) {
        Ok(source) => source,
        Err(e) => exit_with(e),
    };

    let result = match config.storage.kind {
        StorageKind::Postgres => {
            let repository = match open_postgres(&config).await {
                Ok(repository) => repository,
                Err(e) => exit_with(e),
            };
            run_worker(source, repository, telemetry, &config, shutdown).await
        }
        StorageKind::File => {
            let path = match config.output_path() {
                Ok(path) => path.to_string(),
                Err(e) => exit_with(e),
            };
            tracing::info!("📁 Results will be appended to: {}", path);
            run_worker(
                source,
                FileResultRepository::new(path),
                telemetry,
                &config,
                shutdown,
            )
            .await
        }
    };

    match result {
        Ok(summary) => {
            tracing::info!(
                "✅ counting-worker stopped: {} received, {} saved",
                summary.received,
                summary.saved
            );
            Ok(())
        }
        Err(e) => exit_with(e),
    }
}

async fn run_worker<R: ResultRepository>(
    source: KafkaMessageSource,
    repository: R,
    telemetry: Arc<dyn TelemetrySink>,
    config: &WorkerConfig,
    shutdown: CancellationToken,
) -> counting_worker::Result<WorkerSummary> {
    let processor = MessageProcessor::new(repository, telemetry);
    let worker = Worker::new(
        source,
        processor,
        config.kafka.topic.clone(),
        config.kafka.group_id.clone(),
    );
    worker.run(shutdown).await
}

async fn open_postgres(config: &WorkerConfig) -> counting_worker::Result<PgResultRepository> {
    PgResultRepository::open(config.database_url()?).await
}

fn build_telemetry(config: &WorkerConfig) -> counting_worker::Result<Arc<dyn TelemetrySink>> {
    match config.telemetry_connection()? {
        Some(connection) => {
            tracing::info!("📡 Dependency telemetry goes to {}", connection.track_url);
            Ok(Arc::new(AppInsightsTelemetry::new(
                connection,
                "counting-worker",
            )?))
        }
        None => {
            tracing::info!("📡 No telemetry connection string, dependency events go to the log");
            Ok(Arc::new(LogTelemetry))
        }
    }
}

fn display_config_summary(config: &WorkerConfig) {
    let settings = config.kafka_settings();
    tracing::info!("📋 Configuration summary:");
    tracing::info!("   Broker: {}", settings.host);
    tracing::info!("   Topic: {}", settings.topic);
    tracing::info!("   Group Id: {}", settings.group_id);
    tracing::info!(
        "   Transport: {}",
        if settings.is_authenticated() {
            "SASL_SSL"
        } else {
            "PLAINTEXT"
        }
    );
    tracing::info!("   Storage: {:?}", config.storage.kind);
}

async fn wait_for_shutdown(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            tracing::warn!(error = %e, "Could not listen for Ctrl-C");
                            sigterm.recv().await;
                        }
                    }
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not install SIGTERM handler");
                wait_for_ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;

    tracing::info!("Received shutdown signal");
    shutdown.cancel();
}

/// 無法監聽 Ctrl-C 時永遠等待，不要誤觸停止
async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for Ctrl-C, shutdown signal disabled");
        std::future::pending::<()>().await;
    }
}

fn exit_with(e: WorkerError) -> ! {
    tracing::error!(
        "❌ Startup failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1))
}
