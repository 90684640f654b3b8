use mcepnn::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

pub fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},mcepnn=debug", logging.level))
    });

    // Optional file output under MCEPNN_LOG_DIR; `rolling::daily` panics
    // on an unwritable directory.
    let file_layer = std::env::var("MCEPNN_LOG_DIR").ok().and_then(|log_dir| {
        if std::fs::create_dir_all(&log_dir).is_err() {
            eprintln!(
                "Warning: Could not create log directory {}, file logging disabled",
                log_dir
            );
            return None;
        }
        let test_path = std::path::Path::new(&log_dir).join(".mcepnn_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_path);

                let file_appender = tracing_appender::rolling::daily(&log_dir, "mcepnn.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {} ({}), file logging disabled",
                    log_dir, e
                );
                None
            }
        }
    });

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }
}

pub fn init_logging_simple() {
    // Minimal logging for read-only commands
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .try_init();
}
