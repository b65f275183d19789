use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialise logging. The default level is `info`; with `debug` enabled it is
/// `debug` and can be overridden via the `RUST_LOG` environment variable.
/// When `log_file` is given, output is appended to that file instead of stderr.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Without debug logging the level is forced to `info` so a stray
    // `RUST_LOG` in the user's environment cannot flood the console.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .map(|f| f.to_os_string())
                .unwrap_or_else(|| "scene_search.log".into());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let _ = builder.with_writer(appender).with_ansi(false).try_init();
        }
        None => {
            let _ = builder.try_init();
        }
    }
}
