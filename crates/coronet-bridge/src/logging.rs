use std::sync::Once;

use coronet_console::ConsoleLog;

static INIT: Once = Once::new();

/// Installs the process logger once: the platform sink wrapped by the
/// console mirror, so attached console clients see the same lines the
/// host log does.
pub(crate) fn init() {
    INIT.call_once(|| {
        if let Err(e) = ConsoleLog::install(platform_logger(), log::LevelFilter::Debug) {
            eprintln!("logger install failed: {e}");
        }
    });
}

#[cfg(target_os = "android")]
fn platform_logger() -> Box<dyn log::Log> {
    Box::new(android_logger::AndroidLogger::new(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("coronet"),
    ))
}

#[cfg(not(target_os = "android"))]
fn platform_logger() -> Box<dyn log::Log> {
    Box::new(
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .build(),
    )
}
