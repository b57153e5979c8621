use crate::prelude::*;
use std::ops::Deref;
use tracing_subscriber::prelude::*;

/// Installs the global `tracing` subscriber and the panic hook.
/// The filter is read from the `TG_BOT_LOG` env var, and `COLORS=0`
/// disables ANSI escapes.
pub fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::from_env("TG_BOT_LOG");

    let fmt = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::env::var("COLORS").as_deref() != Ok("0"))
        .pretty();

    tracing_subscriber::registry()
        .with(fmt)
        .with(env_filter)
        .with(tracing_error::ErrorLayer::default())
        .init();

    init_panic_hook();

    let labels = super::super::GLOBAL_LABELS
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ");

    info!(%labels, "Logging initialized");
}

fn init_panic_hook() {
    let current_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        // The default hook must run first, the panic may come from
        // inside of `tracing` itself
        current_hook(panic_info);

        let location = panic_info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()));

        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<String>()
            .map(<_>::deref)
            .or_else(|| payload.downcast_ref::<&str>().map(<_>::deref))
            .unwrap_or("<unknown>");

        let span_trace = tracing_error::SpanTrace::capture();

        error!(
            target: "panic",
            thread = std::thread::current().name(),
            location,
            span_trace = %span_trace,
            "{message}"
        );
    }));
}
