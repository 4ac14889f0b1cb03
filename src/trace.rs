use std::str::FromStr;

use tracing_subscriber::{
    fmt::format::FmtSpan,
    prelude::*,
    EnvFilter,
};

use util::bootstrap;

/// Install the global subscriber: stderr only, so stdout stays free for payloads.
pub fn init(pretty: bool) {
    let console_filter = console_filter();
    bootstrap!("enabling tracing with filter directive: {}", console_filter);

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false);

    let s = tracing_subscriber::registry();

    if pretty {
        s.with(stderr_layer.pretty().with_filter(console_filter)).init();
    } else {
        s.with(
            stderr_layer
                .with_line_number(false)
                .with_span_events(FmtSpan::NONE)
                .with_filter(console_filter),
        )
        .init();
    }
}

fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_str = {
            cfg_if::cfg_if! {
                if #[cfg(not(debug_assertions))] {
                    "warn,loralink=info,loralink_runtime=info,loralink_codec=warn,loralink_message=warn"
                } else {
                    "info,loralink=debug,loralink_runtime=debug,loralink_codec=debug,loralink_message=debug"
                }
            }
        };

        EnvFilter::from_str(default_str).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}
