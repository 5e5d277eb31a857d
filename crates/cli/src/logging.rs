use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const CRATES: [&str; 2] = ["sdkforge", "sdkforge_core"];

/// Install the stderr fmt subscriber.
///
/// `SDKFORGE_LOG` is either a plain level ("debug"), applied to the sdkforge
/// crates, or a full filter spec like "sdkforge_core=trace".
pub fn init_tracing() {
    let filter = filter_spec(std::env::var("SDKFORGE_LOG").ok().as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn filter_spec(env: Option<&str>) -> String {
    match env {
        Some(level) if is_plain_level(level) => scoped(level),
        Some(spec) if !spec.trim().is_empty() => spec.to_string(),
        _ => scoped("warn"),
    }
}

fn scoped(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_spec() {
        assert_eq!(filter_spec(None), "sdkforge=warn,sdkforge_core=warn");
        assert_eq!(
            filter_spec(Some("debug")),
            "sdkforge=debug,sdkforge_core=debug"
        );
        assert_eq!(
            filter_spec(Some("sdkforge_core=trace")),
            "sdkforge_core=trace"
        );
        assert_eq!(filter_spec(Some(" ")), "sdkforge=warn,sdkforge_core=warn");
    }
}
