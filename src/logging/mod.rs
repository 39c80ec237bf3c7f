use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` directives are honoured;
/// `secret_baker=info` is always added.
pub fn init(json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(
        "secret_baker=info"
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into()),
    );

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
