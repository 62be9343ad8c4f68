use polyfm::runtime::{self, Options};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = Options::from_args(std::env::args().skip(1));
    if let Err(e) = runtime::start(options) {
        error!("{}", e);
        std::process::exit(1);
    }
}
