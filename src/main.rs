/// Entry point for the zpool exporter.
///
/// Initializes logging, builds the default pool collectors, and serves
/// Prometheus metrics over HTTP until terminated.
///
/// # Examples
///
/// ```bash
/// LISTEN_ADDRESS=0.0.0.0:9134 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    zpool_exporter::run().await
}
