use std::sync::Arc;

use sessiongate::config::{load_config, print_schema};
use sessiongate::startup::run;
use sessiongate::utils::logger::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::args().any(|arg| arg == "--schema") {
        print_schema()?;
        return Ok(());
    }

    let config = load_config();
    init_logging(&config.logging)?;

    run(Arc::new(config)).await
}
