use board_log::error;
use frontend::{FrontendConfig, FrontendError, HttpBackend, Server, app};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    board_log::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "frontend.toml".to_string());

    if let Err(err) = run(&path).await {
        error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(path: &str) -> Result<(), FrontendError> {
    let config = FrontendConfig::load_optional(path)?;
    let backend = Arc::new(HttpBackend::new(&config.backend)?);

    let router = app(&config, backend)?;
    Server::new(router).listen(&config.listen_address()).await?;
    Ok(())
}
