use animal_service::prelude::*;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("animal-service: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let store = store::connect(&config).await?;
    tracing::info!(backend = store.backend(), "store ready");

    let app = router(AppState::new(config.clone(), store));

    Server::new(config).serve(app).await
}
