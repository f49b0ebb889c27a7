use order_server::{Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. dotenv, config, logger
    let config = setup_environment();

    print_banner();
    tracing::info!(
        http_port = config.http_port,
        message_tcp_port = config.message_tcp_port,
        "Order server starting..."
    );

    // 2. database, time zone, message bus
    let state = ServerState::initialize(&config).await?;

    // 3. HTTP + bus TCP until Ctrl-C
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
