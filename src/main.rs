#[tokio::main]
async fn main() -> std::io::Result<()> {
    swarm_console::run_with_config().await
}
