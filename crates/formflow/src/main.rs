#[tokio::main]
async fn main() -> anyhow::Result<()> {
    formflow::cli::main().await
}
