#[tokio::main]
async fn main() -> anyhow::Result<()> {
    goldsql_server::start().await
}
