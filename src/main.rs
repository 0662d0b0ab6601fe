#[tokio::main]
async fn main() -> anyhow::Result<()> {
    describebot::run().await
}
