#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = quiz_tutor::run().await {
        eprintln!("quiz-tutor fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
