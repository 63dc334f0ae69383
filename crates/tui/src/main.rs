//! Standalone TUI for curriculum-kit, rooted at the current directory.

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let root = std::env::current_dir()?;
    ck_tui::run_app(&root)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e))
}
