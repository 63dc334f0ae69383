//! `curriculum init`: write the starter `.curriculum-kit/` directory.

use std::path::Path;

use ck_core::init::{generate_curriculum_kit_structure, InitOptions};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use colored::Colorize;

use crate::cli::InitArgs;

pub async fn run(root: &Path, args: InitArgs) -> Result<()> {
    let written = generate_curriculum_kit_structure(InitOptions {
        target_dir: root.to_path_buf(),
        force: args.force,
        minimal: args.minimal,
    })
    .await
    .wrap_err("failed to initialize project")?;

    for path in &written {
        println!("{} {}", "Created".green(), path.display());
    }
    println!(
        "\nTry: {}",
        "curriculum run --topic \"Photosynthesis\" --audience \"Grade 7\"".bold()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_init_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            force: false,
            minimal: true,
        };

        run(dir.path(), args.clone()).await.unwrap();
        assert!(dir.path().join(".curriculum-kit/config.toml").exists());

        assert!(run(dir.path(), args).await.is_err());
        run(
            dir.path(),
            InitArgs {
                force: true,
                minimal: true,
            },
        )
        .await
        .unwrap();
    }
}
