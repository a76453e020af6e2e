use crate::cli::InitArgs;
use crate::config::Config;
use crate::prompt::TemplateKind;
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

pub const CONFIG_FILE: &str = "hausarbeit.yaml";

pub fn execute(args: InitArgs) -> anyhow::Result<()> {
    let config = Config::default();
    let prompts_dir = args.dir.join(&config.prompts_dir);

    let mut files: Vec<(PathBuf, String)> = vec![(
        args.dir.join(CONFIG_FILE),
        serde_yaml::to_string(&config)?,
    )];
    for kind in TemplateKind::ALL {
        files.push((prompts_dir.join(kind.file_name()), kind.builtin().to_string()));
    }

    if !args.force {
        let existing: Vec<String> = files
            .iter()
            .filter(|(path, _)| path.exists())
            .map(|(path, _)| path.display().to_string())
            .collect();
        if !existing.is_empty() {
            anyhow::bail!(
                "Refusing to overwrite existing files (use --force): {}",
                existing.join(", ")
            );
        }
    }

    std::fs::create_dir_all(&prompts_dir)
        .with_context(|| format!("Failed to create {}", prompts_dir.display()))?;
    for (path, content) in &files {
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }

    println!(
        "Initialized {} with {} and {} prompt templates",
        args.dir.display(),
        CONFIG_FILE,
        TemplateKind::ALL.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Templates;

    #[test]
    fn test_init_writes_loadable_files() {
        let dir = tempfile::tempdir().unwrap();
        execute(InitArgs {
            dir: dir.path().to_path_buf(),
            force: false,
        })
        .unwrap();

        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert!(config.validate().is_ok());
        assert!(Templates::load(&dir.path().join(&config.prompts_dir)).is_ok());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "language: English\n").unwrap();

        let err = execute(InitArgs {
            dir: dir.path().to_path_buf(),
            force: false,
        })
        .unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap(),
            "language: English\n"
        );

        execute(InitArgs {
            dir: dir.path().to_path_buf(),
            force: true,
        })
        .unwrap();
        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.language, "German");
    }
}
