use crate::error::{ErrorKind, Result};
use crate::models::{Config, project_dirs};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Prefix of environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "LUDEX_";
const FILE_STEM: &str = "config";

enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn merge(&self, figment: Figment, path: &Path) -> Figment {
        match self {
            Self::Toml => figment.merge(Toml::file_exact(path)),
            Self::Yaml => figment.merge(Yaml::file_exact(path)),
            Self::Json => figment.merge(Json::file_exact(path)),
        }
    }
}

impl Config {
    /// Directory searched for `config.{toml,yaml,json}` when no explicit file
    /// is given.
    pub fn default_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Load and validate the configuration.
    ///
    /// With `explicit`, only that file is read (and it must exist); otherwise
    /// every `config.*` file present in [`default_dir`](Self::default_dir) is
    /// merged, TOML then YAML then JSON.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let figment = match explicit {
            Some(path) => Self::figment_for_file(path)?,
            None => Self::figment_for_dir(Self::default_dir().as_deref()),
        };
        Self::extract(figment)
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }

    fn with_env(figment: Figment) -> Figment {
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn figment_for_file(path: &Path) -> Result<Figment> {
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        let Some(format) = FileFormat::from_path(path) else {
            exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf()));
        };
        tracing::debug!(path = %path.display(), "loading configuration file");
        Ok(Self::with_env(format.merge(Self::defaults(), path)))
    }

    fn figment_for_dir(dir: Option<&Path>) -> Figment {
        let mut figment = Self::defaults();
        if let Some(dir) = dir {
            for extension in ["toml", "yaml", "json"] {
                let path = dir.join(format!("{FILE_STEM}.{extension}"));
                if let Some(format) = FileFormat::from_path(&path)
                    && path.is_file()
                {
                    tracing::debug!(path = %path.display(), "loading configuration file");
                    figment = format.merge(figment, &path);
                }
            }
        }
        Self::with_env(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        // The message names the offending key and source.
        let config: Config = match figment.extract() {
            Ok(config) => config,
            Err(err) => exn::bail!(ErrorKind::Invalid(err.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check rules that the type system can't express.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for integration in &self.integrations {
            let runner = integration.runner.trim();
            if runner.is_empty() {
                exn::bail!(ErrorKind::Validation("integration with an empty runner name".to_string()));
            }
            if runner != integration.runner {
                exn::bail!(ErrorKind::Validation(format!(
                    "runner name {:?} has surrounding whitespace",
                    integration.runner
                )));
            }
            if !seen.insert(runner) {
                exn::bail!(ErrorKind::Validation(format!("duplicate integration runner: {runner}")));
            }
        }
        if self.remote.timeout_secs == 0 {
            exn::bail!(ErrorKind::Validation("remote.timeout_secs must be positive".to_string()));
        }
        if self.remote.base_url.trim().is_empty() {
            exn::bail!(ErrorKind::Validation("remote.base_url is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackfillField, IntegrationKind};
    use figment::Jail;
    use rstest::rstest;

    fn load_from(dir: &Path) -> Result<Config> {
        Config::extract(Config::figment_for_dir(Some(dir)))
    }

    #[test]
    fn test_no_files_gives_defaults() {
        Jail::expect_with(|jail| {
            let config = load_from(jail.directory()).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    [database]
                    path = "/var/lib/ludex/library.db"

                    [remote]
                    username = "gordon"
                    token = "s3cret"
                    timeout_secs = 5

                    [sync]
                    backfill_fields = ["year", "platform_id"]

                    [[integrations]]
                    runner = "steam"
                    kind = "native"
                    root = "/opt/steam"
                "#,
            )?;
            let config = load_from(jail.directory()).unwrap();
            assert_eq!(config.database.path, PathBuf::from("/var/lib/ludex/library.db"));
            assert_eq!(config.remote.username.as_deref(), Some("gordon"));
            assert_eq!(config.remote.timeout_secs, 5);
            assert_eq!(config.remote.base_url, "https://lutris.net");
            assert_eq!(config.sync.backfill_fields, vec![BackfillField::Year, BackfillField::PlatformId]);
            // Lists replace the defaults rather than extending them.
            assert_eq!(config.integrations.len(), 1);
            assert_eq!(config.integrations[0].kind, IntegrationKind::Native);
            assert!(!config.integrations[0].requires_config_path);
            Ok(())
        });
    }

    #[test]
    fn test_later_formats_and_env_take_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[remote]\nusername = \"toml\"\ntimeout_secs = 10")?;
            jail.create_file("config.yaml", "remote:\n  username: yaml")?;
            jail.set_env("LUDEX_REMOTE__TOKEN", "from-env");
            let config = load_from(jail.directory()).unwrap();
            assert_eq!(config.remote.username.as_deref(), Some("yaml"));
            assert_eq!(config.remote.timeout_secs, 10);
            assert_eq!(config.remote.token.as_deref(), Some("from-env"));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_json_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "ludex.json",
                r#"{"integrations": [{"runner": "winesteam", "kind": "wine", "root": "/pfx", "requires_config_path": true}]}"#,
            )?;
            let config = Config::load(Some(jail.directory().join("ludex.json").as_path())).unwrap();
            assert_eq!(config.integrations[0].kind, IntegrationKind::Wine);
            assert!(config.integrations[0].requires_config_path);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.toml");
        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(path));
    }

    #[test]
    fn test_explicit_file_format() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[remote]").unwrap();
        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(path));
    }

    #[test]
    fn test_unknown_backfill_field() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[sync]\nbackfill_fields = [\"runner\"]")?;
            let err = load_from(jail.directory()).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[rstest]
    #[case::duplicate_runner(
        r#"[{runner = "steam", kind = "native", root = "/a"}, {runner = "steam", kind = "wine", root = "/b"}]"#
    )]
    #[case::empty_runner(r#"[{runner = " ", kind = "native", root = "/a"}]"#)]
    #[case::padded_runner(r#"[{runner = "steam ", kind = "native", root = "/a"}]"#)]
    #[case::padded_duplicate(
        r#"[{runner = "steam", kind = "native", root = "/a"}, {runner = " steam", kind = "wine", root = "/b"}]"#
    )]
    fn test_invalid_integrations(#[case] integrations: &str) {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", &format!("integrations = {integrations}"))?;
            let err = load_from(jail.directory()).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Validation(_)));
            Ok(())
        });
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut config = Config::default();
        config.remote.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
