use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlsmith::GenerationOpts;
use strum::EnumString;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct Profile {
    #[garde(dive)]
    pub generation: GenerationOpts,
    /// Steps between random `CREATE TABLE` statements. 0 disables them.
    #[garde(skip)]
    pub ddl_interval: u64,
    #[garde(range(min = 1))]
    pub progress_interval: u64,
    /// Generation failures in a row after which the run is aborted.
    #[garde(range(min = 1))]
    pub max_consecutive_failures: u64,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            generation: GenerationOpts::default(),
            ddl_interval: 100,
            progress_interval: 1000,
            max_consecutive_failures: 1000,
        }
    }
}

impl Profile {
    /// Never mutates the schema.
    pub fn no_ddl() -> Self {
        let profile = Profile {
            ddl_interval: 0,
            ..Default::default()
        };
        debug_assert!(profile.validate().is_ok());
        profile
    }

    /// Keeps statements small by capping scope depth early.
    pub fn shallow() -> Self {
        let profile = Profile {
            generation: GenerationOpts {
                max_depth: Some(6),
                ..Default::default()
            },
            ..Default::default()
        };
        debug_assert!(profile.validate().is_ok());
        profile
    }

    pub fn parse_from_type(profile_type: ProfileType) -> anyhow::Result<Self> {
        let profile = match profile_type {
            ProfileType::Default => Self::default(),
            ProfileType::NoDdl => Self::no_ddl(),
            ProfileType::Shallow => Self::shallow(),
            ProfileType::Custom(path) => Self::parse(&path)
                .with_context(|| format!("failed to parse profile {}", path.display()))?,
        };
        Ok(profile)
    }

    pub fn parse(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json5(&contents)
    }

    /// JSON5 so profiles may carry comments and trailing commas.
    pub fn from_json5(contents: &str) -> anyhow::Result<Self> {
        let profile: Profile = json5::from_str(contents)?;
        profile.validate()?;
        Ok(profile)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, EnumString, strum::Display, strum::VariantNames)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
pub enum ProfileType {
    #[default]
    Default,
    NoDdl,
    Shallow,
    #[strum(disabled)]
    Custom(PathBuf),
}

impl ProfileType {
    /// A preset name, or else the path of a profile file.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        if let Ok(profile) = ProfileType::from_str(s) {
            return Ok(profile);
        }
        let path = PathBuf::from(s);
        if path.exists() {
            Ok(ProfileType::Custom(path))
        } else {
            Err(anyhow::anyhow!(
                "`{s}` is neither a predefined profile nor a profile file"
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        Profile::default().validate().unwrap();
        assert_eq!(Profile::no_ddl().ddl_interval, 0);
        assert_eq!(Profile::shallow().generation.max_depth, Some(6));
    }

    #[test]
    fn preset_names() {
        assert_eq!(ProfileType::parse("default").unwrap(), ProfileType::Default);
        assert_eq!(ProfileType::parse("no_ddl").unwrap(), ProfileType::NoDdl);
        assert_eq!(ProfileType::parse("SHALLOW").unwrap(), ProfileType::Shallow);
        assert!(ProfileType::parse("/definitely/not/a/profile.json5").is_err());
    }

    #[test]
    fn json5_profile_with_comments() {
        let profile = Profile::from_json5(
            r#"{
                // mutate the schema more often
                ddl_interval: 10,
                generation: { insert_prob: 0.5, max_depth: null, },
            }"#,
        )
        .unwrap();
        assert_eq!(profile.ddl_interval, 10);
        assert_eq!(profile.generation.insert_prob, 0.5);
        assert_eq!(profile.generation.max_depth, None);
        assert_eq!(profile.generation.retry_count, 20);
        assert_eq!(profile.progress_interval, 1000);
    }

    #[test]
    fn invalid_profiles_are_rejected() {
        assert!(Profile::from_json5("{ max_consecutive_failures: 0 }").is_err());
        assert!(Profile::from_json5("{ generation: { retry_count: 0 } }").is_err());
        assert!(Profile::from_json5("{ unknown_knob: 1 }").is_err());
        assert!(Profile::from_json5("{ generation: { insert_prob: NaN } }").is_err());
        assert!(Profile::from_json5("{ generation: { limit_prob: Infinity } }").is_err());
    }
}
