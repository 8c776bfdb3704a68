//! CLI command implementations.

pub mod calc;
pub mod calc_profile;
pub mod init;
pub mod parts;
pub mod phys;
pub mod regmap;
pub mod sweep;

use std::path::PathBuf;

use anyhow::{Context, Result};
use phycalc_export::OutputFormat;
use phycalc_parts::{reference, Configurator};

use crate::config::ProjectConfig;

/// Part selection and project settings shared by the commands.
#[derive(Debug)]
pub struct Session {
    pub family: String,
    pub revision: String,
    /// Build target name or tag; none calculates every PHY without a
    /// target hook.
    pub target: Option<String>,
    pub config: ProjectConfig,
    /// Directory holding `phycalc.toml`, or the working directory.
    pub project_dir: PathBuf,
}

impl Session {
    /// Command-line flags win over the config file; without either the
    /// reference family's first revision is used.
    pub fn resolve(
        config: ProjectConfig,
        project_dir: PathBuf,
        family: Option<String>,
        revision: Option<String>,
        target: Option<String>,
    ) -> Result<Self> {
        let family = family
            .or_else(|| config.part.family.clone())
            .unwrap_or_else(|| reference::FAMILY.to_string());
        let revision = match revision.or_else(|| config.part.revision.clone()) {
            Some(revision) => revision,
            None => phycalc_parts::revisions(&family)?
                .first()
                .map(|r| r.to_string())
                .with_context(|| format!("family '{family}' has no revisions"))?,
        };
        let target = target.or_else(|| config.part.target.clone());
        Ok(Self {
            family,
            revision,
            target,
            config,
            project_dir,
        })
    }

    pub fn configurator(&self) -> Result<Configurator> {
        let configurator = Configurator::for_part(&self.family, &self.revision)
            .with_context(|| format!("loading part {}-{}", self.family, self.revision))?;
        let configurator = match &self.target {
            Some(target) => configurator.with_target(target)?,
            None => configurator,
        };
        Ok(configurator.with_default_inputs(self.config.inputs.clone()))
    }

    /// `--format`, then `[output] format`, then text.
    pub fn output_format(&self, flag: Option<&str>) -> Result<OutputFormat> {
        match flag.or(self.config.output.format.as_deref()) {
            Some(name) => Ok(name.parse()?),
            None => Ok(OutputFormat::default()),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_session(project_dir: &std::path::Path) -> Session {
    Session::resolve(ProjectConfig::default(), project_dir.to_path_buf(), None, None, None).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut config = ProjectConfig::default();
        config.part.revision = Some("B0".into());
        config.output.format = Some("json".into());
        let session = Session::resolve(config.clone(), PathBuf::from("."), None, None, None).unwrap();
        assert_eq!(session.family, "reference");
        assert_eq!(session.revision, "B0");
        assert_eq!(session.output_format(None).unwrap(), OutputFormat::Json);
        assert_eq!(session.output_format(Some("toml")).unwrap(), OutputFormat::Toml);

        let session = Session::resolve(config, PathBuf::from("."), None, Some("A0".into()), None).unwrap();
        assert_eq!(session.revision, "A0");
    }

    #[test]
    fn target_flag_overrides_config() {
        let mut config = ProjectConfig::default();
        config.part.target = Some("IC".into());
        let session = Session::resolve(config.clone(), PathBuf::from("."), None, None, None).unwrap();
        assert_eq!(session.target.as_deref(), Some("IC"));

        let session = Session::resolve(config, PathBuf::from("."), None, None, Some("fpga".into())).unwrap();
        let configurator = session.configurator().unwrap();
        assert_eq!(configurator.target().map(|t| t.name.as_str()), Some("FPGA"));
    }

    #[test]
    fn unknown_target_rejected() {
        let session =
            Session::resolve(ProjectConfig::default(), PathBuf::from("."), None, None, Some("asic".into())).unwrap();
        let err = session.configurator().unwrap_err();
        assert!(err.to_string().contains("asic"));
    }

    #[test]
    fn defaults_to_first_revision() {
        let session = test_session(std::path::Path::new("."));
        assert_eq!(session.revision, "A0");
        assert_eq!(session.output_format(None).unwrap(), OutputFormat::Text);
    }

    #[test]
    fn unknown_family_rejected() {
        let err = Session::resolve(ProjectConfig::default(), PathBuf::from("."), Some("nope".into()), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
