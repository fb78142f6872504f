use std::path::PathBuf;
use tracing::{debug, info};
use worldoption_codec::{CodecError, CodecInvoker, EmitOutcome};
use worldoption_mapper::{MappingError, PropertyMapper};
use worldoption_settings::SettingsError;

/// Everything one conversion run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub settings_path: PathBuf,
    pub codec_path: PathBuf,
    /// Codec argument template; `None` uses `<input> <output>`.
    pub codec_args: Option<Vec<String>>,
    pub output_dir: PathBuf,
    /// Pause for the user before exiting. Only the front end acts on this.
    pub interactive: bool,
}

impl RunConfig {
    pub fn new(
        settings_path: impl Into<PathBuf>,
        codec_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            settings_path: settings_path.into(),
            codec_path: codec_path.into(),
            codec_args: None,
            output_dir: output_dir.into(),
            interactive: false,
        }
    }

    pub fn with_codec_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.codec_args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    fn invoker(&self) -> CodecInvoker {
        let invoker = CodecInvoker::new(&self.codec_path);
        match &self.codec_args {
            Some(args) => invoker.with_args(args.iter().cloned()),
            None => invoker,
        }
    }
}

/// Errors from a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("could not find PalWorldSettings.ini at {}", .0.display())]
    SettingsMissing(PathBuf),
    #[error("save codec does not exist at {}", .0.display())]
    CodecMissing(PathBuf),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ConvertError {
    /// Whether the run failed because an input artifact does not exist.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            Self::SettingsMissing(_)
                | Self::CodecMissing(_)
                | Self::Settings(SettingsError::NotFound(_))
                | Self::Codec(CodecError::NotFound(_))
        )
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub property_count: usize,
    pub unknown_keys: Vec<String>,
    pub outcome: EmitOutcome,
}

/// Run one conversion with the built-in world option rules.
pub fn convert(config: &RunConfig) -> Result<ConversionSummary, ConvertError> {
    debug!(?config, "starting conversion");
    if !config.codec_path.is_file() {
        return Err(ConvertError::CodecMissing(config.codec_path.clone()));
    }
    if !config.settings_path.is_file() {
        return Err(ConvertError::SettingsMissing(config.settings_path.clone()));
    }
    info!(path = %config.settings_path.display(), "found settings");

    let raw = worldoption_settings::load(&config.settings_path)?;
    let report = PropertyMapper::default().map(&raw)?;

    let invoker = config.invoker();
    info!(
        properties = report.properties.len(),
        codec = %invoker.program().display(),
        "converting to save"
    );
    let outcome = invoker.emit(&report.properties, &config.output_dir)?;

    Ok(ConversionSummary {
        property_count: report.properties.len(),
        unknown_keys: report.unknown_keys,
        outcome,
    })
}
