use anyhow::Context;
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use worldoption_convert::{RunConfig, convert};

const SETTINGS_FILE_NAME: &str = "PalWorldSettings.ini";

#[cfg(windows)]
const CODEC_FILE_NAME: &str = "uesave.exe";
#[cfg(not(windows))]
const CODEC_FILE_NAME: &str = "uesave";

#[derive(Parser)]
#[command(
    name = "palworld-worldoptions",
    version,
    about = "Creates a WorldOption.sav file for dedicated servers"
)]
struct Cli {
    /// Location of PalWorldSettings.ini [default: next to this executable]
    settings_file: Option<PathBuf>,

    /// Save codec executable [default: uesave/uesave next to this executable]
    #[arg(long, alias = "uesave")]
    codec: Option<PathBuf>,

    /// Codec argument; repeat to build the full list. `{input}` and `{output}`
    /// are replaced by the IR and save paths [default: {input} {output}]
    #[arg(long = "codec-arg", allow_hyphen_values = true)]
    codec_args: Vec<String>,

    /// Output directory for WorldOption.sav [default: executable directory]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Don't ask for input before closing
    #[arg(long)]
    script: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_run_config(self) -> anyhow::Result<RunConfig> {
        let exe = std::env::current_exe().context("locating the running executable")?;
        let running_dir = exe.parent().unwrap_or(Path::new(".")).to_path_buf();

        let settings = self
            .settings_file
            .unwrap_or_else(|| running_dir.join(SETTINGS_FILE_NAME));
        let codec = self
            .codec
            .unwrap_or_else(|| running_dir.join("uesave").join(CODEC_FILE_NAME));
        let output = self.output.unwrap_or_else(|| running_dir.clone());
        let interactive = !self.script && std::io::stdin().is_terminal();

        let mut config = RunConfig::new(settings, codec, output).with_interactive(interactive);
        if !self.codec_args.is_empty() {
            config = config.with_codec_args(self.codec_args);
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match cli.into_run_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let code = run(&config);
    if config.interactive {
        wait_for_return();
    }
    code
}

fn run(config: &RunConfig) -> ExitCode {
    // Panics get the same notice as errors; the default hook prints the message.
    let result = std::panic::catch_unwind(|| convert(config));
    match result {
        Ok(Ok(summary)) => {
            if !summary.unknown_keys.is_empty() {
                println!(
                    "Ignored unknown settings: {}",
                    summary.unknown_keys.join(", ")
                );
            }
            println!(
                "Wrote {} settings to {}",
                summary.property_count,
                summary.outcome.save_path.display()
            );
            println!("Complete!");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) if e.is_missing_input() => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
        Ok(Err(e)) => {
            eprintln!("Error: {e}");
            critical_notice();
            ExitCode::FAILURE
        }
        Err(_) => {
            critical_notice();
            ExitCode::FAILURE
        }
    }
}

fn critical_notice() {
    eprintln!("There was a critical error generating the WorldOption.sav file");
    eprintln!("Please contact support with the error message above");
}

fn wait_for_return() {
    println!("Press RETURN to close");
    let mut line = String::new();
    if let Err(e) = std::io::stdin().read_line(&mut line) {
        tracing::debug!(error = %e, "stdin closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn script_flag_disables_pause() {
        let cli = Cli::parse_from(["palworld-worldoptions", "--script", "settings.ini"]);
        let config = cli.into_run_config().unwrap();
        assert!(!config.interactive);
        assert_eq!(config.settings_path, PathBuf::from("settings.ini"));
        assert!(config.codec_args.is_none());
    }

    #[test]
    fn defaults_sit_beside_executable() {
        let cli = Cli::parse_from(["palworld-worldoptions", "--script"]);
        let config = cli.into_run_config().unwrap();
        let exe_dir = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();
        assert_eq!(config.settings_path, exe_dir.join(SETTINGS_FILE_NAME));
        assert_eq!(config.codec_path, exe_dir.join("uesave").join(CODEC_FILE_NAME));
        assert_eq!(config.output_dir, exe_dir);
    }

    #[test]
    fn codec_args_and_uesave_alias() {
        let cli = Cli::parse_from([
            "palworld-worldoptions",
            "--uesave",
            "/opt/uesave",
            "--codec-arg",
            "from-json",
            "--codec-arg",
            "--input",
            "--codec-arg",
            "{input}",
            "--output",
            "/srv/save",
            "--script",
        ]);
        let config = cli.into_run_config().unwrap();
        assert_eq!(config.codec_path, PathBuf::from("/opt/uesave"));
        assert_eq!(
            config.codec_args.unwrap(),
            ["from-json", "--input", "{input}"]
        );
        assert_eq!(config.output_dir, PathBuf::from("/srv/save"));
    }
}
