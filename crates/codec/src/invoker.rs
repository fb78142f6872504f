use crate::ir::{IR_FILE_NAME, IrDocument, SAVE_FILE_NAME, STAGING_FILE_NAME, sha256_hex};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, info, warn};
use worldoption_common::PropertyMap;

/// Placeholder replaced by the IR document path.
pub const INPUT_PLACEHOLDER: &str = "{input}";
/// Placeholder replaced by the path the codec must write.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Errors from emitting the save file.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("codec not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("codec at {} is not executable", .0.display())]
    NotExecutable(PathBuf),
    #[error("output directory {} is not writable", .0.display())]
    OutputNotWritable(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("codec failed with {status}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
    Invocation {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
    #[error("codec exited successfully but wrote no output for {}", .0.display())]
    MissingOutput(PathBuf),
}

/// Paths and digest of a committed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOutcome {
    pub ir_path: PathBuf,
    pub save_path: PathBuf,
    /// SHA-256 of the IR bytes, for comparing runs.
    pub ir_sha256: String,
}

/// Runs an external codec executable over the IR document.
#[derive(Debug, Clone)]
pub struct CodecInvoker {
    program: PathBuf,
    args: Vec<String>,
}

impl CodecInvoker {
    /// Invoke `program <ir-path> <output-path>`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![INPUT_PLACEHOLDER.into(), OUTPUT_PLACEHOLDER.into()],
        }
    }

    /// Replace the argument template. `{input}` and `{output}` are substituted.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Check that the codec exists and can be executed.
    pub fn check(&self) -> Result<(), CodecError> {
        let meta = match std::fs::metadata(&self.program) {
            Ok(meta) if meta.is_file() => meta,
            _ => return Err(CodecError::NotFound(self.program.clone())),
        };
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if meta.permissions().mode() & 0o111 == 0 {
                return Err(CodecError::NotExecutable(self.program.clone()));
            }
        }
        #[cfg(not(unix))]
        let _ = meta;
        Ok(())
    }

    /// Write the IR for `properties` into `output_dir` and run the codec.
    ///
    /// On failure the staging file is removed so no partial save remains.
    pub fn emit(
        &self,
        properties: &PropertyMap,
        output_dir: impl AsRef<Path>,
    ) -> Result<EmitOutcome, CodecError> {
        let output_dir = output_dir.as_ref();
        self.check()?;
        check_output_dir(output_dir)?;

        let ir_path = output_dir.join(IR_FILE_NAME);
        let staging_path = output_dir.join(STAGING_FILE_NAME);
        let save_path = output_dir.join(SAVE_FILE_NAME);

        let bytes = IrDocument::new(properties).to_json()?;
        let ir_sha256 = sha256_hex(&bytes);
        std::fs::write(&ir_path, &bytes)?;
        debug!(path = %ir_path.display(), sha256 = %ir_sha256, "wrote IR document");

        discard(&staging_path);
        if let Err(e) = self
            .run(&ir_path, &staging_path)
            .and_then(|()| Ok(std::fs::rename(&staging_path, &save_path)?))
        {
            discard(&staging_path);
            return Err(e);
        }
        info!(
            path = %save_path.display(),
            properties = properties.len(),
            ir_sha256 = %ir_sha256,
            "save file written"
        );
        Ok(EmitOutcome {
            ir_path,
            save_path,
            ir_sha256,
        })
    }

    fn run(&self, input: &Path, output: &Path) -> Result<(), CodecError> {
        let args: Vec<OsString> = self
            .args
            .iter()
            .map(|arg| expand_arg(arg, input, output))
            .collect();
        debug!(program = %self.program.display(), ?args, "invoking codec");

        let out = Command::new(&self.program).args(&args).output()?;
        let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
        if !out.status.success() {
            return Err(CodecError::Invocation {
                status: out.status,
                stdout,
                stderr,
            });
        }
        if !stdout.trim().is_empty() {
            debug!(stdout = %stdout.trim(), "codec output");
        }
        if !output.is_file() {
            return Err(CodecError::MissingOutput(output.to_path_buf()));
        }
        Ok(())
    }
}

/// Emit with the default `codec <ir> <output>` invocation.
pub fn emit(
    codec_path: impl Into<PathBuf>,
    properties: &PropertyMap,
    output_dir: impl AsRef<Path>,
) -> Result<EmitOutcome, CodecError> {
    CodecInvoker::new(codec_path).emit(properties, output_dir)
}

fn check_output_dir(dir: &Path) -> Result<(), CodecError> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => Ok(()),
        _ => Err(CodecError::OutputNotWritable(dir.to_path_buf())),
    }
}

fn expand_arg(arg: &str, input: &Path, output: &Path) -> OsString {
    match arg {
        INPUT_PLACEHOLDER => input.as_os_str().to_owned(),
        OUTPUT_PLACEHOLDER => output.as_os_str().to_owned(),
        _ => arg
            .replace(INPUT_PLACEHOLDER, &input.to_string_lossy())
            .replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy())
            .into(),
    }
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "could not remove partial output");
        }
    }
}
