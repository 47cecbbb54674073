use std::{
    io::{Cursor, Write},
    process::{Command, Stdio},
    thread,
};

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::{
    errors::{FramekitError, Result},
    traits::FrameProcessor,
};

/// Background removal delegated to an external command.
///
/// Each frame is piped to the command as PNG on stdin and the cutout read
/// back from stdout, so model weights, GPU setup, and any first-use download
/// stay inside the tool. The default invocation is `rembg i`, which streams
/// stdin to stdout and fetches its model on first run.
#[derive(Debug)]
pub struct CommandRemover {
    program: String,
    args: Vec<String>,
}

impl CommandRemover {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Builds a remover from a whitespace-separated command line. Quoting is
    /// not interpreted.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or_else(|| FramekitError::Configuration {
            message: "background removal command is empty".to_string(),
        })?;
        Ok(Self::new(program).with_args(parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn failure(&self, detail: impl Into<String>) -> FramekitError {
        FramekitError::Removal {
            program: self.program.clone(),
            detail: detail.into(),
        }
    }

    fn invoke(&self, input: Vec<u8>) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| self.failure(format!("could not start: {error}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failure("exposed no stdin pipe"))?;
        // feed the frame from a second thread while draining stdout here,
        // otherwise a full pipe buffer stalls both processes
        let writer = thread::spawn(move || stdin.write_all(&input));

        let output = child
            .wait_with_output()
            .map_err(|error| self.failure(format!("did not run to completion: {error}")))?;
        let write_result = writer
            .join()
            .map_err(|_| self.failure("stdin writer panicked"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        write_result
            .map_err(|error| self.failure(format!("stopped reading the frame: {error}")))?;
        if output.stdout.is_empty() {
            return Err(self.failure("produced no output"));
        }
        Ok(output.stdout)
    }
}

impl Default for CommandRemover {
    fn default() -> Self {
        Self::new("rembg").with_args(["i"])
    }
}

impl FrameProcessor for CommandRemover {
    fn name(&self) -> &'static str {
        "background removal"
    }

    fn process_frame(&self, frame: &DynamicImage) -> Result<RgbaImage> {
        let mut encoded = Cursor::new(Vec::new());
        frame
            .write_to(&mut encoded, ImageFormat::Png)
            .map_err(|error| self.failure(format!("could not encode the frame: {error}")))?;
        let cutout = self.invoke(encoded.into_inner())?;
        let decoded = image::load_from_memory(&cutout)
            .map_err(|error| self.failure(format!("returned an undecodable image: {error}")))?;
        Ok(decoded.to_rgba8())
    }
}
