//! Hand-off of a file to whatever actually prints it.
use std::io;
use std::path::Path;
use std::process::Command;

use tracing::debug;

/// Something that accepts one file per call and queues it for printing
pub trait Spooler {
    fn submit(&mut self, path: &Path) -> io::Result<()>;
}

/// Runs an external command with the file path appended as the last argument
#[derive(Debug, Clone)]
pub struct CommandSpooler {
    program: String,
    args: Vec<String>,
}

impl CommandSpooler {
    /// `command[0]` is the program, the rest are leading arguments
    pub fn new(command: &[String]) -> io::Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "print command is empty")
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Spooler for CommandSpooler {
    fn submit(&mut self, path: &Path) -> io::Result<()> {
        debug!("Running {} {:?} {:?}", self.program, self.args, path);
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        assert!(CommandSpooler::new(&[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_maps_to_result() {
        let mut ok = CommandSpooler::new(&["true".to_string()]).unwrap();
        assert!(ok.submit(Path::new("x.pdf")).is_ok());
        let mut failing = CommandSpooler::new(&["false".to_string()]).unwrap();
        assert!(failing.submit(Path::new("x.pdf")).is_err());
    }
}
