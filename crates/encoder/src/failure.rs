//! Fatal diagnostics for the process boundary
//!
//! Library code returns [`EncoderError`] values. A binary that wants the
//! classic behavior (print, then exit with a failure status) hands them to
//! [`die_codec`], or calls [`die`] for its own precondition failures.

use std::fmt;
use std::io::{self, Write};

use crate::EncoderError;

/// Lines printed for a fatal condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    lines: Vec<String>,
}

impl Diagnostic {
    /// A plain message. A single trailing line break is dropped so that
    /// rendering adds exactly one.
    pub fn message(message: &str) -> Self {
        let message = message.strip_suffix('\n').unwrap_or(message);
        Self {
            lines: vec![message.to_string()],
        }
    }

    /// `context: primary error`, then the backend detail on its own
    /// indented line when there is one
    pub fn codec(err: &EncoderError) -> Self {
        let mut lines = vec![err.to_string()];
        if let Some(detail) = err.detail() {
            lines.push(format!("    {detail}"));
        }
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Write the diagnostic to `out` and flush it
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{self}")?;
        out.flush()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

fn emit_and_exit(diagnostic: &Diagnostic) -> ! {
    let _ = diagnostic.write_to(&mut io::stderr().lock());
    std::process::exit(1)
}

/// Print `message` and terminate with a failure status
pub fn die(message: &str) -> ! {
    emit_and_exit(&Diagnostic::message(message))
}

/// Print an encoder failure with its backend detail and terminate with a
/// failure status
pub fn die_codec(err: &EncoderError) -> ! {
    emit_and_exit(&Diagnostic::codec(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodecStatus;

    #[test]
    fn test_message_gets_one_line_break() {
        assert_eq!(
            Diagnostic::message("Invalid resolution: 15x16").to_string(),
            "Invalid resolution: 15x16\n"
        );
        assert_eq!(Diagnostic::message("done\n").to_string(), "done\n");
    }

    #[test]
    fn test_codec_failure_with_detail() {
        let err = EncoderError::InitFailed {
            status: CodecStatus::InvalidParam,
            detail: Some("g_w out of range".to_string()),
        };
        let diagnostic = Diagnostic::codec(&err);
        assert_eq!(
            diagnostic.lines(),
            &[
                "Failed to initialize encoder: Invalid parameter".to_string(),
                "    g_w out of range".to_string(),
            ]
        );
    }

    #[test]
    fn test_codec_failure_without_detail() {
        let err = EncoderError::DestroyFailed {
            status: CodecStatus::Error,
            detail: None,
        };
        assert_eq!(
            Diagnostic::codec(&err).to_string(),
            "Failed to destroy codec: Unspecified internal error\n"
        );
    }

    #[test]
    fn test_precondition_failure_renders_single_line() {
        let err = EncoderError::InvalidResolution {
            width: 15,
            height: 16,
        };
        assert_eq!(Diagnostic::codec(&err).lines().len(), 1);
    }

    #[test]
    fn test_written_once() {
        let err = EncoderError::EncodeFailed {
            status: CodecStatus::Error,
            detail: Some("out of bits".to_string()),
        };
        let mut out = Vec::new();
        Diagnostic::codec(&err).write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Failed to encode frame: Unspecified internal error\n    out of bits\n"
        );

        let mut out = Vec::new();
        Diagnostic::message("Invalid resolution: 15x16").write_to(&mut out).unwrap();
        assert_eq!(out, b"Invalid resolution: 15x16\n");
    }
}
