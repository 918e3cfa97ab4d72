use std::error::Error;

/// Application-level error: an exit code, a message, and the ordered chain of
/// underlying cause descriptions.
///
/// Failures are reported by iterating `causes()`, never by unwinding past the
/// boundary where they were caught.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
    causes: Vec<String>,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Build an error whose cause list is the full `source()` chain of `err`.
    pub fn with_source(exit_code: u8, message: impl Into<String>, err: &dyn Error) -> Self {
        Self {
            exit_code,
            message: message.into(),
            causes: cause_chain(err),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// Message plus every cause, one per line, for stderr diagnostics.
    pub fn render_chain(&self) -> String {
        let mut out = self.message.clone();
        for cause in &self.causes {
            out.push_str("\n  caused by: ");
            out.push_str(cause);
        }
        out
    }
}

/// Collect `err` and every transitive source as display strings, outermost first.
pub fn cause_chain(err: &dyn Error) -> Vec<String> {
    let mut out = vec![err.to_string()];
    let mut current = err.source();
    while let Some(cause) = current {
        out.push(cause.to_string());
        current = cause.source();
    }
    out
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .field("causes", &self.causes)
            .finish()
    }
}

impl Error for AppError {}
