use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the stderr `fmt` subscriber unless the host already has one.
/// Returns whether this crate's subscriber is the active one. Only the first
/// call has an effect.
pub fn init_tracing(level: &str) -> bool {
    static INSTALLED: OnceCell<bool> = OnceCell::new();
    *INSTALLED.get_or_init(|| {
        match fmt()
            .with_env_filter(env_filter(level))
            .with_writer(std::io::stderr)
            .try_init()
        {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "tracing subscriber already installed, keeping it");
                false
            }
        }
    })
}

/// An unparseable directive falls back to `info`.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_directives_and_falls_back_to_info() {
        assert_eq!(env_filter("debug").to_string(), "debug");
        assert_eq!(env_filter("notes_core=verbose").to_string(), "info");
    }
}
