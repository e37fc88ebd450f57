use workbench_core::SessionSnapshot;
use workbench_engine::OutputDir;
use workbench_logging::{wb_error, wb_info, wb_warn};

pub const SESSION_FILENAME: &str = ".workbench_session.ron";

/// Reads the saved session; unreadable or corrupt files start a fresh one.
pub fn load_session(output: &OutputDir) -> Option<SessionSnapshot> {
    let content = match output.read_optional(SESSION_FILENAME) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(err) => {
            wb_warn!(
                "Failed to read saved session from {:?}: {}",
                output.path(),
                err
            );
            return None;
        }
    };

    match ron::from_str::<SessionSnapshot>(&content) {
        Ok(snapshot) => {
            wb_info!(
                "Restored session with {} messages from {:?}",
                snapshot.messages.len(),
                output.path()
            );
            Some(snapshot)
        }
        Err(err) => {
            wb_warn!("Failed to parse saved session in {:?}: {}", output.path(), err);
            None
        }
    }
}

pub fn save_session(output: &OutputDir, snapshot: &SessionSnapshot) {
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(snapshot, pretty) {
        Ok(text) => text,
        Err(err) => {
            wb_error!("Failed to serialize session: {}", err);
            return;
        }
    };
    if let Err(err) = output.write_atomic(SESSION_FILENAME, &content) {
        wb_error!("Failed to save session to {:?}: {}", output.path(), err);
    }
}
