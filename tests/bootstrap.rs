use notes_core::{ConfigLoader, ConfigPaths, LoadStatus, NotesApp};
use tempfile::TempDir;

#[test]
fn bootstrap_creates_config_and_opens_file_backend() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let loader = ConfigLoader::with_paths(ConfigPaths::rooted(temp.path()));
    let (mut app, status) = NotesApp::bootstrap(&loader)?;
    assert_eq!(status, LoadStatus::Missing);
    assert!(loader.paths().config_file.exists());
    assert!(notes_core::logging::init_tracing("info"));

    app.submit("first run")?;
    assert!(loader.paths().data_dir.join("notes.json").exists());

    let (reopened, status) = NotesApp::bootstrap(&loader)?;
    assert_eq!(status, LoadStatus::Loaded { count: 1, dropped: 0 });
    assert_eq!(reopened.count(), 1);
    Ok(())
}
