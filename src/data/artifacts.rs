use std::io;
use std::path::Path;

pub const MODEL_PREFIX: &str = "best_is_healthy_model_";
pub const MODEL_SUFFIX: &str = ".joblib";

/// Look for a trained-model file next to the data.
///
/// Returns the name of the lexicographically first file in `dir` (not
/// recursive) that starts with [`MODEL_PREFIX`] and ends with
/// [`MODEL_SUFFIX`].  The file is never opened.
pub fn discover_model_artifact(dir: &Path) -> io::Result<Option<String>> {
    let mut matches: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with(MODEL_PREFIX) && name.ends_with(MODEL_SUFFIX) {
            matches.push(name);
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}

/// One-line note for the dashboard footer.
pub fn artifact_note(found: Option<&str>) -> String {
    match found {
        Some(name) => format!(
            "Found trained model: {name}. You can extend this app to score new meals using the model."
        ),
        None => "No trained model artifact found in folder (optional).".to_string(),
    }
}
