use log::info;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq)]
pub struct VideoFile {
    pub path: PathBuf,
    pub name: String,
}

fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Lists the regular files in `video_dir` whose extension is in `extensions`,
/// in the order the platform returns them.
pub fn scan_video_files(video_dir: &Path, extensions: &[String]) -> Result<Vec<VideoFile>, String> {
    if !video_dir.exists() {
        return Err(format!(
            "Video directory does not exist: {}",
            video_dir.display()
        ));
    }

    let mut files = Vec::new();

    for entry in fs::read_dir(video_dir).map_err(|e| e.to_string())? {
        let entry = entry.map_err(|e| e.to_string())?;
        let path_buf = entry.path();
        if !path_buf.is_file() || !has_allowed_extension(&path_buf, extensions) {
            continue;
        }
        if let Some(file_name) = path_buf.file_name().and_then(|n| n.to_str()) {
            files.push(VideoFile {
                name: file_name.to_string(),
                path: path_buf.clone(),
            });
        }
    }

    Ok(files)
}

/// Picks the `position`-th (1-based) matching file of the directory listing.
pub fn locate_source(
    video_dir: &Path,
    extensions: &[String],
    position: usize,
) -> Result<VideoFile, String> {
    let shown = dunce::canonicalize(video_dir).unwrap_or_else(|_| video_dir.to_path_buf());
    info!("Looking for videos in {}", shown.display());

    let files = scan_video_files(video_dir, extensions)?;
    if position == 0 || files.len() < position {
        return Err(format!(
            "Not enough video files in {}: found {}, need {}",
            shown.display(),
            files.len(),
            position
        ));
    }

    let selected = files[position - 1].clone();
    info!("Selected video #{}: {}", position, selected.path.display());
    Ok(selected)
}
