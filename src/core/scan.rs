use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use std::path::Path;

use crate::consts::IMAGE_EXTENSIONS;

/// Recursively find image files under `base`, returned as sorted paths
/// relative to `base` with `/` separators.
pub(crate) fn find_images(base: &Path) -> Vec<String> {
    let escaped = glob::Pattern::escape(&base.to_string_lossy());
    let mut found = BTreeSet::new();

    for ext in IMAGE_EXTENSIONS {
        let pattern = format!("{escaped}/**/*.{ext}");
        let Ok(paths) = glob::glob(&pattern) else {
            tracing::warn!("Invalid glob pattern: {pattern}");
            continue;
        };
        for path in paths.flatten() {
            if !path.is_file() {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(base) {
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                found.insert(parts.join("/"));
            }
        }
    }

    found.into_iter().collect()
}

/// Deterministically shuffle a file list
pub(crate) fn shuffle(files: &mut [String], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    files.shuffle(&mut rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_images_recursively_and_skips_others() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("series1")).unwrap();
        fs::write(root.join("b.png"), b"x").unwrap();
        fs::write(root.join("a.dcm"), b"x").unwrap();
        fs::write(root.join("series1").join("c.jpg"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();

        assert_eq!(find_images(root), vec!["a.dcm", "b.png", "series1/c.jpg"]);
    }

    #[test]
    fn empty_directory_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_images(dir.path()).is_empty());
    }

    #[test]
    fn shuffle_is_deterministic_per_seed() {
        let original: Vec<String> = (0..20).map(|i| format!("{i:02}.png")).collect();
        let mut a = original.clone();
        let mut b = original.clone();
        shuffle(&mut a, 4);
        shuffle(&mut b, 4);
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, original);
    }
}
