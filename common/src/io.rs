use std::fs;
use std::path::Path;

pub fn create_parent_directories(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent_path) = path.parent() {
        // Bare file names have an empty parent
        if parent_path.as_os_str().is_empty() {
            return Ok(());
        }
        return fs::create_dir_all(parent_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_nested_directories() {
        let root = env::temp_dir().join(format!("common-io-{}", std::process::id()));
        let file = root.join("a").join("b").join("records.csv");

        create_parent_directories(&file).unwrap();
        assert!(root.join("a").join("b").is_dir());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_bare_file_name() {
        assert!(create_parent_directories(Path::new("records.csv")).is_ok());
    }
}
