use std::fs;
use std::path::Path;

pub const BYTES_IN_KILOBYTE: f64 = 1024.0;

/// Sum of the sizes of files named `*.{extension}` under `directory`, recursively.
pub fn total_size(directory: &Path, extension: &str) -> std::io::Result<u64> {
    let suffix = format!(".{extension}");

    let mut total = 0;
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            total += total_size(&entry.path(), extension)?;
        } else if entry.file_name().to_string_lossy().ends_with(&suffix) {
            total += entry.metadata()?.len();
        }
    }

    Ok(total)
}

pub fn report(directory: &str, extension: &str, bytes: u64) -> String {
    let kilobytes = bytes as f64 / BYTES_IN_KILOBYTE;

    format!(
        "Total size of all .{extension} files in '{directory}' and its subdirectories is {kilobytes:.2} kB."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_size_recursive() {
        let root = std::env::temp_dir().join(format!("tools-size-{}", std::process::id()));
        let nested = root.join("src").join("protocols");
        fs::create_dir_all(&nested).unwrap();

        fs::write(root.join("main.rs"), vec![b'a'; 100]).unwrap();
        fs::write(nested.join("tcp.rs"), vec![b'b'; 2000]).unwrap();
        fs::write(nested.join("notes.md"), vec![b'c'; 500]).unwrap();
        fs::write(root.join("Cargo.toml"), vec![b'd'; 50]).unwrap();

        assert_eq!(total_size(&root, "rs").unwrap(), 2100);
        assert_eq!(total_size(&root, "md").unwrap(), 500);
        assert_eq!(total_size(&root, "cs").unwrap(), 0);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let path = std::env::temp_dir().join("tools-size-missing").join("nowhere");
        assert!(total_size(&path, "rs").is_err());
    }

    #[test]
    fn test_report() {
        assert_eq!(
            report("src", "rs", 2100),
            "Total size of all .rs files in 'src' and its subdirectories is 2.05 kB."
        );
        assert_eq!(
            report("empty", "cs", 0),
            "Total size of all .cs files in 'empty' and its subdirectories is 0.00 kB."
        );
    }
}
