use std::path::Path;

const SHORT_HASH_LEN: usize = 8;

/// 來源路徑的 BLAKE3 雜湊（前 8 個十六進位字元），用來區分同名檔案
#[must_use]
pub fn short_path_hash(path: &Path) -> String {
    let hash = blake3::hash(path.as_os_str().as_encoded_bytes());
    hash.to_hex().as_str()[..SHORT_HASH_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_path_hash_is_stable() {
        let a = short_path_hash(Path::new("originalVideos/clip_a.mp4"));
        assert_eq!(a.len(), SHORT_HASH_LEN);
        assert_eq!(a, short_path_hash(Path::new("originalVideos/clip_a.mp4")));
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_short_path_hash_differs_by_directory() {
        assert_ne!(
            short_path_hash(Path::new("a/clip.mp4")),
            short_path_hash(Path::new("b/clip.mp4"))
        );
    }
}
