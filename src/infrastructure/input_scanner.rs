//! 输入扫描器 - 基础设施层
//!
//! 只暴露"列出待处理文件"的能力，不关心 prompt 和输出

use crate::error::{AppResult, FileError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// 支持的扩展名（小写，不含点）
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["pdf", "jpg", "jpeg", "png", "webp"];

/// 输入扫描器
///
/// 职责：
/// - 递归遍历输入目录
/// - 过滤扩展名不在白名单内的文件
/// - 按路径字符串字典序返回，保证批次顺序稳定
#[derive(Debug, Clone, Default)]
pub struct InputScanner;

impl InputScanner {
    pub fn new() -> Self {
        Self
    }

    /// 扫描输入目录
    ///
    /// 目录不存在或不是目录时返回空列表；符号链接按其目标分类
    pub async fn scan(&self, input_root: &Path) -> AppResult<Vec<PathBuf>> {
        match fs::metadata(input_root).await {
            Err(_) => {
                debug!("输入目录不存在: {}", input_root.display());
                return Ok(Vec::new());
            }
            Ok(meta) if !meta.is_dir() => {
                warn!("输入路径不是目录，按空批次处理: {}", input_root.display());
                return Ok(Vec::new());
            }
            Ok(_) => {}
        }

        let mut files = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = vec![input_root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            // 符号链接成环时只遍历一次
            let real = fs::canonicalize(&dir).await.map_err(|e| scan_error(&dir, e))?;
            if !visited.insert(real) {
                continue;
            }

            let mut entries = fs::read_dir(&dir).await.map_err(|e| scan_error(&dir, e))?;

            while let Some(entry) = entries.next_entry().await.map_err(|e| scan_error(&dir, e))? {
                let path = entry.path();
                let meta = match fs::metadata(&path).await {
                    Ok(meta) => meta,
                    Err(e) => {
                        warn!("跳过无法访问的路径 {}: {}", path.display(), e);
                        continue;
                    }
                };

                if meta.is_dir() {
                    pending.push(path);
                } else if meta.is_file() && is_supported(&path) {
                    files.push(path);
                }
            }
        }

        files.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));

        debug!("扫描完成: {} 个文件", files.len());
        Ok(files)
    }
}

/// 扩展名是否在白名单内（大小写不敏感）
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn scan_error(path: &Path, source: std::io::Error) -> FileError {
    FileError::ScanFailed {
        path: path.display().to_string(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        stdfs::create_dir_all(path.parent().unwrap()).unwrap();
        stdfs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("a.PDF")));
        assert!(is_supported(Path::new("a.Jpeg")));
        assert!(!is_supported(Path::new("a.tiff")));
        assert!(!is_supported(Path::new("pdf")));
    }

    #[tokio::test]
    async fn test_scan_filters_and_sorts() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "b.pdf");
        touch(root, "a.JPG");
        touch(root, "sub/c.png");
        touch(root, "sub/deeper/d.webp");
        touch(root, "notes.txt");
        touch(root, "sub/data.csv");

        let files = InputScanner::new().scan(root).await.unwrap();

        let rel: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["a.JPG", "b.pdf", "sub/c.png", "sub/deeper/d.webp"]);
    }

    #[tokio::test]
    async fn test_scan_orders_by_path_string() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "a/z.pdf");
        touch(root, "a-b.pdf");

        let files = InputScanner::new().scan(root).await.unwrap();
        let mut expected = files.clone();
        expected.sort_by_key(|p| p.to_string_lossy().to_string());
        assert_eq!(files, expected);
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let files = InputScanner::new()
            .scan(&dir.path().join("missing"))
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scan_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let root = dir.path().join("in");
        touch(dir.path(), "real/r.pdf");
        touch(dir.path(), "realdir/a.pdf");
        stdfs::create_dir_all(&root).unwrap();
        symlink(dir.path().join("real/r.pdf"), root.join("link.pdf")).unwrap();
        symlink(dir.path().join("realdir"), root.join("linked_dir")).unwrap();
        // 指回自身的目录链接不会导致死循环
        symlink(&root, root.join("loop")).unwrap();
        // 悬空链接被跳过
        symlink(dir.path().join("nope.pdf"), root.join("dangling.pdf")).unwrap();

        let files = InputScanner::new().scan(&root).await.unwrap();

        let rel: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(rel, vec!["link.pdf", "linked_dir/a.pdf"]);
    }

    #[tokio::test]
    async fn test_root_that_is_a_file_is_empty() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "in.pdf");

        let files = InputScanner::new()
            .scan(&dir.path().join("in.pdf"))
            .await
            .unwrap();
        assert!(files.is_empty());
    }
}
