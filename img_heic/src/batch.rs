//! Batch Processing Module
//!
//! Recursive JPEG discovery and the sequential per-file conversion loop.
//! Every per-file failure is contained in its own loop iteration; only
//! filesystem errors around the output directory abort the run.

use crate::convert::{convert_to_heic, HeicCodec};
use crate::desktop;
use crate::errors::Result;
use crate::progress::BatchProgressBar;
use console::style;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use walkdir::WalkDir;

pub const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively collect every `.jpg`/`.jpeg` file under `dir`, any case,
/// any depth. Sorted so run order (and the outcome of base-name
/// collisions) is stable across platforms.
pub fn collect_jpeg_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_extension(e.path(), JPEG_EXTENSIONS))
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    files
}

/// Destination for one source file: same base name, `.heic` extension,
/// flat under `output_dir`. Two sources with the same base name map to the
/// same destination and the later one wins; the suite pins that behavior.
pub fn destination_path(src: &Path, output_dir: &Path) -> PathBuf {
    let name = src.file_name().unwrap_or_default();
    output_dir.join(name).with_extension("heic")
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, input_bytes: u64, output_bytes: u64) {
        self.total += 1;
        self.succeeded += 1;
        self.input_bytes += input_bytes;
        self.output_bytes += output_bytes;
    }

    pub fn fail(&mut self, path: PathBuf, error: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push((path, error));
    }

    pub fn skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    /// None resolves to the desktop `heic` folder at run time. Tests and
    /// the `--output` flag inject their own destination here.
    pub output_dir: Option<PathBuf>,
    pub quality: u8,
    /// Suppresses the progress bar and per-file console lines (JSON mode).
    pub quiet: bool,
    pub verbose: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: None,
            quality: crate::convert::DEFAULT_QUALITY,
            quiet: false,
            verbose: false,
        }
    }
}

#[derive(Debug)]
pub enum BatchOutcome {
    /// Discovery matched nothing; no output directory was created.
    NoFilesFound,
    Completed {
        result: BatchResult,
        output_dir: PathBuf,
        elapsed: Duration,
    },
}

/// Convert every discovered JPEG under `config.input_dir`, sequentially.
///
/// Discovery runs before the output directory is touched, so an input with
/// zero matches leaves the filesystem unchanged.
pub fn run_batch(codec: &HeicCodec, config: &BatchConfig) -> Result<BatchOutcome> {
    let start = Instant::now();

    let files = collect_jpeg_files(&config.input_dir);
    if files.is_empty() {
        return Ok(BatchOutcome::NoFilesFound);
    }

    let output_dir = match &config.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => desktop::ensure_output_dir()?,
    };

    if !config.quiet {
        println!("Found {} JPEG files.", files.len());
        println!("Converting to HEIC in: {}\n", output_dir.display());
    }
    info!(
        input = %config.input_dir.display(),
        output = %output_dir.display(),
        count = files.len(),
        quality = config.quality,
        "starting batch conversion"
    );

    let mut result = BatchResult::new();
    let pb = if config.quiet {
        BatchProgressBar::hidden(files.len() as u64)
    } else {
        BatchProgressBar::new(files.len() as u64, "Converting")
    };

    for src in &files {
        let name = src.file_name().unwrap_or_default().to_string_lossy();
        pb.set_message(name.to_string());

        let dst = destination_path(src, &output_dir);
        match convert_to_heic(codec, src, &dst, config.quality) {
            Ok(output) => {
                result.success(output.input_size, output.output_size);
                info!(src = %src.display(), dst = %dst.display(), "converted");
                if !config.quiet {
                    let line = if config.verbose {
                        format!(
                            "{} {} → {} ({} → {})",
                            style("✔").green(),
                            name,
                            dst.file_name().unwrap_or_default().to_string_lossy(),
                            crate::report::format_bytes(output.input_size),
                            crate::report::format_bytes(output.output_size),
                        )
                    } else {
                        format!(
                            "{} {} → {}",
                            style("✔").green(),
                            name,
                            dst.file_name().unwrap_or_default().to_string_lossy(),
                        )
                    };
                    pb.println(&line);
                }
            }
            Err(e) if e.is_unreadable() => {
                result.skip();
                warn!(src = %src.display(), "skipped unreadable file");
                if !config.quiet {
                    pb.println(&format!(
                        "{} Skipped unreadable file: {}",
                        style("✖").yellow(),
                        name
                    ));
                }
            }
            Err(e) => {
                warn!(src = %src.display(), error = %e, "conversion failed");
                if !config.quiet {
                    pb.println(&format!(
                        "{} Failed to convert {}: {}",
                        style("✖").red(),
                        name,
                        e
                    ));
                }
                result.fail(src.clone(), e.to_string());
            }
        }
        pb.inc();
    }
    pb.finish_with_message("Complete!");

    Ok(BatchOutcome::Completed {
        result,
        output_dir,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use img_parts::ImageEXIF;
    use tempfile::TempDir;

    fn write_test_jpeg(path: &Path) {
        let img = image::RgbImage::from_pixel(10, 10, image::Rgb([200, 60, 10]));
        img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
    }

    fn write_test_jpeg_with_exif(path: &Path, exif: &[u8]) {
        let img = image::RgbImage::from_pixel(10, 10, image::Rgb([40, 90, 220]));
        let mut encoded = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut encoded),
            image::ImageFormat::Jpeg,
        )
        .unwrap();
        let mut jpeg = img_parts::jpeg::Jpeg::from_bytes(encoded.into()).unwrap();
        jpeg.set_exif(Some(exif.to_vec().into()));
        let mut out = Vec::new();
        jpeg.encoder().write_to(&mut out).unwrap();
        fs::write(path, out).unwrap();
    }

    fn quiet_config(input: &Path, output: &Path) -> BatchConfig {
        BatchConfig {
            input_dir: input.to_path_buf(),
            output_dir: Some(output.to_path_buf()),
            quiet: true,
            ..BatchConfig::default()
        }
    }

    #[test]
    fn test_has_extension_case_insensitive() {
        assert!(has_extension(Path::new("a.jpg"), JPEG_EXTENSIONS));
        assert!(has_extension(Path::new("a.JPG"), JPEG_EXTENSIONS));
        assert!(has_extension(Path::new("a.jpeg"), JPEG_EXTENSIONS));
        assert!(has_extension(Path::new("a.JpEg"), JPEG_EXTENSIONS));
        assert!(!has_extension(Path::new("a.png"), JPEG_EXTENSIONS));
        assert!(!has_extension(Path::new("a.jpg.txt"), JPEG_EXTENSIONS));
        assert!(!has_extension(Path::new("noext"), JPEG_EXTENSIONS));
    }

    #[test]
    fn test_collect_jpeg_files_recursive() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("x/y/z");
        fs::create_dir_all(&deep).unwrap();

        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("b.JPEG"), b"x").unwrap();
        fs::write(deep.join("c.jpeg"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(deep.join("image.png"), b"x").unwrap();
        // A directory whose name matches the pattern must not be selected.
        fs::create_dir(dir.path().join("folder.jpg")).unwrap();

        let files = collect_jpeg_files(dir.path());
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.is_file()));
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted, "discovery output must be sorted");
    }

    #[test]
    fn test_collect_jpeg_files_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(collect_jpeg_files(dir.path()).is_empty());
    }

    #[test]
    fn test_destination_path() {
        let out = Path::new("/out");
        assert_eq!(
            destination_path(Path::new("/in/sub/pic.jpg"), out),
            Path::new("/out/pic.heic")
        );
        assert_eq!(
            destination_path(Path::new("/in/pic.holiday.JPEG"), out),
            Path::new("/out/pic.holiday.heic")
        );
    }

    #[test]
    fn test_destination_path_collision() {
        // Known invariant gap: same base name in different subdirectories
        // maps to one destination.
        let out = Path::new("/out");
        assert_eq!(
            destination_path(Path::new("/in/a/pic.jpg"), out),
            destination_path(Path::new("/in/b/pic.jpg"), out),
        );
    }

    #[test]
    fn test_batch_result_counters() {
        let mut result = BatchResult::new();
        result.success(1000, 400);
        result.success(2000, 800);
        result.fail(PathBuf::from("bad.jpg"), "boom".to_string());
        result.skip();

        assert_eq!(result.total, 4);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.input_bytes, 3000);
        assert_eq!(result.output_bytes, 1200);
        assert_eq!(result.errors.len(), 1);
        assert!((result.success_rate() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_batch_result_empty_success_rate() {
        assert!((BatchResult::new().success_rate() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_run_batch_mixed_directory() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let out = output.path().join("heic");

        write_test_jpeg(&input.path().join("a.jpg"));
        write_test_jpeg_with_exif(&input.path().join("b.jpeg"), b"exif-data");
        fs::write(input.path().join("notes.txt"), b"not an image").unwrap();
        fs::write(input.path().join("broken.jpg"), b"").unwrap();

        let codec = HeicCodec::new();
        let outcome = run_batch(&codec, &quiet_config(input.path(), &out)).unwrap();

        let BatchOutcome::Completed { result, output_dir, .. } = outcome else {
            panic!("expected a completed batch");
        };
        assert_eq!(output_dir, out);
        assert_eq!(result.total, 3, "notes.txt must not be discovered");
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.failed, 0);

        let a = out.join("a.heic");
        let b = out.join("b.heic");
        assert!(a.is_file() && fs::metadata(&a).unwrap().len() > 0);
        assert!(b.is_file() && fs::metadata(&b).unwrap().len() > 0);
        assert!(!out.join("broken.heic").exists());
    }

    #[test]
    fn test_run_batch_no_files_creates_nothing() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let out = output.path().join("heic");
        fs::write(input.path().join("notes.txt"), b"text only").unwrap();

        let codec = HeicCodec::new();
        let outcome = run_batch(&codec, &quiet_config(input.path(), &out)).unwrap();

        assert!(matches!(outcome, BatchOutcome::NoFilesFound));
        assert!(!out.exists(), "no output directory for an empty match set");
    }

    #[test]
    fn test_run_batch_isolates_failures() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let out = output.path().join("heic");

        // Sorted discovery order puts the broken file first; the valid one
        // after it must still convert.
        fs::write(input.path().join("0_broken.jpg"), b"garbage bytes").unwrap();
        write_test_jpeg(&input.path().join("1_ok.jpg"));

        let codec = HeicCodec::new();
        let outcome = run_batch(&codec, &quiet_config(input.path(), &out)).unwrap();

        let BatchOutcome::Completed { result, .. } = outcome else {
            panic!("expected a completed batch");
        };
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.skipped, 1);
        assert!(out.join("1_ok.heic").is_file());
    }
}
