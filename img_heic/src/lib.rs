pub mod batch;
pub mod convert;
pub mod desktop;
pub mod errors;
pub mod logging;
pub mod progress;
pub mod report;

pub use batch::{
    collect_jpeg_files, destination_path, run_batch, BatchConfig, BatchOutcome, BatchResult,
    JPEG_EXTENSIONS,
};
pub use convert::{convert_to_heic, ConversionOutput, HeicCodec, DEFAULT_QUALITY};
pub use desktop::{ensure_output_dir, resolve_desktop_dir};
pub use errors::{ImgHeicError, Result};
pub use report::print_summary_report;
