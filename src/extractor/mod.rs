pub mod exif_extractor;
pub mod output_manager;

pub use exif_extractor::{
    default_output_path, register, task_metadata, ExifExtractor, ExtractionPlan,
    ExtractionProgress, DEFAULT_TOOL, TASK_NAME,
};
pub use output_manager::{FsOutputAllocator, OutputAllocator, OutputFile};
