/// Timestamp format embedded in backup file names: "20250115-093012"
pub(crate) const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Prefix shared by every automatic backup file
pub(crate) const BACKUP_PREFIX: &str = "auto_backup_";

/// Extension of automatic backup files
pub(crate) const BACKUP_EXTENSION: &str = "bak";

/// Image extensions picked up when scanning an image directory
pub(crate) const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tiff", "tif", "dcm", "dicom",
];

/// Seed used to shuffle newly scanned file lists
pub(crate) const DEFAULT_SHUFFLE_SEED: u64 = 4;

/// Delimiter separating the reference name from the rest of an image filename
pub(crate) const DEFAULT_REFERENCE_DELIMITER: &str = "__";

/// Name of the log file written under the configured log directory
pub(crate) const LOG_FILE_NAME: &str = "speedy_iqa.log";

/// Environment variable overriding the application home directory
pub(crate) const HOME_ENV: &str = "SPEEDY_IQA_HOME";

/// Environment variable overriding the stderr log filter
pub(crate) const LOG_ENV: &str = "SPEEDY_IQA_LOG";

/// Label shown for rating categories without a selection
pub(crate) const BLANK: &str = "Blank";
