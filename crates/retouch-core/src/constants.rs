/// Quality used when neither the environment nor the call provides one.
pub const DEFAULT_IMAGE_QUALITY: i64 = 90;

/// Highest lossless compression level understood by the encoders.
pub const MAX_COMPRESSION_LEVEL: u8 = 9;

/// Collection that imported resources land in unless the caller picks another.
pub const DEFAULT_COLLECTION: &str = "persistent";

/// Default number of entries kept by the image size cache.
pub const DEFAULT_SIZE_CACHE_CAPACITY: usize = 4096;
