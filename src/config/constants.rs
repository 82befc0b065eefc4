// * Configuration Constants
// * Central location for endpoints, defaults and encoder parameters

// * Gallery listing endpoint (query string is appended by network::endpoint)
pub const DEFAULT_API_URL: &str = "https://civitai.com/api/v1/images";

// * Environment variable that overrides/supplies --api-key
pub const API_KEY_ENV: &str = "CIVITAI_API_KEY";

// * Default sort order of the listing
pub const DEFAULT_SORT: &str = "Newest";

// * Persistence workers per page
pub const DEFAULT_WORKERS: usize = 4;

// * Page fetch attempts (first try included) before the run is aborted
pub const FETCH_ATTEMPTS: u32 = 3;

// * Fixed delay between page fetch attempts
pub const FETCH_RETRY_DELAY_SECS: u64 = 30;

// * Ledger of saved URLs, relative to the output directory
pub const LEDGER_FILE_NAME: &str = "downloaded.log";

// * JPEG quality for transcoded rasters
pub const JPEG_QUALITY: u8 = 75;

// * AVIF quality when --compress is set (lossy)
pub const AVIF_QUALITY_COMPRESSED: u8 = 70;

// * AVIF quality without --compress: the highest the encoder offers (near-lossless, ravif has no lossless mode)
pub const AVIF_QUALITY_MAX: u8 = 100;

// * ravif speed preset (1 = slowest/best, 10 = fastest)
pub const AVIF_SPEED: u8 = 6;
