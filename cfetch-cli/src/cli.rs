use clap::Parser;
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Fetch a URL through a persistent HTTP cache",
    long_about = "Fetch a URL and write the response body to stdout.\n\
                  \n\
                  Responses are cached on disk following HTTP caching rules: fresh\n\
                  responses are served without contacting the origin, stale ones are\n\
                  revalidated with conditional requests. The cache directory defaults to\n\
                  $CACHEABLE_STORAGE_PATH, or a directory under the system temp dir."
)]
pub struct CliArgs {
    /// URL to fetch
    #[arg(
        required_unless_present = "clear_cache",
        help = "Absolute http(s) URL to fetch"
    )]
    pub url: Option<String>,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET", help = "HTTP method to use")]
    pub method: String,

    /// Custom HTTP headers
    #[arg(
        short = 'H',
        long = "header",
        help = "Add a request header (format: 'Name: Value'). Can be used multiple times"
    )]
    pub headers: Vec<String>,

    /// Request body
    #[arg(
        short = 'd',
        long = "data",
        help = "Send this text as the request body"
    )]
    pub data: Option<String>,

    /// Cache directory
    #[arg(
        long,
        help = "Directory of the response cache (overrides CACHEABLE_STORAGE_PATH)"
    )]
    pub storage_path: Option<PathBuf>,

    /// Bypass the cache
    #[arg(long, help = "Neither read from nor write to the cache")]
    pub no_cache: bool,

    /// Remove every cached response
    #[arg(long, help = "Remove all cached responses before fetching")]
    pub clear_cache: bool,

    /// Print the response head
    #[arg(
        short = 'i',
        long,
        help = "Print the status line and response headers before the body"
    )]
    pub include: bool,

    /// Overall timeout in seconds
    #[arg(
        long,
        default_value = "30",
        help = "Overall timeout in seconds for HTTP requests (0 disables it)"
    )]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value = "10",
        help = "Connection timeout in seconds (time to establish initial connection)"
    )]
    pub connect_timeout: u64,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}
