use anyhow::Result;
use ffmpeg_next::util::log::{self as av_log, Level};
use tracing_subscriber::EnvFilter;

/**
    Install the stderr log subscriber and match FFmpeg's own log level to it.

    `RUST_LOG` overrides the level picked from the `-v` count.
*/
pub fn init(verbose: u8) -> Result<()> {
    let (directive, av_level) = match verbose {
        0 => ("warn", Level::Error),
        1 => ("info", Level::Warning),
        _ => ("debug", Level::Info),
    };

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directive))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    av_log::set_level(av_level);
    Ok(())
}
