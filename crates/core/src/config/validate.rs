use super::{types::Config, ConfigError};

/// Room for the widest UTF-8 character.
const MIN_REQUEST_BYTES: usize = 4;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Stage timeouts are positive
/// - Speed factor and speaking pace are positive
/// - Narration request limit fits any single character
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    let timeouts = &config.pipeline.timeouts;
    for (name, secs) in [
        ("generation_secs", timeouts.generation_secs),
        ("synthesis_secs", timeouts.synthesis_secs),
        ("render_secs", timeouts.render_secs),
        ("mux_secs", timeouts.mux_secs),
    ] {
        if secs == 0 {
            return Err(invalid(format!("pipeline.timeouts.{} must be positive", name)));
        }
    }

    let speed = config.pipeline.speed_factor;
    if !speed.is_finite() || speed <= 0.0 {
        return Err(invalid(format!(
            "pipeline.speed_factor must be positive, got {}",
            speed
        )));
    }

    for (name, wps) in [
        ("content.words_per_second", config.content.words_per_second),
        ("narration.words_per_second", config.narration.words_per_second),
    ] {
        if !wps.is_finite() || wps <= 0.0 {
            return Err(invalid(format!("{} must be positive, got {}", name, wps)));
        }
    }

    if config.narration.max_request_bytes < MIN_REQUEST_BYTES {
        return Err(invalid(format!(
            "narration.max_request_bytes must be at least {}, got {}",
            MIN_REQUEST_BYTES, config.narration.max_request_bytes
        )));
    }

    if !config.storage.public_url_prefix.starts_with('/') {
        return Err(invalid("storage.public_url_prefix must start with '/'"));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
