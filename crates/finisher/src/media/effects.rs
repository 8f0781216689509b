//! Fade filter graph construction.

use crate::config::EffectsConfig;

/// Build the `-vf` chain for `config` applied to a clip of `duration_secs`.
///
/// The fade-out ends exactly at the clip's end: it starts at
/// `duration - fade_out`, clamped at zero for clips shorter than the fade.
/// Returns `None` when every fade is disabled.
pub fn build_filter_graph(config: &EffectsConfig, duration_secs: f64) -> Option<String> {
    let mut filters = Vec::with_capacity(2);

    if config.fade_in_secs > 0.0 {
        filters.push(format!("fade=t=in:st=0:d={}", trim(config.fade_in_secs)));
    }

    if config.fade_out_secs > 0.0 {
        let start = fade_out_start(duration_secs, config.fade_out_secs);
        filters.push(format!(
            "fade=t=out:st={}:d={}",
            trim(start),
            trim(config.fade_out_secs)
        ));
    }

    if filters.is_empty() {
        None
    } else {
        Some(filters.join(","))
    }
}

pub fn fade_out_start(duration_secs: f64, fade_out_secs: f64) -> f64 {
    (duration_secs - fade_out_secs).max(0.0)
}

/// Millisecond precision without trailing zeros.
fn trim(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() { "0".to_string() } else { s.to_string() }
}
