use crate::cli::GlobalFlags;
use crate::context::AppContext;

/// Compute effective limit with precedence: global flag -> configured default.
#[must_use]
pub fn effective_limit(global: Option<u32>, fallback: u32) -> usize {
    global.unwrap_or(fallback) as usize
}

/// Keep the first `--limit` rows of a list result.
#[must_use]
pub fn limited<T>(mut rows: Vec<T>, ctx: &AppContext, flags: &GlobalFlags) -> Vec<T> {
    rows.truncate(effective_limit(flags.limit, ctx.config.general.default_limit));
    rows
}
