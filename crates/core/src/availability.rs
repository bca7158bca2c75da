//! Availability window checks.

use bridgemeta_common::Version;

use crate::context::ResolutionContext;
use crate::error::{CreationError, CreationResult};

/// Introduced/deprecated/obsoleted versions of one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailabilityWindow {
    pub introduced: Option<Version>,
    pub deprecated: Option<Version>,
    pub obsoleted: Option<Version>,
}

/// Reject entities outside the configured window.
///
/// Deprecation is checked against the target platform version, obsoletion
/// against the toolchain version. Unknown components act as wildcards, and a
/// fully unknown version on either side never rejects.
pub fn check(window: &AvailabilityWindow, ctx: &ResolutionContext) -> CreationResult<()> {
    if let Some(deprecated) = known(window.deprecated, &ctx.target_version)
        && ctx.target_version.is_at_or_after(&deprecated)
    {
        return Err(CreationError::skip(format!(
            "deprecated in {deprecated} (target {})",
            ctx.target_version
        )));
    }
    if let Some(obsoleted) = known(window.obsoleted, &ctx.toolchain_version)
        && ctx.toolchain_version.is_at_or_after(&obsoleted)
    {
        return Err(CreationError::skip(format!(
            "obsoleted in {obsoleted} (toolchain {})",
            ctx.toolchain_version
        )));
    }
    if let Some(introduced) = known(window.introduced, &ctx.target_version)
        && introduced.is_after(&ctx.target_version)
    {
        return Err(CreationError::skip(format!(
            "introduced in {introduced} (target {})",
            ctx.target_version
        )));
    }
    Ok(())
}

fn known(bound: Option<Version>, against: &Version) -> Option<Version> {
    bound.filter(|v| !v.is_unknown() && !against.is_unknown())
}
