//! Answers given by optional capabilities a plugin does not implement.
//!
//! Most optional capabilities answer zero, `false`, an empty value or
//! nothing. The few that answer something else are collected here so that
//! every [`VstPlugin`](crate::VstPlugin) implementation falls back to the
//! same values.

/// `getVstVersion`.
pub const VST_VERSION: i32 = crate::constants::VST_VERSION;

/// `canParameterBeAutomated`.
pub const CAN_PARAMETER_BE_AUTOMATED: bool = true;

/// `getNumCategories`.
pub const NUM_CATEGORIES: i32 = 1;

/// `setTotalSampleToProcess` echoes the value it was given.
#[must_use]
pub const fn total_sample_to_process(value: i32) -> i32 {
    value
}
