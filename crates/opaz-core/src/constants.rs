//! Protocol constants shared by native and script plugins.

/// Return values of `canDo`.
pub mod can_do {
    /// The plugin supports the feature.
    pub const YES: i32 = 1;
    /// The plugin does not support the feature.
    pub const NO: i32 = -1;
    /// The plugin does not know.
    pub const MAYBE: i32 = 0;
}

/// Values of `getPlugCategory`.
pub mod plug_category {
    /// Unknown, category not implemented.
    pub const UNKNOWN: i32 = 0;
    /// Simple effect.
    pub const EFFECT: i32 = 1;
    /// Instrument.
    pub const SYNTH: i32 = 2;
    /// Scope, tuner, analyzer.
    pub const ANALYSIS: i32 = 3;
    /// Dynamics.
    pub const MASTERING: i32 = 4;
    /// Panner.
    pub const SPACIALIZER: i32 = 5;
    /// Delay, reverb.
    pub const ROOM_FX: i32 = 6;
    /// Dedicated surround processor.
    pub const SURROUND_FX: i32 = 7;
    /// Denoiser.
    pub const RESTORATION: i32 = 8;
    /// Offline processor.
    pub const OFFLINE_PROCESS: i32 = 9;
    /// Container of several plugins.
    pub const SHELL: i32 = 10;
    /// Tone generator.
    pub const GENERATOR: i32 = 11;
}

/// Values of `setProcessPrecision`.
pub mod precision {
    /// Single precision (`processReplacing`).
    pub const SINGLE: i32 = 0;
    /// Double precision (`processDoubleReplacing`).
    pub const DOUBLE: i32 = 1;
}

/// Flags of [`PinProperties`](crate::PinProperties).
pub mod pin_flags {
    /// Pin is active.
    pub const IS_ACTIVE: i32 = 1;
    /// Pin is the first of a stereo pair.
    pub const IS_STEREO: i32 = 1 << 1;
    /// `arrangement_type` is valid.
    pub const USE_SPEAKER: i32 = 1 << 2;
}

/// Protocol version reported by `getVstVersion` unless a plugin overrides it.
pub const VST_VERSION: i32 = 2400;
