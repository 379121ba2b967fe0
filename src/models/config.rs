// === Storage Constants ===
pub mod storage {
    pub const HABIT_BASE_STORAGE: u64 = 192;
    pub const HABIT_MAX_STORAGE: u64 = 32768;
    pub const TASK_BASE_STORAGE: u64 = 192;
    pub const TASK_MAX_STORAGE: u64 = 2048;
    pub const PROJECT_BASE_STORAGE: u64 = 384;
    pub const PROJECT_MAX_STORAGE: u64 = 65536;
    pub const NOTE_BASE_STORAGE: u64 = 128;
    pub const NOTE_MAX_STORAGE: u64 = 8192;
}

// === Text Limits ===
pub mod text {
    pub const MAX_NAME_LENGTH: usize = 256;
    pub const MAX_DESCRIPTION_LENGTH: usize = 1024;
    pub const MAX_NOTE_CONTENT_LENGTH: usize = 4096;
    pub const MAX_COLOR_LENGTH: usize = 32;
}

// === Scoring Constants ===
pub mod scoring {
    /// Flat deduction per failed task, independent of configured point values.
    pub const TASK_FAILURE_PENALTY: u32 = 2;

    /// Completion bonus is stage points / COMPLETION_BONUS_DIVISOR, rounded
    /// (20% of earned stage points).
    pub const COMPLETION_BONUS_DIVISOR: u64 = 5;

    pub const DEFAULT_POINTS_PER_HABIT: u32 = 10;
    pub const DEFAULT_POINTS_PER_TASK: u32 = 5;
    pub const DEFAULT_POINTS_PER_PROJECT_STAGE: u32 = 20;

    pub const DEFAULT_LEVEL_THRESHOLDS: [u32; 9] =
        [100, 250, 500, 1000, 2000, 3500, 5000, 7500, 10000];
}
