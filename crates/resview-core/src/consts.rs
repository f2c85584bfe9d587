/// Default number of decimal places shown for numeric cells.
pub const DEFAULT_NUMERIC_PRECISION: u32 = 6;

/// Upper bound for the numeric precision toolbar stepper.
pub const MAX_NUMERIC_PRECISION: u32 = 16;

/// Minimum item count to filter a store by kind with Rayon.
pub const PARALLEL_ITEM_THRESHOLD: usize = 16_384;

/// Separator inserted between digit groups when number formatting is on (thin space).
pub const DIGIT_GROUP_SEPARATOR: char = '\u{2009}';

/// Run id assigned to items that appear before any `run` line.
pub const DEFAULT_RUN_ID: &str = "default";

/// Persisted view-state keys.
pub const KEY_ACTIVE_TAB: &str = "activeTab";
pub const KEY_FORMAT_NUMBERS: &str = "formatNumbers";
pub const KEY_NUMERIC_PRECISION: &str = "numericPrecision";
pub const KEY_SHOW_FIELDS_AS_SCALARS: &str = "showFieldsAsScalars";
