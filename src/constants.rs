//! Application constants for the feature pipeline
//!
//! Numeric policies, default extraction patterns, unit markers and the
//! domain vocabularies shared by transformers and the built-in recipe.

// =============================================================================
// Extraction Patterns
// =============================================================================

/// Default numeric pattern: first unsigned decimal number.
///
/// Unsigned on purpose so that ranges such as "2.0-4.5V" yield two values.
pub const DEFAULT_NUMBER_PATTERN: &str = r"\d+(?:\.\d+)?";

/// Integer-only pattern used for counts such as cycle numbers
pub const INTEGER_PATTERN: &str = r"(\d+)";

/// Default number of decimal places for float outputs
pub const DEFAULT_ROUND_DIGITS: u32 = 2;

/// Decimal places for composition fractions
pub const FRACTION_ROUND_DIGITS: u32 = 4;

/// Separator between a rule prefix and a column label
pub const LABEL_SEPARATOR: &str = "_";

// =============================================================================
// Percentage Normalization
// =============================================================================

/// Thresholds of the three-branch percentage policy
pub mod percentage {
    /// Values at or below this are fractions and are scaled by 100
    pub const FRACTION_CEILING: f64 = 1.0;

    /// Values strictly above this (and below `OVERSCALE_CEILING`) were scaled twice
    pub const OVERSCALE_FLOOR: f64 = 100.0;

    /// Upper bound (exclusive) of the overscaled band
    pub const OVERSCALE_CEILING: f64 = 10_000.0;

    /// Factor applied in both rescaling branches
    pub const SCALE: f64 = 100.0;
}

// =============================================================================
// Unit Markers
// =============================================================================

/// Temperature and duration markers recognised in free text
pub mod units {
    /// Offset between Celsius and Kelvin
    pub const KELVIN_OFFSET: f64 = 273.15;

    /// Duration markers (English and Chinese) that disqualify an adjacent
    /// number from being read as a temperature
    pub const DURATION_MARKER_PATTERN: &str = r"(?i)(\d+(?:\.\d+)?)\s*(?:hours?|hrs?|h\b|minutes?|mins?\b|days?|d\b|seconds?|secs?|s\b|小时|分钟|天|秒)";

    /// Heating or cooling rates ("5 °C/min", "2 K per min"), never a temperature
    pub const RATE_MARKER_PATTERN: &str = r"(?i)(\d+(?:\.\d+)?)\s*(?:°\s*C|℃|°\s*F|℉|oC|K|C|F)\s*(?:/|per\s+)\s*(?:minutes?|mins?|hours?|hrs?|h|seconds?|secs?|s)\b";

    /// Temperature marker following a number, capture 1 is the value and
    /// capture 2 the unit
    pub const TEMPERATURE_PATTERN: &str =
        r"(\d+(?:\.\d+)?)\s*(°\s*C|℃|°\s*F|℉|oC|K\b|C\b|F\b|摄氏度|度)?";
}

// =============================================================================
// Vocabularies
// =============================================================================

/// All chemical element symbols, ordered by atomic number
pub const CHEMICAL_ELEMENT_SYMBOLS: &[&str] = &[
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Prediction targets of the cathode-material dataset
pub mod targets {
    pub const CAPACITY: &str = "capacity(mAh/g)";
    pub const CAPACITY_RETENTION: &str = "capacity_retention(%)";
    pub const FIRST_COULOMBIC_EFFICIENCY: &str = "first_coulombic_efficiency(%)";

    pub const ALL: &[&str] = &[CAPACITY, CAPACITY_RETENTION, FIRST_COULOMBIC_EFFICIENCY];
}

/// Check whether a symbol is a known chemical element
pub fn is_element_symbol(symbol: &str) -> bool {
    CHEMICAL_ELEMENT_SYMBOLS.contains(&symbol)
}

/// Round a value to the given number of decimal places
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_vocabulary() {
        assert_eq!(CHEMICAL_ELEMENT_SYMBOLS.len(), 118);
        assert!(is_element_symbol("Li"));
        assert!(is_element_symbol("Og"));
        assert!(!is_element_symbol("Xx"));
        assert!(!is_element_symbol("li"));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.235001, 2), 1.24);
        assert_eq!(round_to(7.0, 0), 7.0);
    }

    #[test]
    fn test_targets_are_distinct() {
        let mut names = targets::ALL.to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 3);
    }
}
