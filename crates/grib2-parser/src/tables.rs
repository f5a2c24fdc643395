//! GRIB2 parameter lookup tables.
//!
//! Translates GRIB2 numeric codes (discipline, category, number) into
//! short names and parameter identifiers, and back again for encoding.
//!
//! Tables start from a built-in set of surface parameters and can be
//! extended from configuration without code changes.

use std::collections::HashMap;

/// Lookup key for parameter: (discipline, category, number)
pub type ParamKey = (u8, u8, u8);

/// One parameter of the lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterEntry {
    /// Short name (e.g., "2t", "10u")
    pub short_name: String,
    /// Numeric parameter identifier (e.g., 167 for 2m temperature)
    pub param_id: u32,
    pub discipline: u8,
    pub category: u8,
    pub number: u8,
}

impl ParameterEntry {
    pub fn new(short_name: &str, param_id: u32, discipline: u8, category: u8, number: u8) -> Self {
        Self {
            short_name: short_name.to_string(),
            param_id,
            discipline,
            category,
            number,
        }
    }

    pub fn key(&self) -> ParamKey {
        (self.discipline, self.category, self.number)
    }
}

/// GRIB2 parameter lookup tables.
///
/// Passed to the GRIB2 reader to translate numeric codes into short names,
/// and to the writer to translate parameter identifiers into codes.
#[derive(Debug, Clone, Default)]
pub struct Grib2Tables {
    /// (discipline, category, number) -> entry
    parameters: HashMap<ParamKey, ParameterEntry>,
    /// param_id -> code
    ids: HashMap<u32, ParamKey>,
}

impl Grib2Tables {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table of surface fields and thermal indices.
    ///
    /// Radiant temperature, UTCI and the solar angle integral have no WMO
    /// code; they use local-use numbers (192-254) in their category.
    pub fn ecmwf_surface() -> Self {
        let mut tables = Self::new();
        for entry in [
            ParameterEntry::new("2t", 167, 0, 0, 0),
            ParameterEntry::new("2d", 168, 0, 0, 6),
            ParameterEntry::new("10u", 165, 0, 2, 2),
            ParameterEntry::new("10v", 166, 0, 2, 3),
            ParameterEntry::new("ws", 10, 0, 2, 1),
            ParameterEntry::new("ssrd", 169, 0, 4, 7),
            ParameterEntry::new("ssr", 176, 0, 4, 9),
            ParameterEntry::new("fdir", 228021, 0, 4, 13),
            ParameterEntry::new("strd", 175, 0, 5, 3),
            ParameterEntry::new("str", 177, 0, 5, 5),
            ParameterEntry::new("aptmp", 260255, 0, 0, 21),
            ParameterEntry::new("utci", 261001, 0, 0, 200),
            ParameterEntry::new("mrt", 261002, 0, 0, 201),
            ParameterEntry::new("cossza", 214001, 0, 4, 200),
        ] {
            tables.add_parameter(entry);
        }
        tables
    }

    /// Add or replace a parameter mapping.
    ///
    /// An entry replacing an existing code or identifier removes the old one.
    pub fn add_parameter(&mut self, entry: ParameterEntry) {
        if let Some(old_key) = self.ids.remove(&entry.param_id) {
            self.parameters.remove(&old_key);
        }
        if let Some(old) = self.parameters.remove(&entry.key()) {
            self.ids.remove(&old.param_id);
        }
        self.ids.insert(entry.param_id, entry.key());
        self.parameters.insert(entry.key(), entry);
    }

    /// Look up a parameter entry by GRIB2 codes.
    pub fn get_parameter(&self, discipline: u8, category: u8, number: u8) -> Option<&ParameterEntry> {
        self.parameters.get(&(discipline, category, number))
    }

    /// Look up parameter short name by GRIB2 codes.
    ///
    /// Returns "P{discipline}_{category}_{number}" if not found.
    pub fn get_parameter_name(&self, discipline: u8, category: u8, number: u8) -> String {
        self.get_parameter(discipline, category, number)
            .map(|e| e.short_name.clone())
            .unwrap_or_else(|| format!("P{}_{}_{}", discipline, category, number))
    }

    /// Look up a parameter entry by its identifier.
    pub fn by_param_id(&self, param_id: u32) -> Option<&ParameterEntry> {
        self.ids.get(&param_id).and_then(|key| self.parameters.get(key))
    }

    /// Look up a parameter entry by short name.
    pub fn by_short_name(&self, short_name: &str) -> Option<&ParameterEntry> {
        self.parameters.values().find(|e| e.short_name == short_name)
    }

    /// Get the number of parameters in the table
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Check if the tables are empty
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let tables = Grib2Tables::ecmwf_surface();
        assert_eq!(tables.get_parameter_name(0, 0, 0), "2t");
        assert_eq!(tables.get_parameter_name(0, 5, 5), "str");
        assert_eq!(tables.by_param_id(261002).unwrap().short_name, "mrt");
        assert_eq!(tables.by_short_name("fdir").unwrap().param_id, 228021);
    }

    #[test]
    fn test_unknown_parameter_fallback() {
        let tables = Grib2Tables::new();
        assert!(tables.is_empty());
        assert_eq!(tables.get_parameter_name(0, 7, 6), "P0_7_6");
    }

    #[test]
    fn test_override_replaces_code_and_id() {
        let mut tables = Grib2Tables::ecmwf_surface();
        let count = tables.parameter_count();

        tables.add_parameter(ParameterEntry::new("mrt", 261002, 0, 0, 27));

        assert_eq!(tables.parameter_count(), count);
        assert!(tables.get_parameter(0, 0, 201).is_none());
        assert_eq!(tables.by_param_id(261002).unwrap().key(), (0, 0, 27));
    }
}
