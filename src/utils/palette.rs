use crate::models::VisitRecord;
use std::collections::BTreeSet;

pub const BUILDING_COLORS: [&str; 10] = [
    "#3B82F6", // blue
    "#10B981", // emerald
    "#8B5CF6", // purple
    "#F43F5E", // rose
    "#F59E0B", // amber
    "#EC4899", // pink
    "#06B6D4", // cyan
    "#84CC16", // lime
    "#6366F1", // indigo
    "#14B8A6", // teal
];

pub const DEFAULT_COLOR: &str = BUILDING_COLORS[0];

/// Stable colour assignment keyed on the sorted set of building names
#[derive(Debug, Clone, Default)]
pub struct BuildingPalette {
    names: Vec<String>,
}

impl BuildingPalette {
    pub fn new(records: &[VisitRecord]) -> Self {
        let names: BTreeSet<&str> = records.iter().map(|r| r.name.as_str()).collect();
        Self {
            names: names.into_iter().map(str::to_string).collect(),
        }
    }

    /// Position among the sorted names, 0 when unknown
    pub fn index_of(&self, name: &str) -> usize {
        self.names
            .binary_search_by(|n| n.as_str().cmp(name))
            .unwrap_or(0)
    }

    pub fn color_for_name(&self, name: &str) -> &'static str {
        BUILDING_COLORS[self.index_of(name) % BUILDING_COLORS.len()]
    }

    /// Colour of the building with `id`, falling back to the default blue
    pub fn color_for_building(&self, records: &[VisitRecord], id: Option<&str>) -> &'static str {
        id.and_then(|id| records.iter().find(|r| r.id == id))
            .map(|r| self.color_for_name(&r.name))
            .unwrap_or(DEFAULT_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str]) -> Vec<VisitRecord> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| VisitRecord::new(format!("id{}", i), *name))
            .collect()
    }

    #[test]
    fn test_colors_follow_sorted_names() {
        let data = records(&["Charlie", "Alpha", "Bravo", "Alpha"]);
        let palette = BuildingPalette::new(&data);

        assert_eq!(palette.index_of("Alpha"), 0);
        assert_eq!(palette.index_of("Charlie"), 2);
        assert_eq!(palette.color_for_name("Bravo"), "#10B981");
        assert_eq!(palette.index_of("Unknown"), 0);
    }

    #[test]
    fn test_palette_wraps_and_defaults() {
        let names: Vec<String> = (0..12).map(|i| format!("B{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let data = records(&refs);
        let palette = BuildingPalette::new(&data);

        assert_eq!(palette.color_for_name("B10"), BUILDING_COLORS[0]);
        assert_eq!(palette.color_for_building(&data, Some("id11")), BUILDING_COLORS[1]);
        assert_eq!(palette.color_for_building(&data, None), DEFAULT_COLOR);
        assert_eq!(palette.color_for_building(&data, Some("nope")), DEFAULT_COLOR);
    }
}
