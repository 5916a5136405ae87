use gateway::FieldInfo;

pub const NO_FIELDS_MESSAGE: &str = "No fields available for labeling";
pub const NO_MATCHES_MESSAGE: &str = "No matching fields";

/// What the field picker should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOptions {
    Matches(Vec<String>),
    /// Explicit empty state with the message to display.
    Empty(&'static str),
}

/// Attribute names offered for labeling the current table.
///
/// The chosen field itself lives in the session; selecting goes through
/// `LayerLifecycleManager::select_field` so the label layer follows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelectionController {
    names: Vec<String>,
}

impl FieldSelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the non-blank names, in server order.
    pub fn set_available_fields(&mut self, fields: &[FieldInfo]) -> FieldOptions {
        self.names = fields
            .iter()
            .map(|f| f.name.as_str())
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .collect();
        self.options()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn options(&self) -> FieldOptions {
        self.filter("")
    }

    /// Case-insensitive substring search over the available names.
    pub fn filter(&self, search: &str) -> FieldOptions {
        if self.names.is_empty() {
            return FieldOptions::Empty(NO_FIELDS_MESSAGE);
        }
        let needle = search.to_lowercase();
        let matches: Vec<String> = self
            .names
            .iter()
            .filter(|n| n.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        if matches.is_empty() {
            FieldOptions::Empty(NO_MATCHES_MESSAGE)
        } else {
            FieldOptions::Matches(matches)
        }
    }

    pub fn reset(&mut self) {
        self.names.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldOptions, FieldSelectionController, NO_FIELDS_MESSAGE, NO_MATCHES_MESSAGE};
    use gateway::FieldInfo;
    use pretty_assertions::assert_eq;

    fn fields(names: &[&str]) -> Vec<FieldInfo> {
        names.iter().map(|n| FieldInfo::new(*n)).collect()
    }

    #[test]
    fn blank_names_are_dropped() {
        let mut c = FieldSelectionController::new();
        let opts = c.set_available_fields(&fields(&["population", "", "  ", "name"]));
        assert_eq!(
            opts,
            FieldOptions::Matches(vec!["population".into(), "name".into()])
        );
        assert!(c.contains("name"));
        assert!(!c.contains(""));
    }

    #[test]
    fn empty_list_shows_explicit_state() {
        let mut c = FieldSelectionController::new();
        assert_eq!(
            c.set_available_fields(&[]),
            FieldOptions::Empty(NO_FIELDS_MESSAGE)
        );
        assert_eq!(c.filter("x"), FieldOptions::Empty(NO_FIELDS_MESSAGE));
    }

    #[test]
    fn filter_is_case_insensitive() {
        let mut c = FieldSelectionController::new();
        c.set_available_fields(&fields(&["Population", "name", "pop_density"]));
        assert_eq!(
            c.filter("POP"),
            FieldOptions::Matches(vec!["Population".into(), "pop_density".into()])
        );
        assert_eq!(c.filter("zzz"), FieldOptions::Empty(NO_MATCHES_MESSAGE));
    }

    #[test]
    fn reset_forgets_names() {
        let mut c = FieldSelectionController::new();
        c.set_available_fields(&fields(&["a"]));
        c.reset();
        assert!(c.names().is_empty());
    }
}
