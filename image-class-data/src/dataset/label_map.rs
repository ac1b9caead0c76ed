use crate::common::*;

/// Ordered category names. The position of a name is its label.
///
/// Names are appended on first sight and never reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    classes: IndexSet<String>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the label of the category, appending it if it was not seen before.
    pub fn get_or_insert(&mut self, name: &str) -> usize {
        match self.classes.get_index_of(name) {
            Some(index) => index,
            None => self.classes.insert_full(name.to_owned()).0,
        }
    }

    pub fn label_of(&self, name: &str) -> Option<usize> {
        self.classes.get_index_of(name)
    }

    pub fn name_of(&self, label: usize) -> Option<&str> {
        self.classes.get_index(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn classes(&self) -> &IndexSet<String> {
        &self.classes
    }
}
