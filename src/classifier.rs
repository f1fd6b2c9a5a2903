//! Partitions roster columns into assignment, lab and test groups.

use serde::Serialize;

use crate::roster::Category;

/// Ordered mark columns per category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ColumnLayout {
    pub assignments: Vec<String>,
    pub labs: Vec<String>,
    pub tests: Vec<String>,
}

impl ColumnLayout {
    pub fn columns(&self, category: Category) -> &[String] {
        match category {
            Category::Assignment => &self.assignments,
            Category::Lab => &self.labs,
            Category::Test => &self.tests,
        }
    }

    fn columns_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Assignment => &mut self.assignments,
            Category::Lab => &mut self.labs,
            Category::Test => &mut self.tests,
        }
    }

    /// Grows `category` to `count` columns by appending `<Prefix><k>`.
    ///
    /// `k` starts after the current length and skips names already present,
    /// so gapped numbering never produces duplicates. Never shrinks.
    pub fn extend_to(&mut self, category: Category, count: usize) {
        let list = self.columns_mut(category);
        let mut k = list.len() + 1;
        while list.len() < count {
            let candidate = category.column(k);
            if !list.contains(&candidate) {
                list.push(candidate);
            }
            k += 1;
        }
    }

    /// Every mark column paired with its category, assignments first.
    pub fn mark_columns(&self) -> impl Iterator<Item = (Category, &str)> {
        Category::ALL.into_iter().flat_map(move |category| {
            self.columns(category)
                .iter()
                .map(move |c| (category, c.as_str()))
        })
    }
}

/// Classifies `columns` by prefix, preserving relative order.
///
/// A category with no matching column is seeded with `<Prefix>1`. The roster
/// itself is not touched.
pub fn classify<S: AsRef<str>>(columns: &[S]) -> ColumnLayout {
    let mut layout = ColumnLayout::default();
    for column in columns {
        let column = column.as_ref();
        if let Some(category) = Category::of_column(column) {
            layout.columns_mut(category).push(column.to_string());
        }
    }
    for category in Category::ALL {
        let list = layout.columns_mut(category);
        if list.is_empty() {
            list.push(category.column(1));
        }
    }
    layout
}
