//! Expense input validation
//!
//! Title, note and tags must be non-empty. Amount is taken as given.

use super::ValidationError;

/// Validated expense fields, ready to be written to storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    title: String,
    amount: f64,
    note: String,
    tags: Vec<String>,
}

impl ExpenseDraft {
    /// Build a draft, rejecting empty text fields and an empty tag list.
    ///
    /// Only length is checked; a title of `" "` is accepted.
    ///
    /// # Example
    /// ```
    /// use expenses_server::models::ExpenseDraft;
    ///
    /// assert!(ExpenseDraft::new("coffee", 55.0, "morning", vec!["drink".into()]).is_ok());
    /// assert!(ExpenseDraft::new("", 55.0, "morning", vec!["drink".into()]).is_err());
    /// assert!(ExpenseDraft::new("coffee", 55.0, "morning", vec![]).is_err());
    /// ```
    pub fn new(
        title: impl Into<String>,
        amount: f64,
        note: impl Into<String>,
        tags: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let note = note.into();

        if title.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }
        if note.is_empty() {
            return Err(ValidationError::Empty { field: "note" });
        }
        if tags.is_empty() {
            return Err(ValidationError::Empty { field: "tags" });
        }

        Ok(Self {
            title,
            amount,
            note,
            tags,
        })
    }

    #[cfg(test)]
    fn title(&self) -> &str {
        &self.title
    }

    #[cfg(test)]
    fn amount(&self) -> f64 {
        self.amount
    }

    #[cfg(test)]
    fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Consume and return `(title, amount, note, tags)`.
    pub fn into_parts(self) -> (String, f64, String, Vec<String>) {
        (self.title, self.amount, self.note, self.tags)
    }
}
