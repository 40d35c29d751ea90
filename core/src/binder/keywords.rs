//! Keyword occurrences claimed by the first binding pass.

/// One resolved keyword token and the values it claimed.
#[derive(Debug, Clone)]
pub(crate) struct Occurrence {
    /// Field path the flag resolved to.
    pub path: Vec<String>,
    pub values: Vec<String>,
    /// Matched through `--no-<name>`.
    pub negated: bool,
    /// Matched through `--empty-<name>`; carries no values.
    pub empty: bool,
    /// Raw index and text of the flag and every claimed value.
    pub tokens: Vec<(usize, String)>,
}

/// Occurrences not yet taken by a field, in input order.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeywordIndex {
    occurrences: Vec<Occurrence>,
}

impl KeywordIndex {
    pub fn push(&mut self, occurrence: Occurrence) {
        self.occurrences.push(occurrence);
    }

    /// Removes and returns every occurrence addressing exactly `path`.
    pub fn take_exact(&mut self, path: &[String]) -> Vec<Occurrence> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.occurrences)
            .into_iter()
            .partition(|o| o.path == path);
        self.occurrences = kept;
        taken
    }

    pub fn has_exact(&self, path: &[String]) -> bool {
        self.occurrences.iter().any(|o| o.path == path)
    }

    /// `true` when some occurrence addresses a strict descendant of `path`.
    pub fn has_under(&self, path: &[String]) -> bool {
        self.occurrences
            .iter()
            .any(|o| o.path.len() > path.len() && o.path.starts_with(path))
    }

    /// Distinct path segments directly below `path`, in first-seen order.
    pub fn child_keys(&self, path: &[String]) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for o in &self.occurrences {
            if o.path.len() > path.len() && o.path.starts_with(path) {
                let key = &o.path[path.len()];
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Drops every occurrence at or below `path`.
    pub fn discard_under(&mut self, path: &[String]) {
        self.occurrences.retain(|o| !o.path.starts_with(path));
    }

    /// Raw tokens of every untaken occurrence.
    pub fn leftover_tokens(&self) -> impl Iterator<Item = &(usize, String)> {
        self.occurrences.iter().flat_map(|o| o.tokens.iter())
    }
}
