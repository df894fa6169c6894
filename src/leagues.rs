//! League equivalence classes.
//!
//! A league occasionally changes sponsor name mid-season ("Select Ligaen"
//! became "Unihoc Floorball Liga"), and the match programme and team list
//! do not always agree on which spelling they use. Resolution therefore
//! searches under every spelling in the league's equivalence class. The
//! relation is symmetric: looking up either name also searches its
//! siblings.

/// Symmetric groups of league names that refer to the same competition.
#[derive(Debug, Clone)]
pub struct LeagueEquivalences {
    groups: Vec<Vec<String>>,
}

impl Default for LeagueEquivalences {
    fn default() -> Self {
        Self {
            groups: vec![vec![
                "Unihoc Floorball Liga".to_string(),
                "Select Ligaen".to_string(),
            ]],
        }
    }
}

impl LeagueEquivalences {
    /// An empty table: every league is only equivalent to itself.
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    pub fn new(groups: Vec<Vec<String>>) -> Self {
        Self { groups }
    }

    /// Register two league names as equivalent, merging into an existing
    /// group when either name is already known.
    pub fn with_pair(mut self, a: &str, b: &str) -> Self {
        let a = a.trim().to_string();
        let b = b.trim().to_string();
        if a.is_empty() || b.is_empty() || a == b {
            return self;
        }

        if let Some(group) = self
            .groups
            .iter_mut()
            .find(|g| g.contains(&a) || g.contains(&b))
        {
            if !group.contains(&a) {
                group.push(a);
            }
            if !group.contains(&b) {
                group.push(b);
            }
        } else {
            self.groups.push(vec![a, b]);
        }
        self
    }

    /// All spellings equivalent to `league`, with the queried spelling
    /// first. A league without a registered group is equivalent only to
    /// itself. Matching is exact on the trimmed name; league names come
    /// from controlled federation exports.
    pub fn equivalents(&self, league: &str) -> Vec<String> {
        let l = league.trim();
        match self.groups.iter().find(|g| g.iter().any(|m| m == l)) {
            Some(group) => {
                let mut out = vec![l.to_string()];
                out.extend(group.iter().filter(|m| *m != l).cloned());
                out
            }
            None => vec![l.to_string()],
        }
    }
}
