use serde::{Deserialize, Serialize};

/// A known player and how many tournaments they have been entered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub name: String,
    pub participation: u32,
}

/// Player list the tournament desk draws fields from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&RosterEntry> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Add a player with no participation. Returns false if already listed.
    pub fn add_player(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.players.push(RosterEntry {
            name: name.to_string(),
            participation: 0,
        });
        true
    }

    /// Names ordered by participation (most first), then alphabetically.
    pub fn ranked(&self) -> Vec<String> {
        let mut entries: Vec<&RosterEntry> = self.players.iter().collect();
        entries.sort_by(|a, b| {
            b.participation
                .cmp(&a.participation)
                .then_with(|| a.name.cmp(&b.name))
        });
        entries.into_iter().map(|e| e.name.clone()).collect()
    }

    /// Bump the counter of every listed player named in `names`. Unknown names
    /// are skipped. Returns how many entries were bumped.
    pub fn record_participation(&mut self, names: &[String]) -> usize {
        let mut bumped = 0;
        for entry in self.players.iter_mut() {
            if names.iter().any(|name| *name == entry.name) {
                entry.participation += 1;
                bumped += 1;
            }
        }
        bumped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_player_ignores_duplicates() {
        let mut roster = Roster::new();
        assert!(roster.add_player("Ann"));
        assert!(!roster.add_player("Ann"));
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get("Ann").unwrap().participation, 0);
    }

    #[test]
    fn test_ranked_by_participation_then_name() {
        let mut roster = Roster::new();
        for name in ["Dee", "Ann", "Cid", "Bob"] {
            roster.add_player(name);
        }
        roster.record_participation(&["Dee".to_string(), "Cid".to_string()]);
        roster.record_participation(&["Cid".to_string()]);
        assert_eq!(roster.ranked(), vec!["Cid", "Dee", "Ann", "Bob"]);
    }

    #[test]
    fn test_record_participation_skips_unknown() {
        let mut roster = Roster::new();
        roster.add_player("Ann");
        let bumped = roster.record_participation(&["Ann".to_string(), "Ghost".to_string()]);
        assert_eq!(bumped, 1);
        assert!(!roster.contains("Ghost"));
        assert_eq!(roster.get("Ann").unwrap().participation, 1);
    }
}
