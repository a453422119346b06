use std::collections::HashSet;

use crate::events::ChannelRef;

/// Channels whose messages are eligible for parsing.
///
/// Entries that parse as integers match chat ids; everything else matches
/// usernames, ignoring a leading `@` and ASCII case.
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    names: HashSet<String>,
    ids: HashSet<i64>,
}

impl AllowList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            match entry.parse::<i64>() {
                Ok(id) => {
                    list.ids.insert(id);
                }
                Err(_) => {
                    list.names.insert(normalize_name(entry));
                }
            }
        }
        list
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len() + self.ids.len()
    }

    pub fn permits(&self, channel: &ChannelRef) -> bool {
        let by_name = channel
            .name
            .as_deref()
            .is_some_and(|name| self.names.contains(&normalize_name(name)));
        let by_id = channel.id.is_some_and(|id| self.ids.contains(&id));
        by_name || by_id
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().trim_start_matches('@').to_ascii_lowercase()
}
