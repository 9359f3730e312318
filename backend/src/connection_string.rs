use std::collections::HashMap;

/// `Key=Value;Key=Value` connection string as used by the monitoring and
/// storage settings. Keys are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ConnectionString {
    entries: HashMap<String, String>,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(';')
            .filter_map(|part| {
                let (key, value) = part.split_once('=')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_ascii_lowercase(), value.trim().to_string()))
            })
            .collect();
        Self { entries }
    }

    /// Value for `key`, ignoring entries that are present but empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
