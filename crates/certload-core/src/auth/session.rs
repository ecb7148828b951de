//! Gateway session cookies

/// Session established by a successful login.
///
/// Built from the `set-cookie` headers of the login response and replayed as
/// a single `cookie` header on follow-up business calls of the same iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    cookies: Vec<(String, String)>,
}

impl Session {
    /// Collect `name=value` pairs from `set-cookie` header values.
    ///
    /// Returns `None` when no cookie could be parsed.
    pub fn from_set_cookie<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut cookies: Vec<(String, String)> = Vec::new();
        for value in values {
            let pair = value.split(';').next().unwrap_or_default().trim();
            let Some((name, val)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            // Later cookies replace earlier ones with the same name
            cookies.retain(|(n, _)| n != name);
            cookies.push((name.to_string(), val.trim().to_string()));
        }

        if cookies.is_empty() {
            None
        } else {
            Some(Self { cookies })
        }
    }

    /// Value for a `cookie` request header.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Look up a cookie value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
