//! Cookie classification and the session's outbound cookie jar.
//!
//! Strong cookies carry authentication and belong to the backend session:
//! they only ever change through backend replies. Weak cookies hold display
//! preferences and are written by the frontend itself.

use board_core::Cookie;

/// Authentication token issued by the backend.
pub const TOKEN_COOKIE: &str = "token";

/// Cached display name of the signed-in user.
pub const USERNAME_COOKIE: &str = "username";

/// Selected colour theme.
pub const THEME_COOKIE: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieClass {
    Strong,
    Weak,
}

impl CookieClass {
    /// Classify a cookie name as it arrives from the browser.
    pub fn of(name: &str) -> Self {
        match name {
            TOKEN_COOKIE => CookieClass::Strong,
            _ => CookieClass::Weak,
        }
    }

    pub fn is_strong(&self) -> bool {
        *self == CookieClass::Strong
    }
}

/// Cookies a session has to hand to the client, plus the view of the
/// backend credentials they produce.
///
/// `pending` is the ordered flush queue; `current` holds one live value per
/// name and is what gets sent back to the backend.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    current: Vec<Cookie>,
    pending: Vec<Cookie>,
}

impl CookieJar {
    /// A jar seeded with the strong cookies of an inbound request. Seed
    /// cookies are credentials only and are never flushed back.
    pub fn from_request<'a>(cookies: impl IntoIterator<Item = &'a Cookie>) -> Self {
        let mut jar = Self::default();
        for cookie in cookies {
            if CookieClass::of(&cookie.name).is_strong() && !cookie.value.is_empty() {
                jar.update_current(cookie.clone());
            }
        }
        jar
    }

    /// Queue a cookie from a backend reply.
    pub fn queue(&mut self, cookie: Cookie) {
        self.update_current(cookie.clone());
        self.pending.push(cookie);
    }

    pub fn queue_all(&mut self, cookies: impl IntoIterator<Item = Cookie>) {
        for cookie in cookies {
            self.queue(cookie);
        }
    }

    /// Take every queued cookie, in the order it was queued. A second call
    /// only yields cookies queued in between.
    pub fn drain(&mut self) -> Vec<Cookie> {
        std::mem::take(&mut self.pending)
    }

    /// Queued, not yet drained cookies.
    pub fn pending(&self) -> &[Cookie] {
        &self.pending
    }

    /// Live credentials to present to the backend.
    pub fn credentials(&self) -> &[Cookie] {
        &self.current
    }

    /// The live value of `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.current.iter().find(|c| c.name == name)
    }

    /// The most recently queued cookie named `name`, removals included.
    pub fn last_queued(&self, name: &str) -> Option<&Cookie> {
        self.pending.iter().rev().find(|c| c.name == name)
    }

    fn update_current(&mut self, cookie: Cookie) {
        self.current.retain(|c| c.name != cookie.name);
        if !cookie.is_removal() {
            self.current.push(cookie);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(CookieClass::of(TOKEN_COOKIE), CookieClass::Strong);
        assert_eq!(CookieClass::of(USERNAME_COOKIE), CookieClass::Weak);
        assert_eq!(CookieClass::of(THEME_COOKIE), CookieClass::Weak);
    }

    #[test]
    fn test_seed_keeps_strong_cookies_only() {
        let inbound = vec![
            Cookie::new(TOKEN_COOKIE, "abc"),
            Cookie::new(USERNAME_COOKIE, "alice"),
            Cookie::new(THEME_COOKIE, "dark"),
        ];

        let jar = CookieJar::from_request(&inbound);
        assert_eq!(jar.credentials().len(), 1);
        assert_eq!(jar.get(TOKEN_COOKIE).unwrap().value, "abc");
        assert!(jar.pending().is_empty());
    }

    #[test]
    fn test_queue_and_drain_once() {
        let mut jar = CookieJar::from_request(&[Cookie::new(TOKEN_COOKIE, "old")]);
        jar.queue(Cookie::new(TOKEN_COOKIE, "new").with_path("/"));
        jar.queue(Cookie::new("csrf", "x"));

        assert_eq!(jar.get(TOKEN_COOKIE).unwrap().value, "new");

        let drained = jar.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].name, TOKEN_COOKIE);
        assert_eq!(drained[1].name, "csrf");

        assert!(jar.drain().is_empty());
        assert_eq!(jar.credentials().len(), 2);
    }

    #[test]
    fn test_removal_clears_credentials() {
        let mut jar = CookieJar::from_request(&[Cookie::new(TOKEN_COOKIE, "abc")]);
        jar.queue(Cookie::removal(TOKEN_COOKIE));

        assert!(jar.get(TOKEN_COOKIE).is_none());
        assert!(jar.last_queued(TOKEN_COOKIE).unwrap().is_removal());
    }
}
