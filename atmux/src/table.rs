//! Ordered prefix-to-handler table
//!
//! Matching is first-hit, so entries at the front take precedence. URC
//! registration prepends, ordinary registration appends, and the temporary
//! send-receive entry is always appended, which keeps URC delivery ahead of
//! an in-flight synchronous request.

use heapless::{String, Vec};

use crate::Error;
use crate::config::MAX_PREFIX_LEN;

/// Callback invoked by the dispatcher with the text after the matched
/// prefix, leading SP / HT skipped, terminator included.
pub type Handler = fn(args: &str);

/// What to do when an entry matches.
#[derive(Clone, Copy)]
pub(crate) enum Action {
    /// Run a registered callback
    User(Handler),
    /// Wake the send-receive coordinator
    SrMatch,
}

struct Entry {
    prefix: String<MAX_PREFIX_LEN>,
    action: Action,
}

impl Entry {
    fn new(prefix: &str, action: Action) -> Result<Self, Error> {
        if prefix.is_empty() {
            return Err(Error::InvalidArg);
        }
        let mut copy = String::new();
        copy.push_str(prefix).map_err(|_| Error::InvalidArg)?;
        Ok(Self {
            prefix: copy,
            action,
        })
    }
}

pub(crate) struct HandlerTable<const N: usize> {
    entries: Vec<Entry, N>,
}

impl<const N: usize> HandlerTable<N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers `handler` for lines starting with `prefix`, appending to
    /// the table. A duplicate prefix updates the stored callback in place.
    pub fn register(&mut self, prefix: &str, handler: Handler) -> Result<(), Error> {
        if prefix.is_empty() || prefix.len() > MAX_PREFIX_LEN {
            return Err(Error::InvalidArg);
        }
        if let Some(entry) = self.find_mut(prefix) {
            entry.action = Action::User(handler);
            return Ok(());
        }
        let entry = Entry::new(prefix, Action::User(handler))?;
        self.entries.push(entry).map_err(|_| Error::Resource)
    }

    /// Registers an unsolicited-result-code handler at the front of the
    /// table. A duplicate prefix is removed first and reinserted at index 0.
    pub fn register_urc(&mut self, prefix: &str, handler: Handler) -> Result<(), Error> {
        if prefix.is_empty() || prefix.len() > MAX_PREFIX_LEN {
            return Err(Error::InvalidArg);
        }
        if let Some(at) = self.position(prefix) {
            self.entries.remove(at);
        }
        let entry = Entry::new(prefix, Action::User(handler))?;
        self.entries.insert(0, entry).map_err(|_| Error::Resource)
    }

    /// Appends the temporary send-receive entry. No duplicate handling: a
    /// user entry with the same prefix simply keeps shadowing it.
    pub fn register_sr(&mut self, prefix: &str) -> Result<(), Error> {
        let entry = Entry::new(prefix, Action::SrMatch)?;
        self.entries.push(entry).map_err(|_| Error::Resource)
    }

    /// Removes the first entry with a byte-exact `prefix`.
    pub fn unregister(&mut self, prefix: &str) -> Result<(), Error> {
        if prefix.is_empty() {
            return Err(Error::InvalidArg);
        }
        let at = self.position(prefix).ok_or(Error::NotFound)?;
        self.entries.remove(at);
        Ok(())
    }

    /// First entry whose prefix starts `line`, front to back. Returns the
    /// captured action and the prefix length.
    pub fn lookup(&self, line: &[u8]) -> Option<(Action, usize)> {
        self.entries.iter().find_map(|entry| {
            let prefix = entry.prefix.as_bytes();
            line.starts_with(prefix).then_some((entry.action, prefix.len()))
        })
    }

    fn position(&self, prefix: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.prefix.as_str() == prefix)
    }

    fn find_mut(&mut self, prefix: &str) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.prefix.as_str() == prefix)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    fn handler_a(_: &str) {}
    fn handler_b(_: &str) {}

    fn prefixes<const N: usize>(table: &HandlerTable<N>) -> std::vec::Vec<&str> {
        table.entries.iter().map(|e| e.prefix.as_str()).collect()
    }

    #[test]
    fn register_appends_in_order() {
        let mut table: HandlerTable<4> = HandlerTable::new();
        table.register("+CREG", handler_a).unwrap();
        table.register("+CSQ", handler_a).unwrap();
        assert_eq!(prefixes(&table), ["+CREG", "+CSQ"]);
    }

    #[test]
    fn register_rejects_bad_prefixes() {
        let mut table: HandlerTable<4> = HandlerTable::new();
        assert_eq!(table.register("", handler_a), Err(Error::InvalidArg));
        let long = core::str::from_utf8(&[b'x'; MAX_PREFIX_LEN + 1]).unwrap();
        assert_eq!(table.register(long, handler_a), Err(Error::InvalidArg));
    }

    #[test]
    fn duplicate_register_updates_in_place() {
        let mut table: HandlerTable<4> = HandlerTable::new();
        table.register("+CREG", handler_a).unwrap();
        table.register("OK", handler_a).unwrap();
        table.register("+CREG", handler_b).unwrap();
        assert_eq!(prefixes(&table), ["+CREG", "OK"]);
        let (action, len) = table.lookup(b"+CREG: 1").unwrap();
        assert_eq!(len, 5);
        assert!(matches!(action, Action::User(_)));
    }

    #[test]
    fn urc_registration_prepends() {
        let mut table: HandlerTable<4> = HandlerTable::new();
        table.register("OK", handler_a).unwrap();
        table.register_urc("+RING", handler_a).unwrap();
        assert_eq!(prefixes(&table), ["+RING", "OK"]);
    }

    #[test]
    fn urc_duplicate_moves_to_front() {
        let mut table: HandlerTable<4> = HandlerTable::new();
        table.register("+RING", handler_a).unwrap();
        table.register("OK", handler_a).unwrap();
        table.register_urc("+RING", handler_b).unwrap();
        assert_eq!(prefixes(&table), ["+RING", "OK"]);
        assert_eq!(table.entries.len(), 2);
    }

    #[test]
    fn unregister_shifts_the_tail() {
        let mut table: HandlerTable<4> = HandlerTable::new();
        table.register("A", handler_a).unwrap();
        table.register("B", handler_a).unwrap();
        table.register("C", handler_a).unwrap();
        table.unregister("B").unwrap();
        assert_eq!(prefixes(&table), ["A", "C"]);
        assert_eq!(table.unregister("B"), Err(Error::NotFound));
        assert_eq!(table.unregister(""), Err(Error::InvalidArg));
    }

    #[test]
    fn full_table_reports_resource() {
        let mut table: HandlerTable<2> = HandlerTable::new();
        table.register("A", handler_a).unwrap();
        table.register("B", handler_a).unwrap();
        assert_eq!(table.register("C", handler_a), Err(Error::Resource));
        assert_eq!(table.register_urc("D", handler_a), Err(Error::Resource));
        assert_eq!(table.register_sr("E"), Err(Error::Resource));
    }

    #[test]
    fn lookup_is_first_hit() {
        let mut table: HandlerTable<4> = HandlerTable::new();
        table.register("+C", handler_a).unwrap();
        table.register("+CREG", handler_b).unwrap();
        // the shorter, earlier prefix wins
        let (_, len) = table.lookup(b"+CREG: 1").unwrap();
        assert_eq!(len, 2);
        assert!(table.lookup(b"UNKNOWN").is_none());
    }
}
