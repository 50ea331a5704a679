/// What an incoming change-event asks for, decoded once at the HTTP
/// boundary so the reconciler never sees raw descriptor strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Upsert,
    Delete,
}

impl EventKind {
    /// Webhook sources name events freely ("task.deleted",
    /// "ORG_MEMBER_DELETE", ...); anything mentioning delete is a delete,
    /// everything else is an upsert.
    pub fn from_descriptor(descriptor: Option<&str>) -> Self {
        match descriptor {
            Some(d) if d.to_ascii_lowercase().contains("delete") => EventKind::Delete,
            _ => EventKind::Upsert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_descriptors() {
        assert_eq!(
            EventKind::from_descriptor(Some("task.deleted")),
            EventKind::Delete
        );
        assert_eq!(
            EventKind::from_descriptor(Some("ORG_MEMBER_DELETE")),
            EventKind::Delete
        );
    }

    #[test]
    fn everything_else_is_an_upsert() {
        assert_eq!(
            EventKind::from_descriptor(Some("task.created")),
            EventKind::Upsert
        );
        assert_eq!(
            EventKind::from_descriptor(Some("team.updated")),
            EventKind::Upsert
        );
        assert_eq!(EventKind::from_descriptor(None), EventKind::Upsert);
    }
}
