//! Per-trip activity stream shown in the detail view.
use super::trip::TimeStamp;
use chrono::Utc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    #[n(0)]
    Email,
    #[n(1)]
    System,
    #[n(2)]
    Note,
    #[n(3)]
    Task,
    #[n(4)]
    Document,
}

/// Detail view tabs. System and document items only show under `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityTab {
    #[default]
    All,
    Email,
    Task,
    Note,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct ActivityItem {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub kind: ActivityKind,
    #[n(2)]
    pub date: TimeStamp<Utc>,
    #[n(3)]
    pub author: String,
    #[n(4)]
    pub title: String,
    #[n(5)]
    pub content: Option<String>,
    #[n(6)]
    pub attachments: Vec<String>,
    #[n(7)]
    pub is_completed: Option<bool>, // tasks only
}

/// Chronological, append-only. Oldest first.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityStream {
    #[n(0)]
    items: Vec<ActivityItem>,
}

impl ActivityItem {
    pub fn new(id: &str, kind: ActivityKind, date: TimeStamp<Utc>, author: &str, title: &str) -> Self {
        Self {
            id: id.into(),
            kind,
            date,
            author: author.into(),
            title: title.into(),
            content: None,
            attachments: vec![],
            is_completed: (kind == ActivityKind::Task).then_some(false),
        }
    }
    pub fn with_content(mut self, content: &str) -> Self {
        self.content = Some(content.into());
        self
    }
    pub fn with_attachments(mut self, attachments: &[String]) -> Self {
        self.attachments = attachments.to_vec();
        self
    }
}

impl ActivityTab {
    pub fn admits(self, kind: ActivityKind) -> bool {
        match self {
            ActivityTab::All => true,
            ActivityTab::Email => kind == ActivityKind::Email,
            ActivityTab::Task => kind == ActivityKind::Task,
            ActivityTab::Note => kind == ActivityKind::Note,
        }
    }
}

impl ActivityStream {
    pub fn new() -> Self {
        Self::default()
    }
    /// Inserts keeping date order. Items with equal dates keep arrival order.
    pub fn push(&mut self, item: ActivityItem) {
        let at = self.items.partition_point(|existing| existing.date <= item.date);
        self.items.insert(at, item);
    }
    pub fn items(&self) -> &[ActivityItem] {
        &self.items
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    /// Items for `tab`, newest first.
    pub fn view(&self, tab: ActivityTab) -> Vec<&ActivityItem> {
        self.items
            .iter()
            .rev()
            .filter(|item| tab.admits(item.kind))
            .collect()
    }
}
