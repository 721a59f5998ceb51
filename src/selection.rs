//! Field selections - which attributes a read wants, including nested joins.

use serde::{Deserialize, Serialize};

use crate::value::Keyword;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionItem {
    Field(Keyword),
    /// A reference attribute followed into the referenced entity.
    Join(Keyword, Selection),
}

impl SelectionItem {
    pub fn key(&self) -> &Keyword {
        match self {
            SelectionItem::Field(key) | SelectionItem::Join(key, _) => key,
        }
    }
}

/// An ordered list of requested fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection(Vec<SelectionItem>);

impl Selection {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn fields<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Keyword>,
    {
        Self(
            keys.into_iter()
                .map(|k| SelectionItem::Field(k.into()))
                .collect(),
        )
    }

    pub fn field(mut self, key: impl Into<Keyword>) -> Self {
        self.0.push(SelectionItem::Field(key.into()));
        self
    }

    pub fn join(mut self, key: impl Into<Keyword>, nested: Selection) -> Self {
        self.0.push(SelectionItem::Join(key.into(), nested));
        self
    }

    pub fn items(&self) -> &[SelectionItem] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &Keyword) -> bool {
        self.0.iter().any(|item| item.key() == key)
    }

    /// True if `predicate` holds for any key at any depth.
    pub fn any_key(&self, predicate: &dyn Fn(&Keyword) -> bool) -> bool {
        self.0.iter().any(|item| match item {
            SelectionItem::Field(key) => predicate(key),
            SelectionItem::Join(key, nested) => predicate(key) || nested.any_key(predicate),
        })
    }

    pub(crate) fn push(&mut self, item: SelectionItem) {
        self.0.push(item);
    }
}

impl FromIterator<SelectionItem> for Selection {
    fn from_iter<T: IntoIterator<Item = SelectionItem>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
